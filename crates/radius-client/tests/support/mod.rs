//! In-process RADIUS server for end-to-end tests
//!
//! Answers Access-Requests with Accept or Reject, with switchable behavior:
//! response delay, staying silent, or flipping a bit in the Response
//! Authenticator. Counts requests, accepts and rejects.

use radius_proto::dictionary::StandardDictionary;
use radius_proto::random::SecureRandomProvider;
use radius_proto::{Attribute, AttributeType, Code, Packet, PacketCodec};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

pub struct ServerState {
    secret: Vec<u8>,
    codec: PacketCodec,
    should_accept: AtomicBool,
    response_delay_ms: AtomicU64,
    silent: AtomicBool,
    tamper_authenticator: AtomicBool,
    request_count: AtomicUsize,
    accept_count: AtomicUsize,
    reject_count: AtomicUsize,
}

impl ServerState {
    fn new(secret: &[u8]) -> Arc<Self> {
        Arc::new(ServerState {
            secret: secret.to_vec(),
            codec: PacketCodec::new(Arc::new(StandardDictionary), Arc::new(SecureRandomProvider)),
            should_accept: AtomicBool::new(true),
            response_delay_ms: AtomicU64::new(0),
            silent: AtomicBool::new(false),
            tamper_authenticator: AtomicBool::new(false),
            request_count: AtomicUsize::new(0),
            accept_count: AtomicUsize::new(0),
            reject_count: AtomicUsize::new(0),
        })
    }

    /// Decode one request and produce the encoded response, if any
    async fn handle(&self, data: &[u8]) -> Option<Vec<u8>> {
        let request = match self.codec.decode_request(data, &self.secret) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("test server failed to decode request: {}", e);
                return None;
            }
        };

        self.request_count.fetch_add(1, Ordering::SeqCst);

        let delay = self.response_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.silent.load(Ordering::SeqCst) {
            return None;
        }

        // Status-Server probes and accounting are acknowledged without
        // touching the accept/reject counters
        let response = if request.code == Code::StatusServer {
            Packet::new(Code::AccessAccept, 0, [0u8; 16])
        } else if request.code == Code::AccountingRequest {
            Packet::new(Code::AccountingResponse, 0, [0u8; 16])
        } else if self.should_accept.load(Ordering::SeqCst) {
            self.accept_count.fetch_add(1, Ordering::SeqCst);
            Packet::new(Code::AccessAccept, 0, [0u8; 16])
        } else {
            self.reject_count.fetch_add(1, Ordering::SeqCst);
            let mut reject = Packet::new(Code::AccessReject, 0, [0u8; 16]);
            reject.add_attribute(
                Attribute::string(AttributeType::ReplyMessage as u8, "Authentication failed")
                    .unwrap(),
            );
            reject
        };

        let received = request.received_fields().expect("decoded request");
        let mut bytes = self
            .codec
            .encode_response(
                &response,
                &self.secret,
                received.identifier,
                &received.authenticator,
            )
            .expect("encode response");

        if self.tamper_authenticator.load(Ordering::SeqCst) {
            bytes[4] ^= 0x01;
        }

        Some(bytes)
    }
}

pub struct TestRadiusServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

fn trace_init() {
    let _ = tracing_subscriber::fmt::try_init();
}

impl TestRadiusServer {
    /// Start a UDP server on an OS-assigned port
    pub async fn udp(secret: &[u8]) -> Self {
        trace_init();
        let state = ServerState::new(secret);
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("bind udp"));
        let addr = socket.local_addr().expect("local addr");

        let loop_state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, source)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let data = buf[..len].to_vec();
                let state = Arc::clone(&loop_state);
                let socket = Arc::clone(&socket);
                tokio::spawn(async move {
                    if let Some(response) = state.handle(&data).await {
                        let _ = socket.send_to(&response, source).await;
                    }
                });
            }
        });

        TestRadiusServer { addr, state }
    }

    /// Start a TCP server on an OS-assigned port, speaking 4-byte
    /// length-prefixed frames
    pub async fn tcp(secret: &[u8]) -> Self {
        trace_init();
        let state = ServerState::new(secret);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind tcp");
        let addr = listener.local_addr().expect("local addr");

        let loop_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let state = Arc::clone(&loop_state);
                tokio::spawn(async move {
                    let (mut read, write) = stream.into_split();
                    let write = Arc::new(tokio::sync::Mutex::new(write));
                    loop {
                        let mut len_buf = [0u8; 4];
                        if read.read_exact(&mut len_buf).await.is_err() {
                            return;
                        }
                        let len = u32::from_be_bytes(len_buf) as usize;
                        if len == 0 || len > 4096 {
                            return;
                        }
                        let mut frame = vec![0u8; len];
                        if read.read_exact(&mut frame).await.is_err() {
                            return;
                        }

                        let state = Arc::clone(&state);
                        let write = Arc::clone(&write);
                        tokio::spawn(async move {
                            if let Some(response) = state.handle(&frame).await {
                                let mut writer = write.lock().await;
                                let _ = writer
                                    .write_all(&(response.len() as u32).to_be_bytes())
                                    .await;
                                let _ = writer.write_all(&response).await;
                                let _ = writer.flush().await;
                            }
                        });
                    }
                });
            }
        });

        TestRadiusServer { addr, state }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn set_accept(&self, accept: bool) {
        self.state.should_accept.store(accept, Ordering::SeqCst);
    }

    pub fn set_response_delay(&self, delay: Duration) {
        self.state
            .response_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_silent(&self, silent: bool) {
        self.state.silent.store(silent, Ordering::SeqCst);
    }

    pub fn set_tamper_authenticator(&self, tamper: bool) {
        self.state
            .tamper_authenticator
            .store(tamper, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.state.request_count.load(Ordering::SeqCst)
    }

    pub fn accept_count(&self) -> usize {
        self.state.accept_count.load(Ordering::SeqCst)
    }

    pub fn reject_count(&self) -> usize {
        self.state.reject_count.load(Ordering::SeqCst)
    }
}
