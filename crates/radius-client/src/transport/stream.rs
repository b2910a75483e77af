//! Framed reliable stream transport (RADIUS over TCP, and the base for
//! RadSec)
//!
//! Each PDU is preceded by a 4-byte big-endian length. A long-lived session
//! multiplexes outstanding requests by packet identifier through a pending
//! table; a receiver task completes slots as frames arrive, a keep-alive
//! task probes idle sessions with Status-Server, and broken sessions are
//! re-established under a reconnect budget.

use super::RadiusTransport;
use crate::config::ConnectionConfig;
use crate::error::TransportError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use radius_proto::{Code, Packet, PacketCodec};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Maximum RADIUS PDU carried in one frame
const MAX_FRAME_LEN: u32 = 4096;
/// Response timeout for keep-alive probes
const KEEP_ALIVE_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Closing = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> SessionState {
        match value {
            1 => SessionState::Connecting,
            2 => SessionState::Connected,
            3 => SessionState::Closing,
            4 => SessionState::Closed,
            _ => SessionState::Disconnected,
        }
    }
}

/// Opens the byte stream a session runs on
///
/// The plain TCP and TLS variants differ only here; the session logic is
/// shared.
#[async_trait]
pub trait StreamConnector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Open a stream to `peer`, completing every step (including any
    /// handshake) within `limit`
    async fn open(&self, peer: SocketAddr, limit: Duration)
        -> Result<Self::Stream, TransportError>;
}

/// Plain TCP connector
pub struct TcpConnector;

#[async_trait]
impl StreamConnector for TcpConnector {
    type Stream = TcpStream;

    async fn open(
        &self,
        peer: SocketAddr,
        limit: Duration,
    ) -> Result<Self::Stream, TransportError> {
        let stream = timeout(limit, TcpStream::connect(peer))
            .await
            .map_err(|_| TransportError::ConnectTimeout(limit))??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

struct PendingSlot {
    tx: oneshot::Sender<Result<Vec<u8>, TransportError>>,
}

struct Inner<C: StreamConnector> {
    connector: C,
    peer: SocketAddr,
    secret: Vec<u8>,
    config: ConnectionConfig,
    codec: Arc<PacketCodec>,
    state: AtomicU8,
    closing: AtomicBool,
    reconnect_attempts: AtomicU32,
    /// identifier -> completion slot for the in-flight request
    pending: DashMap<u8, PendingSlot>,
    writer: Mutex<Option<WriteHalf<C::Stream>>>,
    /// Serializes connection establishment
    connect_lock: Mutex<()>,
    receiver_task: StdMutex<Option<JoinHandle<()>>>,
    keep_alive_task: StdMutex<Option<JoinHandle<()>>>,
    last_traffic: StdMutex<Instant>,
}

/// Stream transport over any [`StreamConnector`]
pub struct StreamTransport<C: StreamConnector> {
    inner: Arc<Inner<C>>,
}

impl<C: StreamConnector> StreamTransport<C> {
    pub fn new(
        connector: C,
        peer: SocketAddr,
        secret: Vec<u8>,
        config: ConnectionConfig,
        codec: Arc<PacketCodec>,
    ) -> Self {
        StreamTransport {
            inner: Arc::new(Inner {
                connector,
                peer,
                secret,
                config,
                codec,
                state: AtomicU8::new(SessionState::Disconnected as u8),
                closing: AtomicBool::new(false),
                reconnect_attempts: AtomicU32::new(0),
                pending: DashMap::new(),
                writer: Mutex::new(None),
                connect_lock: Mutex::new(()),
                receiver_task: StdMutex::new(None),
                keep_alive_task: StdMutex::new(None),
                last_traffic: StdMutex::new(Instant::now()),
            }),
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// Outstanding request count
    pub fn pending_len(&self) -> usize {
        self.inner.pending.len()
    }
}

impl<C: StreamConnector> Inner<C> {
    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn touch(&self) {
        *self.last_traffic.lock().expect("last_traffic lock") = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_traffic
            .lock()
            .expect("last_traffic lock")
            .elapsed()
    }

    /// Fail every pending slot with a freshly built error
    fn fail_all_pending(&self, make_error: impl Fn() -> TransportError) {
        let identifiers: Vec<u8> = self.pending.iter().map(|entry| *entry.key()).collect();
        for identifier in identifiers {
            if let Some((_, slot)) = self.pending.remove(&identifier) {
                let _ = slot.tx.send(Err(make_error()));
            }
        }
    }

    fn abort_keep_alive(&self) {
        if let Some(task) = self.keep_alive_task.lock().expect("keep_alive lock").take() {
            task.abort();
        }
    }

    fn abort_receiver(&self) {
        if let Some(task) = self.receiver_task.lock().expect("receiver lock").take() {
            task.abort();
        }
    }

    /// Establish the session if it is not already up
    fn establish(
        inner: &Arc<Self>,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + '_>> {
        Box::pin(async move {
            if inner.closing.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }

            let _guard = inner.connect_lock.lock().await;
            if inner.state() == SessionState::Connected {
                return Ok(());
            }

            inner.set_state(SessionState::Connecting);
            let stream = match inner
                .connector
                .open(inner.peer, inner.config.connection_timeout)
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    inner.set_state(SessionState::Disconnected);
                    return Err(e);
                }
            };

            let (read_half, write_half) = tokio::io::split(stream);
            *inner.writer.lock().await = Some(write_half);

            inner.abort_receiver();
            let receiver = tokio::spawn(Inner::receiver_loop(Arc::clone(inner), read_half));
            *inner.receiver_task.lock().expect("receiver lock") = Some(receiver);

            inner.touch();
            inner.set_state(SessionState::Connected);
            inner.reconnect_attempts.store(0, Ordering::Release);
            info!(peer = %inner.peer, "Stream session established");

            if let Some(interval) = inner.config.keep_alive_interval {
                inner.abort_keep_alive();
                let keep_alive = tokio::spawn(Inner::keep_alive_loop(Arc::clone(inner), interval));
                *inner.keep_alive_task.lock().expect("keep_alive lock") = Some(keep_alive);
            }

            Ok(())
        })
    }

    /// Read frames and complete pending slots until the stream dies
    async fn receiver_loop(inner: Arc<Self>, mut read: ReadHalf<C::Stream>) {
        loop {
            let mut len_buf = [0u8; 4];
            if let Err(e) = read.read_exact(&mut len_buf).await {
                debug!(peer = %inner.peer, error = %e, "Stream read failed");
                Inner::handle_session_error(&inner, || {
                    TransportError::ConnectionLost("connection reset by peer".to_string())
                })
                .await;
                return;
            }

            let frame_len = u32::from_be_bytes(len_buf);
            if frame_len == 0 || frame_len > MAX_FRAME_LEN {
                warn!(peer = %inner.peer, frame_len, "Invalid frame length, aborting session");
                Inner::handle_session_error(&inner, || TransportError::FrameLength(frame_len))
                    .await;
                return;
            }

            let mut frame = vec![0u8; frame_len as usize];
            if let Err(e) = read.read_exact(&mut frame).await {
                debug!(peer = %inner.peer, error = %e, "Stream read failed mid-frame");
                Inner::handle_session_error(&inner, || {
                    TransportError::ConnectionLost("connection reset by peer".to_string())
                })
                .await;
                return;
            }

            inner.touch();

            if frame.len() < 2 {
                debug!(peer = %inner.peer, "Dropped undersized frame");
                continue;
            }

            // The identifier sits at byte offset 1 of the PDU
            let identifier = frame[1];
            match inner.pending.remove(&identifier) {
                Some((_, slot)) => {
                    let _ = slot.tx.send(Ok(frame));
                }
                None => {
                    debug!(peer = %inner.peer, identifier, "Dropped frame with no pending request");
                }
            }
        }
    }

    /// Shared failure path for read/write errors and bad frames
    async fn handle_session_error(
        inner: &Arc<Self>,
        make_error: impl Fn() -> TransportError + Send,
    ) {
        if inner.closing.load(Ordering::Acquire) {
            return;
        }

        inner.set_state(SessionState::Disconnected);
        inner.writer.lock().await.take();
        inner.abort_keep_alive();
        inner.fail_all_pending(make_error);

        if inner.config.auto_reconnect_enabled {
            let inner = Arc::clone(inner);
            tokio::spawn(async move {
                Inner::auto_reconnect(inner).await;
            });
        }
    }

    /// Reconnect with delay under the configured budget
    async fn auto_reconnect(inner: Arc<Self>) {
        loop {
            if inner.closing.load(Ordering::Acquire) || inner.state() == SessionState::Connected {
                return;
            }

            let attempts = inner.reconnect_attempts.load(Ordering::Acquire);
            if attempts >= inner.config.max_reconnect_attempts {
                warn!(
                    peer = %inner.peer,
                    attempts,
                    "Reconnect budget exhausted"
                );
                return;
            }

            tokio::time::sleep(inner.config.reconnect_delay).await;
            inner.reconnect_attempts.fetch_add(1, Ordering::AcqRel);

            match Inner::establish(&inner).await {
                Ok(()) => {
                    info!(peer = %inner.peer, "Session re-established");
                    return;
                }
                Err(e) => {
                    warn!(peer = %inner.peer, error = %e, "Reconnect attempt failed");
                }
            }
        }
    }

    /// Probe idle sessions with a Status-Server request
    async fn keep_alive_loop(inner: Arc<Self>, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;

            if inner.closing.load(Ordering::Acquire) || inner.state() != SessionState::Connected {
                return;
            }
            if inner.idle_for() < interval {
                continue;
            }

            let Some(identifier) = (0u8..=255).find(|id| !inner.pending.contains_key(id)) else {
                continue;
            };

            let probe = Packet::new(Code::StatusServer, identifier, [0u8; 16]);
            let encoded = match inner.codec.encode_request(&probe, &inner.secret, [0u8; 16]) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(peer = %inner.peer, error = %e, "Failed to encode keep-alive probe");
                    return;
                }
            };

            debug!(peer = %inner.peer, identifier, "Sending keep-alive probe");
            match Inner::exchange_frame(
                &inner,
                &encoded.bytes,
                identifier,
                KEEP_ALIVE_PROBE_TIMEOUT,
            )
            .await
            {
                Ok(_) => {
                    debug!(peer = %inner.peer, "Keep-alive probe answered");
                }
                Err(e) => {
                    warn!(peer = %inner.peer, error = %e, "Keep-alive probe failed");
                    Inner::handle_session_error(&inner, || {
                        TransportError::ConnectionLost("keep-alive probe failed".to_string())
                    })
                    .await;
                    return;
                }
            }
        }
    }

    /// Register a pending slot, write one frame, await the response
    async fn exchange_frame(
        inner: &Arc<Self>,
        frame: &[u8],
        identifier: u8,
        per_attempt: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        if inner.closing.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        if inner.state() != SessionState::Connected {
            Inner::establish(inner).await?;
        }

        let rx = match inner.pending.entry(identifier) {
            Entry::Occupied(_) => {
                return Err(TransportError::DuplicateIdentifier(identifier));
            }
            Entry::Vacant(vacant) => {
                let (tx, rx) = oneshot::channel();
                vacant.insert(PendingSlot { tx });
                rx
            }
        };

        // Length prefix + PDU written as one unit with respect to other
        // senders
        {
            let mut guard = inner.writer.lock().await;
            let Some(writer) = guard.as_mut() else {
                inner.pending.remove(&identifier);
                return Err(TransportError::NotConnected);
            };

            let write_result = async {
                writer.write_all(&(frame.len() as u32).to_be_bytes()).await?;
                writer.write_all(frame).await?;
                writer.flush().await
            }
            .await;

            if let Err(e) = write_result {
                inner.pending.remove(&identifier);
                drop(guard);
                Inner::handle_session_error(inner, || {
                    TransportError::ConnectionLost("write failed".to_string())
                })
                .await;
                return Err(TransportError::ConnectionLost(e.to_string()));
            }
        }

        inner.touch();
        debug!(peer = %inner.peer, identifier, len = frame.len(), "Frame sent");

        match timeout(per_attempt, rx).await {
            Ok(Ok(result)) => result,
            // The slot was dropped without completing: session torn down
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                // Late responses find no pending entry and are discarded
                inner.pending.remove(&identifier);
                Err(TransportError::AttemptTimeout(per_attempt))
            }
        }
    }

    /// Drop the live session without latching the closed state
    async fn force_disconnect(inner: &Arc<Self>) {
        if inner.state() == SessionState::Connected || inner.state() == SessionState::Connecting {
            inner.set_state(SessionState::Disconnected);
        }
        inner.abort_keep_alive();
        inner.abort_receiver();
        if let Some(mut writer) = inner.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        inner.fail_all_pending(|| TransportError::ConnectionLost("session reset".to_string()));
    }
}

#[async_trait]
impl<C: StreamConnector> RadiusTransport for StreamTransport<C> {
    async fn connect(&self) -> Result<(), TransportError> {
        Inner::establish(&self.inner).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        let inner = &self.inner;
        if inner.closing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        inner.set_state(SessionState::Closing);
        inner.abort_keep_alive();
        inner.abort_receiver();
        if let Some(mut writer) = inner.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        inner.fail_all_pending(|| TransportError::Closed);
        inner.set_state(SessionState::Closed);
        info!(peer = %inner.peer, "Stream session closed");
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        let inner = &self.inner;
        if inner.closing.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let attempts = inner.reconnect_attempts.load(Ordering::Acquire);
        if attempts >= inner.config.max_reconnect_attempts {
            return Err(TransportError::ReconnectExceeded(attempts));
        }

        Inner::force_disconnect(inner).await;
        tokio::time::sleep(inner.config.reconnect_delay).await;
        inner.reconnect_attempts.fetch_add(1, Ordering::AcqRel);
        Inner::establish(inner).await
    }

    fn is_connected(&self) -> bool {
        self.inner.state() == SessionState::Connected
    }

    fn identifier_available(&self, identifier: u8) -> bool {
        !self.inner.pending.contains_key(&identifier)
    }

    async fn exchange(
        &self,
        frame: &[u8],
        identifier: u8,
        per_attempt: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        Inner::exchange_frame(&self.inner, frame, identifier, per_attempt).await
    }

    async fn reset(&self) {
        if self.inner.closing.load(Ordering::Acquire) {
            return;
        }
        Inner::force_disconnect(&self.inner).await;
    }
}
