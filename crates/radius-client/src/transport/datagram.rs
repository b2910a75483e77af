//! Connectionless datagram transport (classic UDP RADIUS)
//!
//! One request in flight at a time: `exchange` sends a single datagram and
//! waits for the first datagram back from the configured peer. There is no
//! pending table; the retransmission controller serializes its own attempts
//! and the transport serializes concurrent callers.

use super::RadiusTransport;
use crate::error::TransportError;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{debug, info};

/// Receive buffer covering the maximum RADIUS packet size
const RECV_BUFFER_SIZE: usize = 4096;

pub struct UdpTransport {
    peer: SocketAddr,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    /// Serializes send-then-receive exchanges
    io_lock: Mutex<()>,
    closed: AtomicBool,
}

impl UdpTransport {
    pub fn new(peer: SocketAddr) -> Self {
        UdpTransport {
            peer,
            socket: Mutex::new(None),
            io_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    async fn socket(&self) -> Result<Arc<UdpSocket>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let mut guard = self.socket.lock().await;
        if let Some(socket) = guard.as_ref() {
            return Ok(Arc::clone(socket));
        }

        let bind_addr: SocketAddr = if self.peer.is_ipv4() {
            "0.0.0.0:0".parse().expect("valid bind address")
        } else {
            "[::]:0".parse().expect("valid bind address")
        };
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);
        info!(peer = %self.peer, local = %socket.local_addr()?, "Datagram socket bound");

        *guard = Some(Arc::clone(&socket));
        Ok(socket)
    }
}

#[async_trait]
impl RadiusTransport for UdpTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.socket().await.map(|_| ())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.socket.lock().await.take();
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        self.socket.lock().await.take();
        self.closed.store(false, Ordering::Release);
        self.connect().await
    }

    fn is_connected(&self) -> bool {
        // Connectionless: always reachable until closed
        !self.closed.load(Ordering::Acquire)
    }

    async fn exchange(
        &self,
        frame: &[u8],
        identifier: u8,
        per_attempt: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let socket = self.socket().await?;

        // One send-then-receive on the socket at a time
        let _io = self.io_lock.lock().await;

        socket.send_to(frame, self.peer).await?;
        debug!(peer = %self.peer, identifier, len = frame.len(), "Datagram sent");

        let deadline = Instant::now() + per_attempt;
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(TransportError::AttemptTimeout(per_attempt))?;

            let (len, source) = timeout(remaining, socket.recv_from(&mut buf))
                .await
                .map_err(|_| TransportError::AttemptTimeout(per_attempt))??;

            // Only the configured peer may answer
            if source != self.peer {
                debug!(source = %source, "Dropped datagram from unexpected source");
                continue;
            }

            debug!(peer = %self.peer, identifier, len, "Datagram received");
            return Ok(buf[..len].to_vec());
        }
    }

    async fn reset(&self) {
        // Nothing to tear down on a connectionless socket
    }
}
