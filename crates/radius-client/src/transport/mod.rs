//! Wire transports
//!
//! One asynchronous send/receive abstraction, implemented for three wire
//! flavours: connectionless datagrams (classic UDP RADIUS), a framed
//! reliable stream (RADIUS over TCP) and the same stream inside a TLS
//! session (RadSec). The stream implementations share a single session type,
//! parameterized over how the byte stream is opened.

mod datagram;
mod secure;
mod stream;

pub use datagram::UdpTransport;
pub use secure::{TlsOptions, TlsStreamConnector, TrustConfig};
pub use stream::{SessionState, StreamConnector, StreamTransport, TcpConnector};

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Uniform asynchronous transport interface
///
/// `exchange` writes one encoded request and resolves with the matching
/// response frame, or a [`TransportError`]. Implementations own framing,
/// connection lifecycle and multiplexing; the retransmission controller owns
/// the attempt schedule and identifier allocation.
#[async_trait]
pub trait RadiusTransport: Send + Sync {
    /// Establish the session. A no-op beyond socket setup for datagram
    /// transports.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear the session down. Outstanding exchanges fail with
    /// [`TransportError::Closed`]. Idempotent.
    async fn close(&self) -> Result<(), TransportError>;

    /// Drop the current session and establish a fresh one
    async fn reconnect(&self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Whether an identifier is free for a new request. Always true on
    /// transports without a pending table.
    fn identifier_available(&self, _identifier: u8) -> bool {
        true
    }

    /// Send one encoded request and await the response frame carrying the
    /// same identifier, bounded by `timeout`
    async fn exchange(
        &self,
        frame: &[u8],
        identifier: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Forcibly discard the current session, if any, without latching the
    /// closed state; the next exchange reconnects. No-op on datagram
    /// transports.
    async fn reset(&self);
}
