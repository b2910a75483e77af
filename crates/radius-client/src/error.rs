//! Error taxonomy for the client
//!
//! Transport-level failures are classified as transient or fatal; the
//! retransmission controller absorbs transient failures until its attempt
//! budget or total deadline runs out, everything else surfaces immediately.

use radius_proto::{DecodeError, EncodeError};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by a transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connect did not complete within {0:?}")]
    ConnectTimeout(Duration),
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
    #[error("No response within {0:?}")]
    AttemptTimeout(Duration),
    #[error("Identifier {0} already has a request in flight")]
    DuplicateIdentifier(u8),
    #[error("Transport closed")]
    Closed,
    #[error("Transport not connected")]
    NotConnected,
    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExceeded(u32),
    #[error("Invalid frame length {0} on stream")]
    FrameLength(u32),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// True for failures the retransmission controller may retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_)
                | TransportError::ConnectionLost(_)
                | TransportError::AttemptTimeout(_)
                | TransportError::Tls(_)
                | TransportError::Io(_)
        )
    }
}

/// Failures surfaced to callers of the client façade
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Total deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("All {attempts} transmission attempts failed: {last}")]
    RetriesExhausted {
        attempts: usize,
        last: TransportError,
    },
    #[error("No free packet identifier: all 256 slots are pending")]
    NoFreeIdentifier,
    #[error("Configuration error: {0}")]
    Configuration(String),
}
