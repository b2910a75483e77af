//! Async RADIUS client
//!
//! A transport-agnostic request/response engine on top of
//! [`radius_proto`]: it encodes request packets, moves them over one of
//! three wire transports (UDP datagrams, a framed TCP stream, or the same
//! stream inside TLS for RadSec), and correlates, retransmits, times out and
//! validates the responses.
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_client::{RadiusClient, TransportKind};
//! use radius_proto::auth::generate_request_authenticator;
//! use radius_proto::{Attribute, AttributeType, Code, Packet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RadiusClient::builder()
//!         .address("127.0.0.1:1812".parse()?)
//!         .secret("testing123")
//!         .transport(TransportKind::Datagram)
//!         .build()?;
//!
//!     let mut request = Packet::request(Code::AccessRequest);
//!     request.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice")?);
//!     request.add_attribute(Attribute::new(
//!         AttributeType::UserPassword as u8,
//!         b"password".to_vec(),
//!     )?);
//!
//!     let response = client.send_async(request).await?;
//!     println!("Server answered with {:?}", response.code);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use client::{RadiusClient, RadiusClientBuilder, TransportKind};
pub use config::ConnectionConfig;
pub use error::{ClientError, TransportError};
pub use retry::{
    ExponentialBackoffStrategy, IntervalRetransmissionStrategy, RetransmissionStrategy,
    RetryConfig,
};
pub use transport::{
    RadiusTransport, SessionState, StreamConnector, StreamTransport, TcpConnector, TlsOptions,
    TlsStreamConnector, TrustConfig, UdpTransport,
};
