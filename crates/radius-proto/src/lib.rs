//! RADIUS Protocol Implementation
//!
//! This crate provides the protocol half of a RADIUS client: packet
//! encoding/decoding with authenticator protection, as defined in
//! RFC 2865, 2866, 2868, 2869 and 5997.
//!
//! # Features
//!
//! - Symmetric packet encoding and decoding via [`PacketCodec`]
//! - Request/Response Authenticator computation and validation
//! - Message-Authenticator (HMAC-MD5) support
//! - User-Password and Tunnel-Password hiding
//! - Dictionary-driven attribute value handling
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use radius_proto::{Attribute, AttributeType, Code, Packet, PacketCodec};
//! use radius_proto::auth::{encrypt_user_password, generate_request_authenticator};
//! use radius_proto::dictionary::StandardDictionary;
//! use radius_proto::random::SecureRandomProvider;
//!
//! let codec = PacketCodec::new(
//!     Arc::new(StandardDictionary),
//!     Arc::new(SecureRandomProvider),
//! );
//!
//! // Create an Access-Request packet
//! let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);
//! packet.add_attribute(
//!     Attribute::string(AttributeType::UserName as u8, "alice").unwrap()
//! );
//! packet.add_attribute(
//!     Attribute::new(AttributeType::UserPassword as u8, b"password".to_vec()).unwrap()
//! );
//!
//! // Encode to wire form; the codec hides the password
//! let request_authenticator = generate_request_authenticator();
//! let encoded = codec.encode_request(&packet, b"secret", request_authenticator).unwrap();
//! assert_eq!(encoded.authenticator, request_authenticator);
//! ```

pub mod accounting;
pub mod attributes;
pub mod auth;
pub mod chap;
pub mod codec;
pub mod dictionary;
pub mod message_auth;
pub mod packet;
pub mod random;

pub use accounting::{AccountingRequest, AcctAuthentic, AcctStatusType, AcctTerminateCause};
pub use attributes::{Attribute, AttributeType};
pub use auth::{
    calculate_request_authenticator, calculate_response_authenticator, decrypt_user_password,
    encrypt_user_password, generate_request_authenticator, verify_response_authenticator,
};
pub use chap::{
    compute_chap_response, verify_chap_response, ChapChallenge, ChapError, ChapResponse,
};
pub use codec::{DecodeError, EncodeError, EncodedRequest, PacketCodec};
pub use dictionary::{Dictionary, StandardDictionary, ValueKind};
pub use message_auth::{calculate_message_authenticator, verify_message_authenticator};
pub use packet::{
    Code, IncrementingIdGenerator, Packet, PacketError, PacketIdGenerator, ReceivedFields,
};
pub use random::{RandomProvider, SecureRandomProvider};
