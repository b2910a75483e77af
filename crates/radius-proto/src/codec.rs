//! Packet codec: wire form plus cryptographic fields
//!
//! [`PacketCodec`] turns [`Packet`] values into complete wire packets and
//! back, handling the Request/Response Authenticator, the
//! Message-Authenticator attribute, and dictionary-driven value handling
//! (validation plus User-Password / Tunnel-Password hiding).
//!
//! The caller owns the packet identifier; the codec never assigns one. The
//! authenticator the codec actually writes (random for Access-Request, an
//! MD5 digest for accounting-style requests) is reported back through
//! [`EncodedRequest`] so the sender can validate the matching response.

use crate::attributes::Attribute;
use crate::auth::{
    calculate_request_authenticator, calculate_response_authenticator, decrypt_tunnel_password,
    decrypt_user_password, encrypt_tunnel_password, encrypt_user_password,
    verify_request_authenticator, verify_response_authenticator,
};
use crate::dictionary::{Dictionary, ValueKind};
use crate::message_auth::{fill_message_authenticator, verify_message_authenticator};
use crate::packet::{Code, Packet, PacketError};
use crate::random::RandomProvider;
use std::sync::Arc;
use thiserror::Error;

/// Byte offset of the Authenticator header field
const AUTHENTICATOR_OFFSET: usize = 4;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("Code {0:?} is not a request code")]
    NotARequest(Code),
    #[error("Code {0:?} is not a response code")]
    NotAResponse(Code),
    #[error("A shared secret is required to hide attribute {0}")]
    MissingSecret(u8),
    #[error("Attribute {attr_type}: {reason}")]
    InvalidAttribute { attr_type: u8, reason: String },
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("Code {0:?} is not a request code")]
    NotARequest(Code),
    #[error("Code {0:?} is not a response code")]
    NotAResponse(Code),
    #[error("Response Authenticator mismatch")]
    AuthenticatorMismatch,
    #[error("Request Authenticator mismatch")]
    RequestAuthenticatorMismatch,
    #[error("Message-Authenticator mismatch")]
    MessageAuthenticatorMismatch,
    #[error("Attribute {attr_type}: {reason}")]
    InvalidAttribute { attr_type: u8, reason: String },
}

/// A fully encoded request and the authenticator that went onto the wire
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    /// Complete wire form
    pub bytes: Vec<u8>,
    /// Authenticator written into the packet: the caller-supplied random
    /// bytes for Access-Request, the computed digest for accounting-style
    /// requests. Response validation needs exactly this value.
    pub authenticator: [u8; 16],
}

/// Bidirectional packet conversion with per-attribute dictionary lookup
pub struct PacketCodec {
    dictionary: Arc<dyn Dictionary>,
    random: Arc<dyn RandomProvider>,
}

impl PacketCodec {
    pub fn new(dictionary: Arc<dyn Dictionary>, random: Arc<dyn RandomProvider>) -> Self {
        PacketCodec { dictionary, random }
    }

    pub fn dictionary(&self) -> &Arc<dyn Dictionary> {
        &self.dictionary
    }

    /// Encode a request packet
    ///
    /// `request_authenticator` must be 16 cryptographically random bytes. For
    /// Accounting-Request, Status-Server, CoA-Request and Disconnect-Request
    /// it is ignored and the authenticator is computed over the packet
    /// instead; the value actually used is returned.
    pub fn encode_request(
        &self,
        packet: &Packet,
        secret: &[u8],
        request_authenticator: [u8; 16],
    ) -> Result<EncodedRequest, EncodeError> {
        if !packet.code.is_request() {
            return Err(EncodeError::NotARequest(packet.code));
        }

        let hiding_authenticator = if packet.code.uses_computed_authenticator() {
            None
        } else {
            Some(request_authenticator)
        };
        let attributes = self.prepare_attributes(packet, secret, hiding_authenticator)?;

        let mut working = Packet::new(packet.code, packet.identifier, [0u8; 16]);
        working.attributes = attributes;

        if packet.code.uses_computed_authenticator() {
            // Message-Authenticator is computed over the zeroed authenticator
            // field, then the request digest over the finished packet
            let mut bytes = working.encode()?;
            fill_message_authenticator(&mut bytes, secret);
            let authenticator = calculate_request_authenticator(&bytes, secret);
            bytes[AUTHENTICATOR_OFFSET..AUTHENTICATOR_OFFSET + 16].copy_from_slice(&authenticator);
            Ok(EncodedRequest {
                bytes,
                authenticator,
            })
        } else {
            working.authenticator = request_authenticator;
            let mut bytes = working.encode()?;
            fill_message_authenticator(&mut bytes, secret);
            Ok(EncodedRequest {
                bytes,
                authenticator: request_authenticator,
            })
        }
    }

    /// Decode and validate a response
    ///
    /// `request_authenticator` is the authenticator the client sent (as
    /// reported by [`encode_request`](Self::encode_request)). A Response
    /// Authenticator or Message-Authenticator mismatch is an error.
    pub fn decode_response(
        &self,
        bytes: &[u8],
        secret: &[u8],
        request_authenticator: &[u8; 16],
    ) -> Result<Packet, DecodeError> {
        let packet = Packet::decode(bytes)?;
        if packet.code.is_request() {
            return Err(DecodeError::NotAResponse(packet.code));
        }

        if !verify_response_authenticator(bytes, request_authenticator, secret) {
            return Err(DecodeError::AuthenticatorMismatch);
        }

        if !verify_message_authenticator(bytes, secret, Some(request_authenticator)) {
            return Err(DecodeError::MessageAuthenticatorMismatch);
        }

        Ok(packet)
    }

    /// Decode and validate a request (server-side collaborator)
    ///
    /// Verifies the computed Request Authenticator for accounting-style
    /// requests and any Message-Authenticator, and un-hides encrypted
    /// attribute values. The wire identifier and authenticator are preserved
    /// in the packet's received fields.
    pub fn decode_request(&self, bytes: &[u8], secret: &[u8]) -> Result<Packet, DecodeError> {
        let mut packet = Packet::decode(bytes)?;
        if !packet.code.is_request() {
            return Err(DecodeError::NotARequest(packet.code));
        }

        if packet.code.uses_computed_authenticator() {
            if !verify_request_authenticator(bytes, secret) {
                return Err(DecodeError::RequestAuthenticatorMismatch);
            }
            // Message-Authenticator was filled while the field held zeros
            if !verify_message_authenticator(bytes, secret, Some(&[0u8; 16])) {
                return Err(DecodeError::MessageAuthenticatorMismatch);
            }
        } else if !verify_message_authenticator(bytes, secret, None) {
            return Err(DecodeError::MessageAuthenticatorMismatch);
        }

        if packet.code == Code::AccessRequest {
            let authenticator = packet.authenticator;
            for attr in packet.attributes.iter_mut() {
                match self.dictionary.attribute_kind(attr.attr_type) {
                    ValueKind::EncryptedText => {
                        let plain = decrypt_user_password(&attr.value, secret, &authenticator)
                            .map_err(|reason| DecodeError::InvalidAttribute {
                                attr_type: attr.attr_type,
                                reason,
                            })?;
                        attr.value = plain;
                    }
                    ValueKind::EncryptedTagged => {
                        let (tag, plain) =
                            decrypt_tunnel_password(&attr.value, secret, &authenticator).map_err(
                                |reason| DecodeError::InvalidAttribute {
                                    attr_type: attr.attr_type,
                                    reason,
                                },
                            )?;
                        let mut value = Vec::with_capacity(plain.len() + 1);
                        value.push(tag);
                        value.extend_from_slice(&plain);
                        attr.value = value;
                    }
                    _ => {}
                }
            }
        }

        Ok(packet)
    }

    /// Encode a response packet (server-side collaborator)
    ///
    /// The identifier and Request Authenticator of the originating request
    /// bind the response to it.
    pub fn encode_response(
        &self,
        packet: &Packet,
        secret: &[u8],
        request_identifier: u8,
        request_authenticator: &[u8; 16],
    ) -> Result<Vec<u8>, EncodeError> {
        if packet.code.is_request() {
            return Err(EncodeError::NotAResponse(packet.code));
        }

        let attributes = self.prepare_attributes(packet, secret, None)?;

        // The Message-Authenticator of a response covers the Request
        // Authenticator in the header field; the Response Authenticator then
        // replaces it
        let mut working = Packet::new(packet.code, request_identifier, *request_authenticator);
        working.attributes = attributes;

        let mut bytes = working.encode()?;
        fill_message_authenticator(&mut bytes, secret);
        let response_authenticator =
            calculate_response_authenticator(&bytes, request_authenticator, secret);
        bytes[AUTHENTICATOR_OFFSET..AUTHENTICATOR_OFFSET + 16]
            .copy_from_slice(&response_authenticator);

        Ok(bytes)
    }

    /// Validate attribute values against the dictionary and hide encrypted
    /// values when an authenticator for hiding is available
    fn prepare_attributes(
        &self,
        packet: &Packet,
        secret: &[u8],
        hiding_authenticator: Option<[u8; 16]>,
    ) -> Result<Vec<Attribute>, EncodeError> {
        let mut prepared = Vec::with_capacity(packet.attributes.len());

        for attr in &packet.attributes {
            let kind = self.dictionary.attribute_kind(attr.attr_type);
            match kind {
                ValueKind::EncryptedText => {
                    let authenticator = hiding_authenticator.ok_or_else(|| {
                        EncodeError::InvalidAttribute {
                            attr_type: attr.attr_type,
                            reason: "hidden attribute not valid for this packet code".to_string(),
                        }
                    })?;
                    if secret.is_empty() {
                        return Err(EncodeError::MissingSecret(attr.attr_type));
                    }
                    let hidden = encrypt_user_password(&attr.value, secret, &authenticator);
                    prepared.push(Attribute::new(attr.attr_type, hidden)?);
                }
                ValueKind::EncryptedTagged => {
                    let authenticator = hiding_authenticator.ok_or_else(|| {
                        EncodeError::InvalidAttribute {
                            attr_type: attr.attr_type,
                            reason: "hidden attribute not valid for this packet code".to_string(),
                        }
                    })?;
                    if secret.is_empty() {
                        return Err(EncodeError::MissingSecret(attr.attr_type));
                    }
                    if attr.value.is_empty() {
                        return Err(EncodeError::InvalidAttribute {
                            attr_type: attr.attr_type,
                            reason: "tagged value requires a leading tag byte".to_string(),
                        });
                    }
                    let mut salt = [0u8; 2];
                    self.random.fill_bytes(&mut salt);
                    salt[0] |= 0x80;
                    let hidden = encrypt_tunnel_password(
                        &attr.value[1..],
                        attr.value[0],
                        secret,
                        &authenticator,
                        salt,
                    );
                    prepared.push(Attribute::new(attr.attr_type, hidden)?);
                }
                _ => {
                    self.validate_value(attr.attr_type, kind, &attr.value)?;
                    prepared.push(attr.clone());
                }
            }
        }

        Ok(prepared)
    }

    fn validate_value(
        &self,
        attr_type: u8,
        kind: ValueKind,
        value: &[u8],
    ) -> Result<(), EncodeError> {
        let invalid = |reason: String| EncodeError::InvalidAttribute { attr_type, reason };

        match kind {
            ValueKind::Integer | ValueKind::Enum | ValueKind::Time => {
                if value.len() != 4 {
                    return Err(invalid(format!("expected 4 bytes, got {}", value.len())));
                }
            }
            ValueKind::Ipv4 => {
                if value.len() != 4 {
                    return Err(invalid(format!(
                        "expected 4-byte IPv4 address, got {}",
                        value.len()
                    )));
                }
            }
            ValueKind::Ipv6 => {
                if value.len() != 16 {
                    return Err(invalid(format!(
                        "expected 16-byte IPv6 address, got {}",
                        value.len()
                    )));
                }
            }
            ValueKind::InterfaceId => {
                if value.len() != 8 {
                    return Err(invalid(format!(
                        "expected 8-byte interface id, got {}",
                        value.len()
                    )));
                }
            }
            ValueKind::Text => {
                if std::str::from_utf8(value).is_err() {
                    return Err(invalid("invalid UTF-8".to_string()));
                }
            }
            ValueKind::Tagged => {
                if value.is_empty() {
                    return Err(invalid("tagged value requires a leading tag byte".to_string()));
                }
            }
            ValueKind::VendorSpecific => {
                let container = Attribute::new(attr_type, value.to_vec())?;
                let (vendor_id, subs) = container
                    .as_vendor()
                    .map_err(|e| invalid(e.to_string()))?;
                for (sub_type, data) in subs {
                    let sub_kind = self.dictionary.vendor_attribute_kind(vendor_id, sub_type);
                    // Vendor values never nest further hiding
                    match sub_kind {
                        ValueKind::VendorSpecific
                        | ValueKind::EncryptedText
                        | ValueKind::EncryptedTagged => {
                            return Err(invalid(format!(
                                "unsupported vendor sub-attribute kind for type {}",
                                sub_type
                            )));
                        }
                        other => self.validate_value(attr_type, other, &data)?,
                    }
                }
            }
            ValueKind::Binary | ValueKind::EncryptedText | ValueKind::EncryptedTagged => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;
    use crate::auth::generate_request_authenticator;
    use crate::dictionary::StandardDictionary;
    use crate::random::SecureRandomProvider;

    fn codec() -> PacketCodec {
        PacketCodec::new(
            Arc::new(StandardDictionary),
            Arc::new(SecureRandomProvider),
        )
    }

    fn access_request(identifier: u8) -> Packet {
        let mut packet = Packet::new(Code::AccessRequest, identifier, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
        packet.add_attribute(
            Attribute::new(AttributeType::UserPassword as u8, b"hunter2".to_vec()).unwrap(),
        );
        packet
    }

    #[test]
    fn test_request_roundtrip_with_password_hiding() {
        let codec = codec();
        let secret = b"sec";
        let auth = generate_request_authenticator();

        let encoded = codec.encode_request(&access_request(1), secret, auth).unwrap();
        assert_eq!(encoded.authenticator, auth);

        // On the wire the password is hidden
        let raw = Packet::decode(&encoded.bytes).unwrap();
        let wire_password = raw.find_attribute(AttributeType::UserPassword as u8).unwrap();
        assert_ne!(wire_password.value, b"hunter2".to_vec());
        assert_eq!(wire_password.value.len() % 16, 0);

        // decode_request recovers the plaintext
        let decoded = codec.decode_request(&encoded.bytes, secret).unwrap();
        assert_eq!(decoded.identifier, 1);
        assert_eq!(
            decoded
                .find_attribute(AttributeType::UserPassword as u8)
                .unwrap()
                .value,
            b"hunter2".to_vec()
        );
        assert_eq!(decoded.received_fields().unwrap().authenticator, auth);
    }

    #[test]
    fn test_response_roundtrip() {
        let codec = codec();
        let secret = b"sec";
        let request_auth = generate_request_authenticator();

        let mut reply = Packet::new(Code::AccessAccept, 0, [0u8; 16]);
        reply.add_attribute(
            Attribute::string(AttributeType::ReplyMessage as u8, "welcome").unwrap(),
        );

        let bytes = codec.encode_response(&reply, secret, 42, &request_auth).unwrap();
        let decoded = codec.decode_response(&bytes, secret, &request_auth).unwrap();

        assert_eq!(decoded.code, Code::AccessAccept);
        assert_eq!(decoded.identifier, 42);
        assert_eq!(
            decoded
                .find_attribute(AttributeType::ReplyMessage as u8)
                .unwrap()
                .as_string()
                .unwrap(),
            "welcome"
        );
    }

    #[test]
    fn test_response_authenticator_mismatch() {
        let codec = codec();
        let secret = b"sec";
        let request_auth = generate_request_authenticator();

        let reply = Packet::new(Code::AccessAccept, 0, [0u8; 16]);
        let mut bytes = codec.encode_response(&reply, secret, 1, &request_auth).unwrap();

        // Flip one bit in the Response Authenticator
        bytes[AUTHENTICATOR_OFFSET] ^= 0x01;

        assert!(matches!(
            codec.decode_response(&bytes, secret, &request_auth),
            Err(DecodeError::AuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_response_wrong_request_authenticator() {
        let codec = codec();
        let secret = b"sec";
        let request_auth = generate_request_authenticator();

        let reply = Packet::new(Code::AccessAccept, 0, [0u8; 16]);
        let bytes = codec.encode_response(&reply, secret, 1, &request_auth).unwrap();

        assert!(matches!(
            codec.decode_response(&bytes, secret, &[0u8; 16]),
            Err(DecodeError::AuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_accounting_request_computed_authenticator() {
        let codec = codec();
        let secret = b"sec";

        let mut packet = Packet::new(Code::AccountingRequest, 5, [0u8; 16]);
        packet.add_attribute(Attribute::integer(AttributeType::AcctStatusType as u8, 1).unwrap());
        packet.add_attribute(
            Attribute::string(AttributeType::AcctSessionId as u8, "sess-01").unwrap(),
        );

        // The caller-supplied authenticator is ignored for accounting
        let encoded = codec.encode_request(&packet, secret, [0xFF; 16]).unwrap();
        assert_ne!(encoded.authenticator, [0xFF; 16]);
        assert_eq!(&encoded.bytes[4..20], &encoded.authenticator);

        let decoded = codec.decode_request(&encoded.bytes, secret).unwrap();
        assert_eq!(decoded.code, Code::AccountingRequest);
        assert_eq!(decoded.identifier, 5);
    }

    #[test]
    fn test_accounting_request_tamper_detected() {
        let codec = codec();
        let secret = b"sec";

        let mut packet = Packet::new(Code::AccountingRequest, 5, [0u8; 16]);
        packet.add_attribute(Attribute::integer(AttributeType::AcctStatusType as u8, 2).unwrap());

        let mut encoded = codec.encode_request(&packet, secret, [0u8; 16]).unwrap();
        encoded.bytes[AUTHENTICATOR_OFFSET + 3] ^= 0x40;

        assert!(matches!(
            codec.decode_request(&encoded.bytes, secret),
            Err(DecodeError::RequestAuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_message_authenticator_request_flow() {
        let codec = codec();
        let secret = b"sec";
        let auth = generate_request_authenticator();

        let mut packet = access_request(3);
        packet.add_attribute(
            Attribute::new(AttributeType::MessageAuthenticator as u8, vec![0u8; 16]).unwrap(),
        );

        let encoded = codec.encode_request(&packet, secret, auth).unwrap();

        // The codec filled the HMAC in; the wire value is non-zero
        let raw = Packet::decode(&encoded.bytes).unwrap();
        let ma = raw
            .find_attribute(AttributeType::MessageAuthenticator as u8)
            .unwrap();
        assert_ne!(ma.value, vec![0u8; 16]);

        assert!(codec.decode_request(&encoded.bytes, secret).is_ok());

        // Tampering the User-Name value breaks the HMAC
        let mut tampered = encoded.bytes.clone();
        tampered[22] ^= 0x01;
        assert!(matches!(
            codec.decode_request(&tampered, secret),
            Err(DecodeError::MessageAuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_message_authenticator_response_flow() {
        let codec = codec();
        let secret = b"sec";
        let request_auth = generate_request_authenticator();

        let mut reply = Packet::new(Code::AccessChallenge, 0, [0u8; 16]);
        reply.add_attribute(Attribute::new(AttributeType::State as u8, vec![1, 2, 3]).unwrap());
        reply.add_attribute(
            Attribute::new(AttributeType::MessageAuthenticator as u8, vec![0u8; 16]).unwrap(),
        );

        let bytes = codec.encode_response(&reply, secret, 8, &request_auth).unwrap();
        let decoded = codec.decode_response(&bytes, secret, &request_auth).unwrap();
        assert_eq!(decoded.code, Code::AccessChallenge);
    }

    #[test]
    fn test_tunnel_password_hiding() {
        let codec = codec();
        let secret = b"sec";
        let auth = generate_request_authenticator();

        let mut packet = Packet::new(Code::AccessRequest, 2, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "bob").unwrap());
        packet.add_attribute(
            Attribute::new(AttributeType::UserPassword as u8, b"pw".to_vec()).unwrap(),
        );
        // Tag 0x01 followed by the plaintext tunnel password
        let mut tunnel_value = vec![0x01];
        tunnel_value.extend_from_slice(b"tunnel-secret");
        packet.add_attribute(
            Attribute::new(AttributeType::TunnelPassword as u8, tunnel_value.clone()).unwrap(),
        );

        let encoded = codec.encode_request(&packet, secret, auth).unwrap();

        let raw = Packet::decode(&encoded.bytes).unwrap();
        let wire = raw.find_attribute(AttributeType::TunnelPassword as u8).unwrap();
        assert_eq!(wire.value[0], 0x01);
        assert!(wire.value[1] & 0x80 != 0); // salt high bit

        let decoded = codec.decode_request(&encoded.bytes, secret).unwrap();
        assert_eq!(
            decoded
                .find_attribute(AttributeType::TunnelPassword as u8)
                .unwrap()
                .value,
            tunnel_value
        );
    }

    #[test]
    fn test_encode_rejects_response_code() {
        let codec = codec();
        let packet = Packet::new(Code::AccessAccept, 1, [0u8; 16]);
        assert!(matches!(
            codec.encode_request(&packet, b"sec", [0u8; 16]),
            Err(EncodeError::NotARequest(Code::AccessAccept))
        ));
    }

    #[test]
    fn test_encode_rejects_missing_secret_for_password() {
        let codec = codec();
        assert!(matches!(
            codec.encode_request(&access_request(1), b"", [0u8; 16]),
            Err(EncodeError::MissingSecret(2))
        ));
    }

    #[test]
    fn test_encode_validates_typed_values() {
        let codec = codec();
        let auth = generate_request_authenticator();

        let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "a").unwrap());
        // NAS-Port is an integer attribute; 3 bytes is invalid
        packet.add_attribute(Attribute::new(AttributeType::NasPort as u8, vec![1, 2, 3]).unwrap());

        assert!(matches!(
            codec.encode_request(&packet, b"sec", auth),
            Err(EncodeError::InvalidAttribute { attr_type: 5, .. })
        ));
    }

    #[test]
    fn test_unknown_attribute_passes_through() {
        let codec = codec();
        let secret = b"sec";
        let auth = generate_request_authenticator();

        let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "a").unwrap());
        packet.add_attribute(Attribute::new(224, vec![0xDE, 0xAD]).unwrap());

        let encoded = codec.encode_request(&packet, secret, auth).unwrap();
        let decoded = codec.decode_request(&encoded.bytes, secret).unwrap();
        assert_eq!(decoded.find_attribute(224).unwrap().value, vec![0xDE, 0xAD]);
    }

    #[test]
    fn test_attribute_order_preserved() {
        let codec = codec();
        let secret = b"sec";
        let auth = generate_request_authenticator();

        let mut packet = Packet::new(Code::AccessRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "a").unwrap());
        // Repeated attributes keep their relative order
        packet.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![1]).unwrap());
        packet.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![2]).unwrap());
        packet.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![3]).unwrap());

        let encoded = codec.encode_request(&packet, secret, auth).unwrap();
        let decoded = codec.decode_request(&encoded.bytes, secret).unwrap();

        let states: Vec<u8> = decoded
            .find_all_attributes(AttributeType::ProxyState as u8)
            .iter()
            .map(|a| a.value[0])
            .collect();
        assert_eq!(states, vec![1, 2, 3]);
    }
}
