//! Message-Authenticator Support (RFC 2869)
//!
//! This module implements the Message-Authenticator attribute for RADIUS.
//! Message-Authenticator provides integrity protection using HMAC-MD5.
//!
//! Per RFC 2869 Section 5.14 and RFC 3579 Section 3.2:
//! - Computed as HMAC-MD5(shared_secret, packet)
//! - Always 16 bytes (128 bits)
//! - Mandatory for RADIUS over TLS (RadSec), recommended elsewhere
//!
//! The HMAC is computed over the entire packet with the Message-Authenticator
//! value zeroed. For responses, the Authenticator header field holds the
//! Request Authenticator of the originating request during the computation.

use hmac::{Hmac, Mac};
use md5_digest::Md5;

use crate::attributes::AttributeType;
use crate::packet::Packet;

type HmacMd5 = Hmac<Md5>;

/// Byte offset of the Authenticator header field
const AUTHENTICATOR_OFFSET: usize = 4;
/// Wire length of a Message-Authenticator attribute (2-byte header + 16)
const MESSAGE_AUTHENTICATOR_ATTR_LEN: u8 = 18;

/// Calculate HMAC-MD5 over complete packet bytes
///
/// The caller is responsible for zeroing the Message-Authenticator value and
/// placing the correct contents in the Authenticator field first.
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(packet_bytes);
    let result = mac.finalize();
    let bytes = result.into_bytes();

    let mut output = [0u8; 16];
    output.copy_from_slice(&bytes);
    output
}

/// Locate the value of a Message-Authenticator attribute in encoded packet
/// bytes, returning the byte offset of its 16-byte value
pub fn find_message_authenticator(packet_bytes: &[u8]) -> Option<usize> {
    if packet_bytes.len() < Packet::MIN_PACKET_SIZE {
        return None;
    }

    let mut offset = Packet::MIN_PACKET_SIZE;
    while offset + 2 <= packet_bytes.len() {
        let attr_type = packet_bytes[offset];
        let attr_len = packet_bytes[offset + 1] as usize;
        if attr_len < 2 || offset + attr_len > packet_bytes.len() {
            return None;
        }
        if attr_type == AttributeType::MessageAuthenticator as u8
            && attr_len == MESSAGE_AUTHENTICATOR_ATTR_LEN as usize
        {
            return Some(offset + 2);
        }
        offset += attr_len;
    }

    None
}

/// Compute and write the Message-Authenticator value in place
///
/// The packet's Authenticator field must already hold the contents that are
/// covered by the HMAC (random Request Authenticator, zeros for computed-
/// authenticator requests, or the originating Request Authenticator for
/// responses). Returns false when the packet carries no Message-Authenticator
/// attribute.
pub fn fill_message_authenticator(packet_bytes: &mut [u8], secret: &[u8]) -> bool {
    let Some(value_offset) = find_message_authenticator(packet_bytes) else {
        return false;
    };

    packet_bytes[value_offset..value_offset + 16].fill(0);
    let mac = calculate_message_authenticator(packet_bytes, secret);
    packet_bytes[value_offset..value_offset + 16].copy_from_slice(&mac);
    true
}

/// Verify the Message-Authenticator of a packet, if present
///
/// `request_authenticator` must be supplied when verifying a response; the
/// HMAC of a response covers the Request Authenticator of the originating
/// request in place of the Response Authenticator. Packets without a
/// Message-Authenticator attribute verify trivially.
pub fn verify_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
    request_authenticator: Option<&[u8; 16]>,
) -> bool {
    let Some(value_offset) = find_message_authenticator(packet_bytes) else {
        return true;
    };

    let received = &packet_bytes[value_offset..value_offset + 16];

    let mut copy = packet_bytes.to_vec();
    copy[value_offset..value_offset + 16].fill(0);
    if let Some(request_auth) = request_authenticator {
        copy[AUTHENTICATOR_OFFSET..AUTHENTICATOR_OFFSET + 16].copy_from_slice(request_auth);
    }

    let expected = calculate_message_authenticator(&copy, secret);
    received == expected
}
