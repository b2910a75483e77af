//! CHAP (Challenge-Handshake Authentication Protocol) Support
//!
//! This module implements CHAP authentication for RADIUS as defined in RFC 2865 Section 5.3.
//!
//! CHAP avoids sending the password in clear text: the client hashes the
//! challenge together with the password and sends the hash as the
//! CHAP-Password attribute. A client uses [`ChapResponse::compute`] with the
//! Request Authenticator (or an explicit CHAP-Challenge attribute) as the
//! challenge; a server verifies with [`verify_chap_response`].

/// CHAP response structure
///
/// A CHAP response consists of:
/// - CHAP Identifier (1 byte)
/// - CHAP Response (16 bytes MD5 hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapResponse {
    /// CHAP identifier (must match the challenge)
    pub ident: u8,
    /// MD5 hash of (ident + password + challenge)
    pub response: [u8; 16],
}

impl ChapResponse {
    /// Create a new CHAP response from raw bytes
    ///
    /// The CHAP-Password attribute value must be exactly 17 bytes:
    /// - 1 byte: CHAP identifier
    /// - 16 bytes: MD5 hash
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChapError> {
        if bytes.len() != 17 {
            return Err(ChapError::InvalidLength(bytes.len()));
        }

        let ident = bytes[0];
        let mut response = [0u8; 16];
        response.copy_from_slice(&bytes[1..17]);

        Ok(ChapResponse { ident, response })
    }

    /// Convert CHAP response to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(17);
        bytes.push(self.ident);
        bytes.extend_from_slice(&self.response);
        bytes
    }

    /// Compute the CHAP response a client puts into the CHAP-Password
    /// attribute
    pub fn compute(ident: u8, password: &str, challenge: &ChapChallenge) -> Self {
        ChapResponse {
            ident,
            response: compute_chap_response(ident, password, challenge.as_bytes()),
        }
    }
}

/// CHAP challenge
///
/// A CHAP challenge can come from either:
/// 1. The Request Authenticator (16 bytes)
/// 2. The CHAP-Challenge attribute (variable length, typically 16 bytes)
///
/// Per RFC 2865 Section 5.3: If the CHAP-Challenge attribute is present,
/// it should be used. Otherwise, use the Request Authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapChallenge {
    /// The challenge bytes
    pub challenge: Vec<u8>,
}

impl ChapChallenge {
    /// Create a new CHAP challenge
    pub fn new(challenge: Vec<u8>) -> Self {
        ChapChallenge { challenge }
    }

    /// Create a CHAP challenge from the Request Authenticator
    pub fn from_authenticator(authenticator: &[u8; 16]) -> Self {
        ChapChallenge {
            challenge: authenticator.to_vec(),
        }
    }

    /// Get the challenge bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.challenge
    }
}

/// Compute the expected CHAP response
///
/// The CHAP response is computed as:
/// MD5(CHAP_Identifier + Password + Challenge)
///
/// # Arguments
/// * `ident` - CHAP identifier (from CHAP-Password attribute)
/// * `password` - User's password (plain text)
/// * `challenge` - CHAP challenge (from CHAP-Challenge attribute or Request Authenticator)
///
/// # Returns
/// The expected CHAP response (16 bytes MD5 hash)
pub fn compute_chap_response(ident: u8, password: &str, challenge: &[u8]) -> [u8; 16] {
    let mut data = Vec::new();
    data.push(ident);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(challenge);

    let digest = md5::compute(&data);
    let mut response = [0u8; 16];
    response.copy_from_slice(&digest.0);
    response
}

/// Verify a CHAP response
///
/// # Arguments
/// * `chap_response` - The CHAP response from the client (CHAP-Password attribute)
/// * `password` - User's password (plain text)
/// * `challenge` - CHAP challenge used
///
/// # Returns
/// `true` if the response is valid, `false` otherwise
pub fn verify_chap_response(
    chap_response: &ChapResponse,
    password: &str,
    challenge: &ChapChallenge,
) -> bool {
    let expected = compute_chap_response(chap_response.ident, password, challenge.as_bytes());
    chap_response.response == expected
}

/// CHAP-specific errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChapError {
    #[error("Invalid CHAP-Password length: expected 17 bytes, got {0}")]
    InvalidLength(usize),
    #[error("CHAP-Challenge not found")]
    ChallengeNotFound,
    #[error("CHAP-Password not found")]
    PasswordNotFound,
}
