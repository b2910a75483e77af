use rand::Rng;

/// Byte offset of the Authenticator header field
const AUTHENTICATOR_OFFSET: usize = 4;
/// Header length preceding the attributes
const HEADER_LEN: usize = 20;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    authenticator
}

/// Calculate Response Authenticator per RFC 2865 Section 3 over complete
/// encoded packet bytes
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// Whatever the authenticator field currently holds is replaced by the
/// Request Authenticator of the originating request for the digest.
pub fn calculate_response_authenticator(
    packet_bytes: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> [u8; 16] {
    digest_with_field(packet_bytes, request_authenticator, secret)
}

/// Calculate the computed Request Authenticator used by Accounting-Request,
/// Status-Server, CoA-Request and Disconnect-Request packets, over complete
/// encoded packet bytes
///
/// Request Authenticator = MD5(Code + ID + Length + 16 zero bytes + Attributes + Secret)
///
/// The authenticator field is treated as 16 zero bytes regardless of its
/// current contents.
pub fn calculate_request_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    digest_with_field(packet_bytes, &[0u8; 16], secret)
}

/// MD5 over the packet with the authenticator field replaced by `field`,
/// followed by the shared secret. `packet_bytes` must hold a complete packet
/// of at least 20 bytes.
fn digest_with_field(packet_bytes: &[u8], field: &[u8; 16], secret: &[u8]) -> [u8; 16] {
    let mut data = Vec::with_capacity(packet_bytes.len() + secret.len());
    data.extend_from_slice(&packet_bytes[..AUTHENTICATOR_OFFSET]);
    data.extend_from_slice(field);
    data.extend_from_slice(&packet_bytes[HEADER_LEN..]);
    data.extend_from_slice(secret);

    let digest = md5::compute(&data);
    let mut authenticator = [0u8; 16];
    authenticator.copy_from_slice(&digest.0);
    authenticator
}

/// Verify the Response Authenticator carried in encoded response bytes
/// against the Request Authenticator the client sent
pub fn verify_response_authenticator(
    packet_bytes: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    let calculated =
        calculate_response_authenticator(packet_bytes, request_authenticator, secret);
    packet_bytes[AUTHENTICATOR_OFFSET..HEADER_LEN] == calculated
}

/// Verify a computed Request Authenticator
/// (accounting/status/CoA/disconnect) carried in encoded request bytes
pub fn verify_request_authenticator(packet_bytes: &[u8], secret: &[u8]) -> bool {
    let calculated = calculate_request_authenticator(packet_bytes, secret);
    packet_bytes[AUTHENTICATOR_OFFSET..HEADER_LEN] == calculated
}

/// Hide a User-Password attribute value per RFC 2865 Section 5.2
///
/// The password is padded to a multiple of 16 bytes, then XORed with
/// MD5(secret + request_authenticator) for the first 16 bytes, and
/// MD5(secret + previous_ciphertext_block) for subsequent blocks.
pub fn encrypt_user_password(password: &[u8], secret: &[u8], authenticator: &[u8; 16]) -> Vec<u8> {
    let mut padded = password.to_vec();
    let padding_needed = (16 - (padded.len() % 16)) % 16;
    if padding_needed > 0 {
        padded.resize(padded.len() + padding_needed, 0);
    }
    if padded.is_empty() {
        padded.resize(16, 0);
    }

    let mut result = Vec::with_capacity(padded.len());
    let mut previous_block = authenticator.to_vec();

    for chunk in padded.chunks(16) {
        let mut data = Vec::new();
        data.extend_from_slice(secret);
        data.extend_from_slice(&previous_block);
        let hash = md5::compute(&data);

        let mut encrypted_block = [0u8; 16];
        for i in 0..16 {
            encrypted_block[i] = chunk[i] ^ hash.0[i];
        }

        previous_block = encrypted_block.to_vec();
        result.extend_from_slice(&encrypted_block);
    }

    result
}

/// Recover a User-Password attribute value per RFC 2865 Section 5.2
pub fn decrypt_user_password(
    encrypted: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, String> {
    if encrypted.len() % 16 != 0 || encrypted.is_empty() {
        return Err("Invalid encrypted password length".to_string());
    }

    let mut result = Vec::with_capacity(encrypted.len());
    let mut previous_block = authenticator.to_vec();

    for chunk in encrypted.chunks(16) {
        let mut data = Vec::new();
        data.extend_from_slice(secret);
        data.extend_from_slice(&previous_block);
        let hash = md5::compute(&data);

        let mut decrypted_block = [0u8; 16];
        for i in 0..16 {
            decrypted_block[i] = chunk[i] ^ hash.0[i];
        }

        previous_block = chunk.to_vec();
        result.extend_from_slice(&decrypted_block);
    }

    // Remove padding (null bytes at the end)
    while result.last() == Some(&0) {
        result.pop();
    }

    Ok(result)
}

/// Hide a Tunnel-Password attribute value per RFC 2868 Section 3.5
///
/// The plaintext is a 1-byte length prefix followed by the password, padded
/// to a multiple of 16 bytes. The first cipher block is keyed by
/// MD5(secret + request_authenticator + salt), subsequent blocks chain on the
/// previous ciphertext block. The wire value is tag + salt + ciphertext; the
/// high bit of the first salt byte must be set.
pub fn encrypt_tunnel_password(
    password: &[u8],
    tag: u8,
    secret: &[u8],
    authenticator: &[u8; 16],
    salt: [u8; 2],
) -> Vec<u8> {
    let mut plaintext = Vec::with_capacity(password.len() + 1);
    plaintext.push(password.len() as u8);
    plaintext.extend_from_slice(password);
    let padding_needed = (16 - (plaintext.len() % 16)) % 16;
    plaintext.resize(plaintext.len() + padding_needed, 0);

    let mut result = Vec::with_capacity(3 + plaintext.len());
    result.push(tag);
    result.extend_from_slice(&salt);

    let mut previous: Vec<u8> = {
        let mut first = authenticator.to_vec();
        first.extend_from_slice(&salt);
        first
    };

    for chunk in plaintext.chunks(16) {
        let mut data = Vec::new();
        data.extend_from_slice(secret);
        data.extend_from_slice(&previous);
        let hash = md5::compute(&data);

        let mut encrypted_block = [0u8; 16];
        for i in 0..16 {
            encrypted_block[i] = chunk[i] ^ hash.0[i];
        }

        previous = encrypted_block.to_vec();
        result.extend_from_slice(&encrypted_block);
    }

    result
}

/// Recover a Tunnel-Password attribute value per RFC 2868 Section 3.5
///
/// Returns the tag and the password bytes.
pub fn decrypt_tunnel_password(
    value: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<(u8, Vec<u8>), String> {
    if value.len() < 3 + 16 || (value.len() - 3) % 16 != 0 {
        return Err("Invalid encrypted tunnel password length".to_string());
    }

    let tag = value[0];
    let salt = &value[1..3];
    let ciphertext = &value[3..];

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    let mut previous: Vec<u8> = {
        let mut first = authenticator.to_vec();
        first.extend_from_slice(salt);
        first
    };

    for chunk in ciphertext.chunks(16) {
        let mut data = Vec::new();
        data.extend_from_slice(secret);
        data.extend_from_slice(&previous);
        let hash = md5::compute(&data);

        let mut decrypted_block = [0u8; 16];
        for i in 0..16 {
            decrypted_block[i] = chunk[i] ^ hash.0[i];
        }

        previous = chunk.to_vec();
        plaintext.extend_from_slice(&decrypted_block);
    }

    let declared_len = plaintext[0] as usize;
    if declared_len > plaintext.len() - 1 {
        return Err(format!(
            "Tunnel password length prefix {} exceeds plaintext",
            declared_len
        ));
    }

    Ok((tag, plaintext[1..1 + declared_len].to_vec()))
}
