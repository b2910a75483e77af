use crate::packet::PacketError;
use std::io::{Cursor, Read, Write};

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type (1 byte)
    pub attr_type: u8,
    /// Attribute value (0-253 bytes)
    pub value: Vec<u8>,
}

impl Attribute {
    /// Minimum attribute length (type + length fields = 2 bytes)
    pub const MIN_LENGTH: usize = 2;
    /// Maximum attribute length (255 bytes including type and length)
    pub const MAX_LENGTH: usize = 255;
    /// Maximum value length (253 bytes)
    pub const MAX_VALUE_LENGTH: usize = 253;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute value too long: {} bytes (max {})",
                value.len(),
                Self::MAX_VALUE_LENGTH
            )));
        }
        Ok(Attribute { attr_type, value })
    }

    /// Create a string attribute
    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, PacketError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    /// Create an integer attribute (32-bit big-endian)
    pub fn integer(attr_type: u8, value: u32) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_be_bytes().to_vec())
    }

    /// Create an IP address attribute
    pub fn ipv4(attr_type: u8, value: [u8; 4]) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_vec())
    }

    /// Create an IPv6 address attribute (RFC 3162)
    pub fn ipv6(attr_type: u8, value: [u8; 16]) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_vec())
    }

    /// Create a Vendor-Specific attribute (type 26) carrying a single
    /// sub-attribute (RFC 2865 Section 5.26)
    ///
    /// ```text
    /// +--------+--------+--------+--------+--------+--------+--------+--
    /// |  Type  | Length |            Vendor-Id              | Vendor |...
    /// |  (26)  |        |              (4 bytes)            |  type  |
    /// +--------+--------+--------+--------+--------+--------+--------+--
    /// ```
    pub fn vendor(vendor_id: u32, vendor_type: u8, data: Vec<u8>) -> Result<Self, PacketError> {
        // Sub-attribute length covers its own 2-byte header
        let sub_len = data.len() + 2;
        if sub_len > u8::MAX as usize {
            return Err(PacketError::AttributeError(format!(
                "Vendor sub-attribute too long: {} bytes",
                sub_len
            )));
        }

        let mut value = Vec::with_capacity(4 + sub_len);
        value.extend_from_slice(&vendor_id.to_be_bytes());
        value.push(vendor_type);
        value.push(sub_len as u8);
        value.extend_from_slice(&data);

        Self::new(super::AttributeType::VendorSpecific as u8, value)
    }

    /// Encode attribute to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Encoded attribute too long: {} bytes",
                length
            )));
        }

        let mut buffer = Vec::with_capacity(length);
        buffer.write_all(&[self.attr_type])?;
        buffer.write_all(&[length as u8])?;
        buffer.write_all(&self.value)?;

        Ok(buffer)
    }

    /// Decode attribute from bytes
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute data too short: {} bytes",
                data.len()
            )));
        }

        let mut cursor = Cursor::new(data);

        // Read type
        let mut type_buf = [0u8; 1];
        cursor.read_exact(&mut type_buf)?;
        let attr_type = type_buf[0];

        // Read length
        let mut len_buf = [0u8; 1];
        cursor.read_exact(&mut len_buf)?;
        let length = len_buf[0] as usize;

        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(PacketError::AttributeError(format!(
                "Invalid attribute length: {}",
                length
            )));
        }

        if data.len() < length {
            return Err(PacketError::AttributeError(format!(
                "Insufficient data for attribute: expected {}, got {}",
                length,
                data.len()
            )));
        }

        // Read value
        let value_length = length - Self::MIN_LENGTH;
        let mut value = vec![0u8; value_length];
        cursor.read_exact(&mut value)?;

        Ok(Attribute { attr_type, value })
    }

    /// Get the encoded length of this attribute
    pub fn encoded_length(&self) -> usize {
        Self::MIN_LENGTH + self.value.len()
    }

    /// Try to interpret value as a string
    pub fn as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.value.clone())
    }

    /// Try to interpret value as an integer (32-bit big-endian)
    pub fn as_integer(&self) -> Result<u32, PacketError> {
        if self.value.len() != 4 {
            return Err(PacketError::AttributeError(format!(
                "Expected 4 bytes for integer, got {}",
                self.value.len()
            )));
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.value);
        Ok(u32::from_be_bytes(bytes))
    }

    /// Try to interpret value as an IPv4 address
    pub fn as_ipv4(&self) -> Result<[u8; 4], PacketError> {
        if self.value.len() != 4 {
            return Err(PacketError::AttributeError(format!(
                "Expected 4 bytes for IPv4, got {}",
                self.value.len()
            )));
        }
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&self.value);
        Ok(addr)
    }

    /// Try to interpret value as an IPv6 address
    pub fn as_ipv6(&self) -> Result<[u8; 16], PacketError> {
        if self.value.len() != 16 {
            return Err(PacketError::AttributeError(format!(
                "Expected 16 bytes for IPv6, got {}",
                self.value.len()
            )));
        }
        let mut addr = [0u8; 16];
        addr.copy_from_slice(&self.value);
        Ok(addr)
    }

    /// Parse a Vendor-Specific attribute into its vendor id and
    /// (vendor_type, data) sub-attributes
    pub fn as_vendor(&self) -> Result<(u32, Vec<(u8, Vec<u8>)>), PacketError> {
        if self.value.len() < 4 {
            return Err(PacketError::AttributeError(format!(
                "Vendor-Specific attribute too short: {} bytes",
                self.value.len()
            )));
        }

        let mut vendor_id = [0u8; 4];
        vendor_id.copy_from_slice(&self.value[..4]);
        let vendor_id = u32::from_be_bytes(vendor_id);

        let mut subs = Vec::new();
        let mut rest = &self.value[4..];
        while !rest.is_empty() {
            if rest.len() < 2 {
                return Err(PacketError::AttributeError(
                    "Truncated vendor sub-attribute header".to_string(),
                ));
            }
            let sub_type = rest[0];
            let sub_len = rest[1] as usize;
            if sub_len < 2 || sub_len > rest.len() {
                return Err(PacketError::AttributeError(format!(
                    "Invalid vendor sub-attribute length: {}",
                    sub_len
                )));
            }
            subs.push((sub_type, rest[2..sub_len].to_vec()));
            rest = &rest[sub_len..];
        }

        Ok((vendor_id, subs))
    }
}
