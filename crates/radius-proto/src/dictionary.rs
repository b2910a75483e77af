//! Attribute dictionary interface
//!
//! The codec looks every attribute up here to pick the value codec used for
//! validation and for on-the-wire hiding of encrypted values. The dictionary
//! itself is loaded elsewhere; this crate only consumes it as a read-only
//! lookup. Unknown attribute types fall back to [`ValueKind::Binary`] and are
//! carried as opaque byte strings.

use crate::attributes::AttributeType;

/// Wire representation of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Opaque byte string (also the fallback for unknown types)
    Binary,
    /// UTF-8 text
    Text,
    /// 32-bit big-endian unsigned integer
    Integer,
    /// 32-bit integer restricted to an enumerated value set
    Enum,
    /// 32-bit big-endian seconds since the Unix epoch
    Time,
    /// 4-byte IPv4 address
    Ipv4,
    /// 16-byte IPv6 address
    Ipv6,
    /// 8-byte interface identifier (RFC 3162)
    InterfaceId,
    /// Tagged value (RFC 2868): 1-byte tag followed by the value
    Tagged,
    /// Hidden with MD5 block chaining keyed by the shared secret
    /// (User-Password, RFC 2865 Section 5.2)
    EncryptedText,
    /// Tagged and salt-hidden (Tunnel-Password, RFC 2868 Section 3.5)
    EncryptedTagged,
    /// Vendor-specific container (type 26)
    VendorSpecific,
}

/// Read-only attribute metadata lookup
pub trait Dictionary: Send + Sync {
    /// Value codec for a top-level attribute type
    fn attribute_kind(&self, attr_type: u8) -> ValueKind;

    /// Value codec for a sub-attribute inside a Vendor-Specific container
    fn vendor_attribute_kind(&self, vendor_id: u32, vendor_type: u8) -> ValueKind;
}

/// Dictionary covering the standard RFC 2865/2866/2868/2869/3162 registry
#[derive(Debug, Default)]
pub struct StandardDictionary;

impl Dictionary for StandardDictionary {
    fn attribute_kind(&self, attr_type: u8) -> ValueKind {
        use AttributeType::*;

        let Some(known) = AttributeType::from_u8(attr_type) else {
            return ValueKind::Binary;
        };

        match known {
            UserName | FilterId | ReplyMessage | CallbackNumber | CallbackId | FramedRoute
            | CalledStationId | CallingStationId | NasIdentifier | LoginLatService
            | LoginLatNode | LoginLatGroup | FramedAppleTalkZone | AcctSessionId
            | AcctMultiSessionId | LoginLatPort => ValueKind::Text,

            UserPassword => ValueKind::EncryptedText,
            TunnelPassword => ValueKind::EncryptedTagged,
            TunnelType | TunnelMediumType => ValueKind::Tagged,

            ServiceType | FramedProtocol | FramedRouting | FramedCompression | LoginService
            | TerminationAction | NasPortType | AcctStatusType | AcctAuthentic
            | AcctTerminateCause => ValueKind::Enum,

            NasPort | LoginTcpPort | FramedMtu | SessionTimeout | IdleTimeout
            | FramedIpxNetwork | FramedAppleTalkLink | FramedAppleTalkNetwork | PortLimit
            | AcctDelayTime | AcctInputOctets | AcctOutputOctets | AcctSessionTime
            | AcctInputPackets | AcctOutputPackets | AcctLinkCount | AcctInputGigawords
            | AcctOutputGigawords => ValueKind::Integer,

            EventTimestamp => ValueKind::Time,

            NasIpAddress | FramedIpAddress | FramedIpNetmask | LoginIpHost => ValueKind::Ipv4,

            NasIpv6Address | LoginIpv6Host => ValueKind::Ipv6,

            FramedInterfaceId => ValueKind::InterfaceId,

            VendorSpecific => ValueKind::VendorSpecific,

            ChapPassword | ChapChallenge | State | Class | ProxyState | EapMessage
            | MessageAuthenticator => ValueKind::Binary,
        }
    }

    fn vendor_attribute_kind(&self, _vendor_id: u32, _vendor_type: u8) -> ValueKind {
        ValueKind::Binary
    }
}
