//! Header/value mapping between the policy algebra and the wire formats.
//!
//! Two static tables live here:
//!
//! - canonical header → NetKAT wire header (used by the compilers), and
//! - vendor field ↔ canonical header (used when reading flow tables).
//!
//! Both are compiled-in data versioned by [`HEADER_TABLE_VERSION`].

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use netkat_interchange::{IpMask, Location, WireField, WireHeader, WireValue};
use serde::{Serialize, Serializer};

use crate::ast::{HeaderValue, MacAddr};
use crate::error::NetKatError;

/// Bumped whenever either header table changes.
pub const HEADER_TABLE_VERSION: &str = "1";

/// Canonical packet headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Header {
    Switch,
    Inport,
    Outport,
    Srcmac,
    Dstmac,
    VlanId,
    VlanPcp,
    Ethtype,
    Protocol,
    Srcip,
    Dstip,
    Srcport,
    Dstport,
}

/// The value kind a header carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Mac,
    Ip,
}

impl ValueKind {
    fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "integer",
            ValueKind::Mac => "MAC address",
            ValueKind::Ip => "IP address",
        }
    }
}

/// Every canonical header, in canonical order.
pub const ALL_HEADERS: [Header; 13] = [
    Header::Switch,
    Header::Inport,
    Header::Outport,
    Header::Srcmac,
    Header::Dstmac,
    Header::VlanId,
    Header::VlanPcp,
    Header::Ethtype,
    Header::Protocol,
    Header::Srcip,
    Header::Dstip,
    Header::Srcport,
    Header::Dstport,
];

/// Vendor (flow-table) field names and the canonical header each denotes.
/// Both lookup directions are derived from this one table.
pub static VENDOR_FIELDS: [(&str, Header); 11] = [
    ("dlSrc", Header::Srcmac),
    ("dlDst", Header::Dstmac),
    ("dlTyp", Header::Ethtype),
    ("dlVlan", Header::VlanId),
    ("dlVlanPcp", Header::VlanPcp),
    ("nwSrc", Header::Srcip),
    ("nwDst", Header::Dstip),
    ("nwProto", Header::Protocol),
    ("tpSrc", Header::Srcport),
    ("tpDst", Header::Dstport),
    ("inPort", Header::Inport),
];

impl Header {
    pub fn as_str(self) -> &'static str {
        match self {
            Header::Switch => "switch",
            Header::Inport => "inport",
            Header::Outport => "outport",
            Header::Srcmac => "srcmac",
            Header::Dstmac => "dstmac",
            Header::VlanId => "vlan_id",
            Header::VlanPcp => "vlan_pcp",
            Header::Ethtype => "ethtype",
            Header::Protocol => "protocol",
            Header::Srcip => "srcip",
            Header::Dstip => "dstip",
            Header::Srcport => "srcport",
            Header::Dstport => "dstport",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Header::Srcmac | Header::Dstmac => ValueKind::Mac,
            Header::Srcip | Header::Dstip => ValueKind::Ip,
            _ => ValueKind::Int,
        }
    }

    /// The NetKAT header this canonical header is written as.
    pub fn wire_header(self) -> WireHeader {
        match self {
            Header::Switch => WireHeader::Switch,
            Header::Inport | Header::Outport => WireHeader::Location,
            Header::Srcmac => WireHeader::EthSrc,
            Header::Dstmac => WireHeader::EthDst,
            Header::VlanId => WireHeader::Vlan,
            Header::VlanPcp => WireHeader::VlanPcp,
            Header::Ethtype => WireHeader::EthType,
            Header::Protocol => WireHeader::InProto,
            Header::Srcip => WireHeader::Ip4Src,
            Header::Dstip => WireHeader::Ip4Dst,
            Header::Srcport => WireHeader::TcpSrcPort,
            Header::Dstport => WireHeader::TcpDstPort,
        }
    }

    /// Vendor field name, if the header appears in flow-table patterns.
    pub fn vendor_name(self) -> Option<&'static str> {
        VENDOR_FIELDS
            .iter()
            .find(|(_, h)| *h == self)
            .map(|(name, _)| *name)
    }

    pub fn from_vendor(name: &str) -> Option<Header> {
        VENDOR_FIELDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, h)| *h)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Header {
    type Err = NetKatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_HEADERS
            .iter()
            .copied()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| NetKatError::UnsupportedHeader {
                header: s.to_string(),
            })
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ── Value mapping ───────────────────────────────────────────────────

/// Map a canonical header and value to its wire `(header, value)` pair.
pub fn header_val(header: Header, value: &HeaderValue) -> Result<WireField, NetKatError> {
    let wire = match header {
        Header::Inport | Header::Outport => WireValue::Location(physical(int_value(value)?)),
        Header::Srcmac | Header::Dstmac => WireValue::Text(unethaddr(value)?),
        Header::Srcip | Header::Dstip => WireValue::Ip(unip(value)?),
        Header::Switch
        | Header::VlanId
        | Header::VlanPcp
        | Header::Ethtype
        | Header::Protocol
        | Header::Srcport
        | Header::Dstport => WireValue::Int(int_value(value)?),
    };
    Ok(WireField {
        header: header.wire_header(),
        value: wire,
    })
}

/// Host address with a /32 mask.
pub fn unip(value: &HeaderValue) -> Result<IpMask, NetKatError> {
    match value {
        HeaderValue::Ip(ip) => Ok(IpMask {
            addr: ip.to_string(),
            mask: 32,
        }),
        other => Err(mismatch(ValueKind::Ip, other)),
    }
}

pub fn unethaddr(value: &HeaderValue) -> Result<String, NetKatError> {
    match value {
        HeaderValue::Mac(mac) => Ok(mac.to_string()),
        other => Err(mismatch(ValueKind::Mac, other)),
    }
}

pub fn physical(port: u64) -> Location {
    Location::Physical { port }
}

fn int_value(value: &HeaderValue) -> Result<u64, NetKatError> {
    match value {
        HeaderValue::Int(n) => Ok(*n),
        other => Err(mismatch(ValueKind::Int, other)),
    }
}

fn mismatch(expected: ValueKind, found: &HeaderValue) -> NetKatError {
    NetKatError::TypeMismatch {
        expected: expected.name(),
        found: format!("{} {}", found.kind(), found),
    }
}

/// Read a JSON value as a typed value for `header`.
///
/// MAC headers accept `"aa:bb:cc:dd:ee:ff"` strings or 48-bit integers;
/// IP headers accept dotted IPv4 strings or 32-bit integers; everything else
/// takes a non-negative integer.
pub fn value_from_json(header: Header, value: &serde_json::Value) -> Result<HeaderValue, NetKatError> {
    let kind = header.value_kind();
    let converted = match (kind, value) {
        (ValueKind::Int, serde_json::Value::Number(n)) => n.as_u64().map(HeaderValue::Int),
        (ValueKind::Mac, serde_json::Value::Number(n)) => {
            n.as_u64().and_then(MacAddr::from_u64).map(HeaderValue::Mac)
        }
        (ValueKind::Mac, serde_json::Value::String(s)) => Some(HeaderValue::Mac(s.parse()?)),
        (ValueKind::Ip, serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(|n| HeaderValue::Ip(Ipv4Addr::from(n))),
        (ValueKind::Ip, serde_json::Value::String(s)) => {
            s.parse::<Ipv4Addr>().ok().map(HeaderValue::Ip)
        }
        _ => None,
    };
    converted.ok_or_else(|| NetKatError::TypeMismatch {
        expected: kind.name(),
        found: format!("{} for {}", value, header),
    })
}
