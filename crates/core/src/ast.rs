//! Policy AST types.
//!
//! These types are the in-memory policy algebra consumed by the predicate
//! and policy compilers and produced (as field maps and actions) by the
//! classifier reconstructor.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Serialize, Serializer};

use crate::error::NetKatError;
use crate::headers::Header;

// ──────────────────────────────────────────────
// Header values
// ──────────────────────────────────────────────

/// A 48-bit Ethernet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Build from the low 48 bits of an integer. Larger values are rejected.
    pub fn from_u64(n: u64) -> Option<Self> {
        if n >> 48 != 0 {
            return None;
        }
        let b = n.to_be_bytes();
        Some(MacAddr([b[2], b[3], b[4], b[5], b[6], b[7]]))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for MacAddr {
    type Err = NetKatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mismatch = || NetKatError::TypeMismatch {
            expected: "MAC address",
            found: format!("\"{}\"", s),
        };
        let mut octets = [0u8; 6];
        let mut parts = s.split(|c: char| c == ':' || c == '-');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(mismatch)?;
            if part.is_empty() || part.len() > 2 {
                return Err(mismatch());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| mismatch())?;
        }
        if parts.next().is_some() {
            return Err(mismatch());
        }
        Ok(MacAddr(octets))
    }
}

/// A typed header value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderValue {
    Int(u64),
    Mac(MacAddr),
    Ip(Ipv4Addr),
}

impl HeaderValue {
    /// Short name of the value's kind, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            HeaderValue::Int(_) => "integer",
            HeaderValue::Mac(_) => "MAC address",
            HeaderValue::Ip(_) => "IP address",
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Int(n) => write!(f, "{}", n),
            HeaderValue::Mac(mac) => write!(f, "{}", mac),
            HeaderValue::Ip(ip) => write!(f, "{}", ip),
        }
    }
}

impl From<u64> for HeaderValue {
    fn from(n: u64) -> Self {
        HeaderValue::Int(n)
    }
}

impl From<MacAddr> for HeaderValue {
    fn from(mac: MacAddr) -> Self {
        HeaderValue::Mac(mac)
    }
}

impl From<Ipv4Addr> for HeaderValue {
    fn from(ip: Ipv4Addr) -> Self {
        HeaderValue::Ip(ip)
    }
}

impl Serialize for HeaderValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HeaderValue::Int(n) => serializer.serialize_u64(*n),
            other => serializer.collect_str(other),
        }
    }
}

/// Header to value map. Iterates in canonical header order.
pub type FieldMap = BTreeMap<Header, HeaderValue>;

/// Build a [`FieldMap`] from header names, rejecting unknown headers.
pub fn field_map<I, K, V>(pairs: I) -> Result<FieldMap, NetKatError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<HeaderValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| -> Result<(Header, HeaderValue), NetKatError> {
            Ok((k.as_ref().parse::<Header>()?, v.into()))
        })
        .collect()
}

// ──────────────────────────────────────────────
// Forward buckets
// ──────────────────────────────────────────────

static NEXT_BUCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle naming a bucket's pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketId(u64);

impl BucketId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque sink delivering packets to the controller through a named
/// pipe. The handle is fixed at construction; clones name the same pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardBucket {
    id: BucketId,
}

impl ForwardBucket {
    pub fn new() -> Self {
        ForwardBucket {
            id: BucketId(NEXT_BUCKET_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn id(&self) -> BucketId {
        self.id
    }
}

impl Default for ForwardBucket {
    fn default() -> Self {
        Self::new()
    }
}

// ──────────────────────────────────────────────
// Policies
// ──────────────────────────────────────────────

/// A policy in the network-policy algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// Pass packets whose headers equal every listed value.
    Match(FieldMap),
    Identity,
    Drop,
    /// Rewrite the listed headers.
    Modify(FieldMap),
    /// Complement of the first child. Further children are ignored.
    Negate(Vec<Policy>),
    Union(Vec<Policy>),
    /// Nondeterministic choice: every child sees a copy of the packet.
    Parallel(Vec<Policy>),
    Intersection(Vec<Policy>),
    /// Left-to-right composition.
    Sequential(Vec<Policy>),
    Conditional {
        pred: Box<Policy>,
        then: Box<Policy>,
        otherwise: Box<Policy>,
    },
    Forward(u64),
    ForwardBucket(ForwardBucket),
    IngressWrapper(Box<Policy>),
    EgressWrapper(Box<Policy>),
}

impl Policy {
    pub fn kind(&self) -> &'static str {
        match self {
            Policy::Match(_) => "match",
            Policy::Identity => "identity",
            Policy::Drop => "drop",
            Policy::Modify(_) => "modify",
            Policy::Negate(_) => "negate",
            Policy::Union(_) => "union",
            Policy::Parallel(_) => "parallel",
            Policy::Intersection(_) => "intersection",
            Policy::Sequential(_) => "sequential",
            Policy::Conditional { .. } => "if",
            Policy::Forward(_) => "fwd",
            Policy::ForwardBucket(_) => "bucket",
            Policy::IngressWrapper(_) => "ingress",
            Policy::EgressWrapper(_) => "egress",
        }
    }

    pub fn negate(child: Policy) -> Self {
        Policy::Negate(vec![child])
    }

    pub fn conditional(pred: Policy, then: Policy, otherwise: Policy) -> Self {
        Policy::Conditional {
            pred: Box::new(pred),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Moves this node's children onto `out`, leaving it a leaf.
    fn detach_children(&mut self, out: &mut Vec<Policy>) {
        match self {
            Policy::Negate(children)
            | Policy::Union(children)
            | Policy::Parallel(children)
            | Policy::Intersection(children)
            | Policy::Sequential(children) => out.append(children),
            Policy::Conditional {
                pred,
                then,
                otherwise,
            } => {
                for child in [pred, then, otherwise] {
                    out.push(std::mem::replace(&mut **child, Policy::Identity));
                }
            }
            Policy::IngressWrapper(inner) | Policy::EgressWrapper(inner) => {
                out.push(std::mem::replace(&mut **inner, Policy::Identity));
            }
            Policy::Match(_)
            | Policy::Identity
            | Policy::Drop
            | Policy::Modify(_)
            | Policy::Forward(_)
            | Policy::ForwardBucket(_) => {}
        }
    }
}

// Deep trees are torn down from a heap stack, not by recursive drop glue.
impl Drop for Policy {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut node) = stack.pop() {
            node.detach_children(&mut stack);
        }
    }
}
