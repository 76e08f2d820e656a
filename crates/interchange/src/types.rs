//! Typed structs for the two JSON shapes exchanged with the NetKAT backend.
//!
//! The wire predicate/policy nodes are what the compiler emits. The
//! flow-table records are what the backend hands back after compiling a
//! policy down to per-switch tables.

use serde::{Deserialize, Serialize};

// ── Wire headers and values ─────────────────────────────────────────

/// Header names understood by the NetKAT backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireHeader {
    Switch,
    Location,
    EthSrc,
    EthDst,
    Vlan,
    VlanPcp,
    EthType,
    InProto,
    Ip4Src,
    Ip4Dst,
    TcpSrcPort,
    TcpDstPort,
}

impl WireHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireHeader::Switch => "switch",
            WireHeader::Location => "location",
            WireHeader::EthSrc => "ethsrc",
            WireHeader::EthDst => "ethdst",
            WireHeader::Vlan => "vlan",
            WireHeader::VlanPcp => "vlanpcp",
            WireHeader::EthType => "ethtype",
            WireHeader::InProto => "inproto",
            WireHeader::Ip4Src => "ip4src",
            WireHeader::Ip4Dst => "ip4dst",
            WireHeader::TcpSrcPort => "tcpsrcport",
            WireHeader::TcpDstPort => "tcpdstport",
        }
    }
}

/// An IP address with its prefix length. The compiler always emits /32.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMask {
    pub addr: String,
    pub mask: u8,
}

/// A packet location: a physical switch port or a named pipe to the
/// controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Location {
    Physical { port: u64 },
    Pipe { name: String },
}

/// A header value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Int(u64),
    /// Stringified MAC address.
    Text(String),
    Ip(IpMask),
    Location(Location),
}

/// One `(header, value)` pair, the unit both `test` and `mod` nodes carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireField {
    pub header: WireHeader,
    pub value: WireValue,
}

// ── Predicates ──────────────────────────────────────────────────────

/// A wire predicate node, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WirePred {
    Test { header: WireHeader, value: WireValue },
    True,
    False,
    Neg { pred: Box<WirePred> },
    And { preds: Vec<WirePred> },
    Or { preds: Vec<WirePred> },
}

impl WirePred {
    pub fn test(field: WireField) -> Self {
        WirePred::Test {
            header: field.header,
            value: field.value,
        }
    }

    pub fn neg(pred: WirePred) -> Self {
        WirePred::Neg {
            pred: Box::new(pred),
        }
    }

    /// Moves this node's children onto `out`, leaving it a leaf.
    fn detach_children(&mut self, out: &mut Vec<WirePred>) {
        match self {
            WirePred::Neg { pred } => out.push(std::mem::replace(&mut **pred, WirePred::True)),
            WirePred::And { preds } | WirePred::Or { preds } => out.append(preds),
            WirePred::Test { .. } | WirePred::True | WirePred::False => {}
        }
    }
}

// Deep chains are torn down from a heap stack, not by recursive drop glue.
impl Drop for WirePred {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut pred) = stack.pop() {
            pred.detach_children(&mut stack);
        }
    }
}

// ── Policies ────────────────────────────────────────────────────────

/// A wire policy node, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WirePolicy {
    Filter { pred: WirePred },
    Mod { header: WireHeader, value: WireValue },
    Union { pols: Vec<WirePolicy> },
    /// Union of policies known to act on disjoint packet sets. Accepted by
    /// the backend; the compiler does not currently emit it.
    Disjoint { pols: Vec<WirePolicy> },
    Seq { pols: Vec<WirePolicy> },
}

impl WirePolicy {
    pub fn filter(pred: WirePred) -> Self {
        WirePolicy::Filter { pred }
    }

    pub fn modify(field: WireField) -> Self {
        WirePolicy::Mod {
            header: field.header,
            value: field.value,
        }
    }

    /// Total number of policy nodes in this tree (predicates not counted).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(pol) = stack.pop() {
            count += 1;
            match pol {
                WirePolicy::Union { pols }
                | WirePolicy::Disjoint { pols }
                | WirePolicy::Seq { pols } => stack.extend(pols.iter()),
                WirePolicy::Filter { .. } | WirePolicy::Mod { .. } => {}
            }
        }
        count
    }
}

impl WirePolicy {
    fn detach_children(&mut self, out: &mut Vec<WirePolicy>) {
        match self {
            WirePolicy::Union { pols } | WirePolicy::Disjoint { pols } | WirePolicy::Seq { pols } => {
                out.append(pols)
            }
            WirePolicy::Filter { .. } | WirePolicy::Mod { .. } => {}
        }
    }
}

impl Drop for WirePolicy {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.detach_children(&mut stack);
        while let Some(mut pol) = stack.pop() {
            pol.detach_children(&mut stack);
        }
    }
}

// ── Flow tables ─────────────────────────────────────────────────────

/// The compiled flow table of a single switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchTable {
    pub switch_id: u64,
    /// Rules in the order they appeared in the JSON.
    pub rules: Vec<FlowRule>,
}

/// One `{priority, pattern, action}` record of a switch table.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRule {
    pub priority: i64,
    /// Vendor field name to value. Absent fields arrive as `null` and are
    /// kept so callers can tell "wildcard" from "missing".
    pub pattern: serde_json::Map<String, serde_json::Value>,
    /// Alternative action lists; each inner list is applied as a group.
    pub actions: Vec<Vec<FlowAction>>,
}

/// A single decoded action entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowAction {
    /// Header rewrite. `field` is the vendor field name (`dlSrc`, `tpDst`,
    /// ...) recovered from the `Set<Field>` action name.
    Modify {
        field: String,
        value: serde_json::Value,
    },
    Output(OutputTarget),
}

/// Where an `Output` action sends the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    Physical { port: u64 },
    Controller,
}
