//! netkat-interchange: NetKAT wire JSON types and flow-table deserialization.
//!
//! Provides typed structs for the predicate and policy nodes the compiler
//! emits, and a single `from_flow_table()` entry point that deserializes a
//! backend's compiled per-switch flow tables into typed records. Wire
//! policies write themselves out as JSON text with
//! `WirePolicy::to_json_string()`, which handles arbitrarily deep trees.
//!
//! This crate knows the JSON shapes only. Mapping between canonical packet
//! headers and wire or vendor names lives in netkat-core.

pub mod deserialize;
mod emit;
pub mod types;

pub use deserialize::{from_flow_table, vendor_field_from_setter, InterchangeError};
pub use types::*;
