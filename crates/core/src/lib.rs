//! netkat-core: policy algebra to NetKAT compiler, and the reverse path
//! from compiled flow tables to classifiers.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`compile_to_netkat()`] -- compile a policy tree to NetKAT JSON
//! - [`to_pol()`] / [`to_pred()`] -- compile to typed wire nodes
//! - [`json_to_classifier()`] -- rebuild a [`Classifier`] from flow-table JSON
//! - [`parse_policy()`] -- read a policy tree from a JSON document
//! - [`NetKatError`] -- the error type for all of the above
//! - AST types: [`Policy`], [`FieldMap`], [`HeaderValue`], [`MacAddr`],
//!   [`ForwardBucket`], [`Header`]

pub mod ast;
pub mod classifier;
pub mod document;
pub mod error;
pub mod headers;
pub mod policy;
pub mod predicate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{field_map, BucketId, FieldMap, ForwardBucket, HeaderValue, MacAddr, Policy};
pub use classifier::{Action, Classifier, Rule};
pub use error::NetKatError;
pub use headers::{Header, HEADER_TABLE_VERSION};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use classifier::{classifier_from_str, json_to_classifier};
pub use document::{parse_policy, policy_from_value};
pub use headers::{header_val, physical, unethaddr, unip};
pub use policy::{compile_to_netkat, compile_to_netkat_pretty, to_pol};
pub use predicate::to_pred;
