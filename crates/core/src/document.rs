//! JSON policy documents.
//!
//! A document is a tree of objects tagged by `"kind"`:
//!
//! ```json
//! {"kind": "if",
//!  "pred": {"kind": "match", "fields": {"srcip": "10.0.0.1"}},
//!  "then": {"kind": "fwd", "outport": 1},
//!  "else": {"kind": "drop"}}
//! ```
//!
//! Nesting depth is bounded by serde_json's recursion limit, so the
//! recursive conversion below stays shallow.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ast::{FieldMap, ForwardBucket, Policy};
use crate::error::NetKatError;
use crate::headers::{value_from_json, Header};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PolicyDoc {
    Match {
        fields: serde_json::Map<String, serde_json::Value>,
    },
    Identity,
    Drop,
    Modify {
        fields: serde_json::Map<String, serde_json::Value>,
    },
    Negate {
        policy: Box<PolicyDoc>,
    },
    Union {
        policies: Vec<PolicyDoc>,
    },
    Parallel {
        policies: Vec<PolicyDoc>,
    },
    Intersection {
        policies: Vec<PolicyDoc>,
    },
    Sequential {
        policies: Vec<PolicyDoc>,
    },
    If {
        pred: Box<PolicyDoc>,
        then: Box<PolicyDoc>,
        #[serde(rename = "else")]
        otherwise: Box<PolicyDoc>,
    },
    Fwd {
        outport: u64,
    },
    Bucket {
        #[serde(default)]
        name: Option<String>,
    },
    Ingress {
        policy: Box<PolicyDoc>,
    },
    Egress {
        policy: Box<PolicyDoc>,
    },
}

/// Named buckets seen so far in one document.
type Buckets = HashMap<String, ForwardBucket>;

/// Parse a policy document from JSON text.
pub fn parse_policy(text: &str) -> Result<Policy, NetKatError> {
    let doc: PolicyDoc =
        serde_json::from_str(text).map_err(|e| NetKatError::Document(e.to_string()))?;
    convert(doc, &mut Buckets::new())
}

/// Build a policy from an already-parsed JSON value.
pub fn policy_from_value(value: serde_json::Value) -> Result<Policy, NetKatError> {
    let doc: PolicyDoc =
        serde_json::from_value(value).map_err(|e| NetKatError::Document(e.to_string()))?;
    convert(doc, &mut Buckets::new())
}

fn convert(doc: PolicyDoc, buckets: &mut Buckets) -> Result<Policy, NetKatError> {
    let policy = match doc {
        PolicyDoc::Match { fields } => Policy::Match(convert_fields(fields)?),
        PolicyDoc::Identity => Policy::Identity,
        PolicyDoc::Drop => Policy::Drop,
        PolicyDoc::Modify { fields } => Policy::Modify(convert_fields(fields)?),
        PolicyDoc::Negate { policy } => Policy::negate(convert(*policy, buckets)?),
        PolicyDoc::Union { policies } => Policy::Union(convert_all(policies, buckets)?),
        PolicyDoc::Parallel { policies } => Policy::Parallel(convert_all(policies, buckets)?),
        PolicyDoc::Intersection { policies } => {
            Policy::Intersection(convert_all(policies, buckets)?)
        }
        PolicyDoc::Sequential { policies } => Policy::Sequential(convert_all(policies, buckets)?),
        PolicyDoc::If {
            pred,
            then,
            otherwise,
        } => Policy::conditional(
            convert(*pred, buckets)?,
            convert(*then, buckets)?,
            convert(*otherwise, buckets)?,
        ),
        PolicyDoc::Fwd { outport } => Policy::Forward(outport),
        PolicyDoc::Bucket { name: Some(name) } => {
            Policy::ForwardBucket(buckets.entry(name).or_default().clone())
        }
        PolicyDoc::Bucket { name: None } => Policy::ForwardBucket(ForwardBucket::new()),
        PolicyDoc::Ingress { policy } => Policy::IngressWrapper(Box::new(convert(*policy, buckets)?)),
        PolicyDoc::Egress { policy } => Policy::EgressWrapper(Box::new(convert(*policy, buckets)?)),
    };
    Ok(policy)
}

fn convert_all(docs: Vec<PolicyDoc>, buckets: &mut Buckets) -> Result<Vec<Policy>, NetKatError> {
    docs.into_iter().map(|d| convert(d, buckets)).collect()
}

fn convert_fields(
    fields: serde_json::Map<String, serde_json::Value>,
) -> Result<FieldMap, NetKatError> {
    let mut map = FieldMap::new();
    for (name, value) in fields {
        let header: Header = name.parse()?;
        map.insert(header, value_from_json(header, &value)?);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{field_map, HeaderValue, MacAddr};
    use serde_json::json;

    #[test]
    fn test_parse_conditional() {
        let pol = parse_policy(
            r#"{"kind": "if",
                "pred": {"kind": "match", "fields": {"srcip": "10.0.0.1"}},
                "then": {"kind": "fwd", "outport": 1},
                "else": {"kind": "drop"}}"#,
        )
        .unwrap();
        let expected = Policy::conditional(
            Policy::Match(
                field_map([("srcip", HeaderValue::Ip("10.0.0.1".parse().unwrap()))]).unwrap(),
            ),
            Policy::Forward(1),
            Policy::Drop,
        );
        assert_eq!(pol, expected);
    }

    #[test]
    fn test_parse_combinators() {
        let pol = policy_from_value(json!({
            "kind": "sequential",
            "policies": [
                { "kind": "union", "policies": [ { "kind": "identity" } ] },
                { "kind": "parallel", "policies": [] },
                { "kind": "intersection", "policies": [ { "kind": "drop" } ] },
                { "kind": "negate", "policy": { "kind": "identity" } },
                { "kind": "ingress", "policy": { "kind": "egress", "policy": { "kind": "drop" } } },
                { "kind": "modify", "fields": { "dstmac": "00:00:00:00:00:05", "outport": 2 } }
            ]
        }))
        .unwrap();
        let Policy::Sequential(children) = &pol else {
            panic!("expected sequential");
        };
        assert_eq!(children[0], Policy::Union(vec![Policy::Identity]));
        assert_eq!(children[1], Policy::Parallel(vec![]));
        assert_eq!(children[2], Policy::Intersection(vec![Policy::Drop]));
        assert_eq!(children[3], Policy::negate(Policy::Identity));
        assert_eq!(
            children[4],
            Policy::IngressWrapper(Box::new(Policy::EgressWrapper(Box::new(Policy::Drop))))
        );
        let mut fields = FieldMap::new();
        fields.insert(Header::Dstmac, HeaderValue::Mac(MacAddr([0, 0, 0, 0, 0, 5])));
        fields.insert(Header::Outport, HeaderValue::Int(2));
        assert_eq!(children[5], Policy::Modify(fields));
    }

    #[test]
    fn test_named_buckets_share_handle() {
        let pol = policy_from_value(json!({
            "kind": "parallel",
            "policies": [
                { "kind": "bucket", "name": "q" },
                { "kind": "bucket", "name": "q" },
                { "kind": "bucket" }
            ]
        }))
        .unwrap();
        let Policy::Parallel(children) = &pol else {
            panic!("expected parallel");
        };
        let ids: Vec<_> = children
            .iter()
            .map(|c| match c {
                Policy::ForwardBucket(b) => b.id(),
                other => panic!("expected bucket, got {:?}", other),
            })
            .collect();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn test_unknown_kind_is_document_error() {
        match parse_policy(r#"{"kind": "query"}"#) {
            Err(NetKatError::Document(msg)) => assert!(msg.contains("query"), "got: {}", msg),
            other => panic!("expected Document, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_header_in_document() {
        match parse_policy(r#"{"kind": "match", "fields": {"tos": 1}}"#) {
            Err(NetKatError::UnsupportedHeader { header }) => assert_eq!(header, "tos"),
            other => panic!("expected UnsupportedHeader, got {:?}", other),
        }
    }

    #[test]
    fn test_ipv6_address_rejected() {
        match parse_policy(r#"{"kind": "match", "fields": {"dstip": "::1"}}"#) {
            Err(NetKatError::TypeMismatch { expected, .. }) => assert_eq!(expected, "IP address"),
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_value_in_document() {
        assert!(matches!(
            parse_policy(r#"{"kind": "match", "fields": {"srcmac": "nope"}}"#),
            Err(NetKatError::TypeMismatch { .. })
        ));
    }
}
