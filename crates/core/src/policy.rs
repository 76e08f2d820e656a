//! Policy compiler: lowers any policy into a wire policy node and
//! serializes it as NetKAT JSON.
//!
//! Like the predicate compiler, traversal is driven by an explicit work
//! stack. Children are pushed in reverse so their compiled forms land on
//! the output stack in source order; a combinator task then pops its
//! arity worth of results.

use netkat_interchange::{Location, WireField, WireHeader, WirePolicy, WirePred, WireValue};

use crate::ast::{FieldMap, Policy};
use crate::error::NetKatError;
use crate::headers::{header_val, physical};
use crate::predicate::to_pred;

enum Task<'a> {
    Visit(&'a Policy),
    Union(usize),
    Seq(usize),
    /// Pops `otherwise` then `then` and wraps them with the guard.
    Branches(WirePred),
}

/// Compile a policy into a wire policy.
pub fn to_pol(policy: &Policy) -> Result<WirePolicy, NetKatError> {
    let mut tasks = vec![Task::Visit(policy)];
    let mut out: Vec<WirePolicy> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node) => match node {
                // Union is routed through the predicate compiler here, not
                // treated as parallel composition.
                Policy::Match(_) | Policy::Negate(_) | Policy::Union(_) | Policy::Intersection(_) => {
                    out.push(WirePolicy::filter(to_pred(node)?));
                }
                Policy::Identity => out.push(WirePolicy::filter(WirePred::True)),
                Policy::Drop => out.push(WirePolicy::filter(WirePred::False)),
                Policy::Modify(fields) => out.push(mod_to_pol(fields)?),
                Policy::Parallel(children) => {
                    tasks.push(Task::Union(children.len()));
                    tasks.extend(children.iter().rev().map(Task::Visit));
                }
                Policy::Sequential(children) => {
                    tasks.push(Task::Seq(children.len()));
                    tasks.extend(children.iter().rev().map(Task::Visit));
                }
                Policy::Forward(port) => out.push(WirePolicy::modify(WireField {
                    header: WireHeader::Location,
                    value: WireValue::Location(physical(*port)),
                })),
                Policy::Conditional {
                    pred,
                    then,
                    otherwise,
                } => {
                    tasks.push(Task::Branches(to_pred(pred)?));
                    tasks.push(Task::Visit(otherwise));
                    tasks.push(Task::Visit(then));
                }
                Policy::ForwardBucket(bucket) => out.push(WirePolicy::modify(WireField {
                    header: WireHeader::Location,
                    value: WireValue::Location(Location::Pipe {
                        name: bucket.id().to_string(),
                    }),
                })),
                Policy::IngressWrapper(inner) | Policy::EgressWrapper(inner) => {
                    tasks.push(Task::Visit(inner));
                }
            },
            Task::Union(n) => {
                let pols = out.split_off(out.len() - n);
                out.push(WirePolicy::Union { pols });
            }
            Task::Seq(n) => {
                let pols = out.split_off(out.len() - n);
                out.push(WirePolicy::Seq { pols });
            }
            Task::Branches(guard) => {
                let otherwise = out.pop().expect("else branch compiled before Branches");
                let then = out.pop().expect("then branch compiled before Branches");
                out.push(WirePolicy::Union {
                    pols: vec![
                        WirePolicy::Seq {
                            pols: vec![WirePolicy::filter(guard.clone()), then],
                        },
                        WirePolicy::Seq {
                            pols: vec![WirePolicy::filter(WirePred::neg(guard)), otherwise],
                        },
                    ],
                });
            }
        }
    }

    debug_assert_eq!(out.len(), 1);
    Ok(out.pop().expect("work stack leaves exactly one policy"))
}

/// `seq` of one `mod` per field. Fields come out in canonical header
/// order, not the order they were inserted.
pub fn mod_to_pol(fields: &FieldMap) -> Result<WirePolicy, NetKatError> {
    let pols = fields
        .iter()
        .map(|(h, v)| header_val(*h, v).map(WirePolicy::modify))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WirePolicy::Seq { pols })
}

/// Compile a policy to a compact NetKAT JSON string.
pub fn compile_to_netkat(policy: &Policy) -> Result<String, NetKatError> {
    compile_with(policy, WirePolicy::to_json_string)
}

/// Like [`compile_to_netkat`], indented for reading.
pub fn compile_to_netkat_pretty(policy: &Policy) -> Result<String, NetKatError> {
    compile_with(policy, WirePolicy::to_json_string_pretty)
}

fn compile_with(
    policy: &Policy,
    write: fn(&WirePolicy) -> Result<String, serde_json::Error>,
) -> Result<String, NetKatError> {
    let compiled = to_pol(policy)?;
    tracing::debug!(
        root = policy.kind(),
        nodes = compiled.node_count(),
        "compiled policy to NetKAT"
    );
    Ok(write(&compiled)?)
}
