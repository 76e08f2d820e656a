//! Predicate compiler: lowers the predicate subset of the policy algebra
//! (`match`, `identity`, `drop`, `negate`, `union`, `parallel`,
//! `intersection`) into wire predicate nodes.
//!
//! Traversal uses an explicit work stack, so nesting depth is limited by
//! heap rather than by the call stack.

use netkat_interchange::WirePred;

use crate::ast::{FieldMap, Policy};
use crate::error::NetKatError;
use crate::headers::header_val;

enum Task<'a> {
    Visit(&'a Policy),
    Neg,
    And(usize),
    Or(usize),
}

/// Compile a predicate-subset policy into a wire predicate.
pub fn to_pred(policy: &Policy) -> Result<WirePred, NetKatError> {
    let mut tasks = vec![Task::Visit(policy)];
    let mut out: Vec<WirePred> = Vec::new();

    while let Some(task) = tasks.pop() {
        match task {
            Task::Visit(node) => match node {
                Policy::Match(fields) => out.push(match_to_pred(fields)?),
                Policy::Identity => out.push(WirePred::True),
                Policy::Drop => out.push(WirePred::False),
                Policy::Negate(children) => {
                    // Only the first child is negated.
                    let child = children
                        .first()
                        .ok_or_else(|| NetKatError::UnsupportedPredicate(Box::new(node.clone())))?;
                    tasks.push(Task::Neg);
                    tasks.push(Task::Visit(child));
                }
                Policy::Union(children) | Policy::Parallel(children) => {
                    tasks.push(Task::Or(children.len()));
                    tasks.extend(children.iter().rev().map(Task::Visit));
                }
                Policy::Intersection(children) => {
                    tasks.push(Task::And(children.len()));
                    tasks.extend(children.iter().rev().map(Task::Visit));
                }
                Policy::Modify(_)
                | Policy::Sequential(_)
                | Policy::Conditional { .. }
                | Policy::Forward(_)
                | Policy::ForwardBucket(_)
                | Policy::IngressWrapper(_)
                | Policy::EgressWrapper(_) => {
                    return Err(NetKatError::UnsupportedPredicate(Box::new(node.clone())));
                }
            },
            Task::Neg => {
                let pred = out.pop().expect("negated child compiled before Neg");
                out.push(WirePred::neg(pred));
            }
            Task::And(n) => {
                let preds = out.split_off(out.len() - n);
                out.push(WirePred::And { preds });
            }
            Task::Or(n) => {
                let preds = out.split_off(out.len() - n);
                out.push(WirePred::Or { preds });
            }
        }
    }

    debug_assert_eq!(out.len(), 1);
    Ok(out.pop().expect("work stack leaves exactly one predicate"))
}

/// `and` of one `test` per field. Fields come out in canonical header
/// order, not the order they were inserted.
pub fn match_to_pred(fields: &FieldMap) -> Result<WirePred, NetKatError> {
    let preds = fields
        .iter()
        .map(|(h, v)| header_val(*h, v).map(WirePred::test))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WirePred::And { preds })
}
