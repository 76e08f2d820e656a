//! Classifier reconstruction from compiled flow-table JSON.
//!
//! Each switch table becomes a run of [`Rule`]s ordered by descending
//! priority. Switch runs are concatenated in document order.

use std::collections::BTreeSet;
use std::fmt;

use netkat_interchange::{from_flow_table, FlowAction, FlowRule, OutputTarget};
use serde::Serialize;

use crate::ast::{FieldMap, HeaderValue};
use crate::error::NetKatError;
use crate::headers::{value_from_json, Header};

/// One member of a rule's action set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Rewrite headers; an `outport` entry forwards out of that port.
    Modify(FieldMap),
    /// Send the packet to the controller.
    Controller,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Modify(fields) => {
                write!(f, "modify(")?;
                write_fields(f, fields)?;
                write!(f, ")")
            }
            Action::Controller => write!(f, "controller"),
        }
    }
}

/// A match pattern and the actions applied to packets it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub pattern: FieldMap,
    pub actions: BTreeSet<Action>,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(f, &self.pattern)?;
        write!(f, " -> ")?;
        if self.actions.is_empty() {
            return write!(f, "drop");
        }
        for (i, action) in self.actions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", action)?;
        }
        Ok(())
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &FieldMap) -> fmt::Result {
    for (i, (h, v)) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", h, v)?;
    }
    Ok(())
}

/// Rules in first-match-wins order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Classifier { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}

impl<'a> IntoIterator for &'a Classifier {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Rebuild a classifier from a flow-table JSON document.
pub fn json_to_classifier(doc: &serde_json::Value) -> Result<Classifier, NetKatError> {
    let tables = from_flow_table(doc)?;

    let mut rules = Vec::new();
    for table in &tables {
        let mut prioritized = Vec::with_capacity(table.rules.len());
        for flow in &table.rules {
            let rule = Rule {
                pattern: create_match(table.switch_id, flow)?,
                actions: create_actions(table.switch_id, flow)?,
            };
            prioritized.push((flow.priority, rule));
        }
        // Stable: equal priorities keep document order.
        prioritized.sort_by(|a, b| b.0.cmp(&a.0));
        rules.extend(prioritized.into_iter().map(|(_, rule)| rule));
    }

    tracing::debug!(
        switches = tables.len(),
        rules = rules.len(),
        "reconstructed classifier"
    );
    Ok(Classifier::new(rules))
}

/// Parse flow-table JSON text and rebuild its classifier.
pub fn classifier_from_str(text: &str) -> Result<Classifier, NetKatError> {
    let doc: serde_json::Value = serde_json::from_str(text)?;
    json_to_classifier(&doc)
}

fn vendor_header(switch_id: u64, flow: &FlowRule, field: &str) -> Result<Header, NetKatError> {
    Header::from_vendor(field).ok_or_else(|| NetKatError::UnknownField {
        switch_id,
        priority: flow.priority,
        field: field.to_string(),
    })
}

fn create_match(switch_id: u64, flow: &FlowRule) -> Result<FieldMap, NetKatError> {
    let mut pattern = FieldMap::new();
    pattern.insert(Header::Switch, HeaderValue::Int(switch_id));
    for (field, value) in &flow.pattern {
        if value.is_null() {
            continue;
        }
        let header = vendor_header(switch_id, flow, field)?;
        pattern.insert(header, value_from_json(header, value)?);
    }
    Ok(pattern)
}

fn create_actions(switch_id: u64, flow: &FlowRule) -> Result<BTreeSet<Action>, NetKatError> {
    let mut actions = BTreeSet::new();
    for group in &flow.actions {
        let mut mods = FieldMap::new();
        for action in group {
            match action {
                FlowAction::Modify { field, value } => {
                    let header = vendor_header(switch_id, flow, field)?;
                    mods.insert(header, value_from_json(header, value)?);
                }
                FlowAction::Output(OutputTarget::Physical { port }) => {
                    mods.insert(Header::Outport, HeaderValue::Int(*port));
                }
                FlowAction::Output(OutputTarget::Controller) => {
                    actions.insert(Action::Controller);
                }
            }
        }
        if !mods.is_empty() {
            actions.insert(Action::Modify(mods));
        }
    }
    Ok(actions)
}
