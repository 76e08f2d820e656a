//! Deserialization of compiled flow-table JSON into typed records.
//!
//! The main entry point is [`from_flow_table`], which takes a
//! `&serde_json::Value` holding an array of
//! `{switch_id, tbl: [{priority, pattern, action}]}` objects.

use crate::types::*;
use std::fmt;

/// Errors during flow-table deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterchangeError {
    /// A switch table is missing a required field.
    MissingField { field: String },
    /// The table structure is invalid.
    InvalidTable(String),
    /// An action entry has the wrong shape or an unknown tag.
    MalformedAction {
        switch_id: u64,
        priority: i64,
        message: String,
    },
}

impl fmt::Display for InterchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterchangeError::MissingField { field } => {
                write!(f, "switch table missing required field: '{}'", field)
            }
            InterchangeError::InvalidTable(msg) => {
                write!(f, "invalid flow table: {}", msg)
            }
            InterchangeError::MalformedAction {
                switch_id,
                priority,
                message,
            } => {
                write!(
                    f,
                    "switch {} rule {}: malformed action: {}",
                    switch_id, priority, message
                )
            }
        }
    }
}

impl std::error::Error for InterchangeError {}

/// Deserialize a flow-table document into per-switch tables.
///
/// Switch tables and the rules within them keep their document order;
/// priority ordering is left to the caller.
pub fn from_flow_table(doc: &serde_json::Value) -> Result<Vec<SwitchTable>, InterchangeError> {
    let tables = doc.as_array().ok_or_else(|| {
        InterchangeError::InvalidTable("document must be an array of switch tables".to_string())
    })?;

    tables.iter().map(parse_switch_table).collect()
}

/// Recover the vendor field name from a `Set<Field>` action name.
///
/// `SetDlSrc` becomes `dlSrc`, `SetTpDst` becomes `tpDst`. VLAN setters
/// are named without their `Dl` prefix (`SetVlan`, `SetVlanPcp`), so the
/// prefix is put back for them.
pub fn vendor_field_from_setter(name: &str) -> Option<String> {
    let rest = name.strip_prefix("Set")?;
    if rest == "Vlan" || rest == "VlanPcp" {
        return Some(format!("dl{}", rest));
    }
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn parse_switch_table(obj: &serde_json::Value) -> Result<SwitchTable, InterchangeError> {
    let switch_id = obj
        .get("switch_id")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "switch_id".to_string(),
        })?;

    let tbl = obj
        .get("tbl")
        .and_then(|t| t.as_array())
        .ok_or_else(|| InterchangeError::MissingField {
            field: "tbl".to_string(),
        })?;

    let rules = tbl
        .iter()
        .map(|r| parse_rule(switch_id, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SwitchTable { switch_id, rules })
}

fn parse_rule(switch_id: u64, obj: &serde_json::Value) -> Result<FlowRule, InterchangeError> {
    let priority = obj
        .get("priority")
        .and_then(|p| p.as_i64())
        .ok_or_else(|| {
            InterchangeError::InvalidTable(format!(
                "switch {}: rule missing integer 'priority'",
                switch_id
            ))
        })?;

    let pattern = obj
        .get("pattern")
        .and_then(|p| p.as_object())
        .cloned()
        .ok_or_else(|| {
            InterchangeError::InvalidTable(format!(
                "switch {} rule {}: missing 'pattern' object",
                switch_id, priority
            ))
        })?;

    let malformed = |message: String| InterchangeError::MalformedAction {
        switch_id,
        priority,
        message,
    };

    let action = obj
        .get("action")
        .and_then(|a| a.as_array())
        .ok_or_else(|| malformed("'action' must be an array of action lists".to_string()))?;

    let mut actions = Vec::with_capacity(action.len());
    for act_list in action {
        let entries = act_list
            .as_array()
            .ok_or_else(|| malformed(format!("action list must be an array, got {}", act_list)))?;
        let parsed = entries
            .iter()
            .map(|entry| parse_action(entry).map_err(&malformed))
            .collect::<Result<Vec<_>, _>>()?;
        actions.push(parsed);
    }

    Ok(FlowRule {
        priority,
        pattern,
        actions,
    })
}

fn parse_action(entry: &serde_json::Value) -> Result<FlowAction, String> {
    let pair = entry
        .as_array()
        .filter(|a| a.len() == 2)
        .ok_or_else(|| format!("expected [tag, args] pair, got {}", entry))?;

    let tag = pair[0]
        .as_str()
        .ok_or_else(|| format!("action tag must be a string, got {}", pair[0]))?;

    match tag {
        "Modify" => {
            let args = pair[1]
                .as_array()
                .filter(|a| a.len() == 2)
                .ok_or_else(|| format!("Modify expects [setter, value], got {}", pair[1]))?;
            let setter = args[0]
                .as_str()
                .ok_or_else(|| format!("Modify setter must be a string, got {}", args[0]))?;
            let field = vendor_field_from_setter(setter)
                .ok_or_else(|| format!("unrecognized setter '{}'", setter))?;
            Ok(FlowAction::Modify {
                field,
                value: args[1].clone(),
            })
        }
        "Output" => {
            let kind = pair[1]
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| format!("Output target missing 'type', got {}", pair[1]))?;
            match kind {
                "physical" => {
                    let port = pair[1]
                        .get("port")
                        .and_then(|p| p.as_u64())
                        .ok_or_else(|| "physical Output missing integer 'port'".to_string())?;
                    Ok(FlowAction::Output(OutputTarget::Physical { port }))
                }
                "controller" => Ok(FlowAction::Output(OutputTarget::Controller)),
                other => Err(format!("unsupported Output target '{}'", other)),
            }
        }
        other => Err(format!("unknown action tag '{}'", other)),
    }
}
