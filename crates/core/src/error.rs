use netkat_interchange::InterchangeError;

use crate::ast::Policy;

/// Errors raised while compiling policies or reconstructing classifiers.
///
/// Every error aborts the whole call; nothing is emitted for the parts of
/// the input that did translate.
#[derive(Debug, thiserror::Error)]
pub enum NetKatError {
    /// A node outside the predicate subset reached the predicate compiler.
    #[error("unsupported predicate: '{}' node cannot be compiled as a predicate", .0.kind())]
    UnsupportedPredicate(Box<Policy>),

    /// A node the wire format has no policy encoding for.
    #[error("unsupported policy: '{}' node cannot be compiled", .0.kind())]
    UnsupportedPolicy(Box<Policy>),

    #[error("unsupported header: '{header}'")]
    UnsupportedHeader { header: String },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A flow-table pattern or action names a vendor field outside the table.
    #[error("switch {switch_id} rule {priority}: unknown field '{field}'")]
    UnknownField {
        switch_id: u64,
        priority: i64,
        field: String,
    },

    #[error("switch {switch_id} rule {priority}: malformed action: {message}")]
    MalformedAction {
        switch_id: u64,
        priority: i64,
        message: String,
    },

    /// The flow-table document has the wrong overall shape.
    #[error(transparent)]
    Interchange(InterchangeError),

    #[error("invalid policy document: {0}")]
    Document(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<InterchangeError> for NetKatError {
    fn from(err: InterchangeError) -> Self {
        match err {
            InterchangeError::MalformedAction {
                switch_id,
                priority,
                message,
            } => NetKatError::MalformedAction {
                switch_id,
                priority,
                message,
            },
            other => NetKatError::Interchange(other),
        }
    }
}

impl NetKatError {
    /// Stable machine-readable kind, used by `--output json`.
    pub fn kind(&self) -> &'static str {
        match self {
            NetKatError::UnsupportedPredicate(_) => "unsupported_predicate",
            NetKatError::UnsupportedPolicy(_) => "unsupported_policy",
            NetKatError::UnsupportedHeader { .. } => "unsupported_header",
            NetKatError::TypeMismatch { .. } => "type_mismatch",
            NetKatError::UnknownField { .. } => "unknown_field",
            NetKatError::MalformedAction { .. } => "malformed_action",
            NetKatError::Interchange(_) => "invalid_flow_table",
            NetKatError::Document(_) => "invalid_document",
            NetKatError::Serialize(_) => "serialization",
        }
    }

    /// Serialize as `{"error": <kind>, "message": <display>}`.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "error":   self.kind(),
            "message": self.to_string(),
        })
    }
}
