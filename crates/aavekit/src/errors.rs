use alloy::primitives::B256;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// A structured failure suitable for returning to an agent as action output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub data: Value,
}

impl ToolError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// Attach machine-readable detail, e.g. the hash of a submitted transaction.
    pub fn with_data(self, data: Value) -> Self {
        Self { data, ..self }
    }

    /// Prefix the message with what the action was doing, keeping the code.
    pub fn context(self, what: &str) -> Self {
        Self {
            message: format!("{what}: {}", self.message),
            ..self
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AavekitError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("transaction {0} reverted")]
    Reverted(B256),
}

impl From<AavekitError> for ToolError {
    fn from(e: AavekitError) -> Self {
        let message = e.to_string();
        match e {
            AavekitError::UnknownAction(_) => Self::new("unknown_action", message),
            AavekitError::InvalidRequest(_) => Self::new("invalid_request", message),
            AavekitError::InvalidAmount(_) => Self::new("invalid_amount", message),
            AavekitError::Precondition(_) => Self::new("precondition_failed", message),
            AavekitError::Timeout { .. } => Self::new("timeout", message),
            AavekitError::Reverted(_) => Self::new("tx_reverted", message),
        }
    }
}
