use crate::errors::{AavekitError, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Declarative input shape for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Empty,
    Amount { description: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmountRequest {
    pub amount: String,
}

/// A request that passed validation for its action's [`InputKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionInput {
    Empty,
    Amount(AmountRequest),
}

impl ActionInput {
    pub fn amount(&self) -> Result<&str, ToolError> {
        match self {
            Self::Amount(r) => Ok(&r.amount),
            Self::Empty => Err(AavekitError::InvalidRequest("`amount` is required".into()).into()),
        }
    }
}

fn invalid(msg: String) -> AavekitError {
    AavekitError::InvalidRequest(msg)
}

impl InputKind {
    pub fn schema(&self) -> Value {
        match self {
            Self::Empty => json!({
              "type": "object",
              "properties": {},
              "additionalProperties": false
            }),
            Self::Amount { description } => json!({
              "type": "object",
              "properties": {
                "amount": { "type": "string", "minLength": 1, "description": description }
              },
              "required": ["amount"],
              "additionalProperties": false
            }),
        }
    }

    fn allowed_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Empty => &[],
            Self::Amount { .. } => &["amount"],
        }
    }

    /// Validate raw JSON arguments with field-level errors.
    pub fn parse(&self, args: Value) -> Result<ActionInput, AavekitError> {
        let obj = match args {
            Value::Null => serde_json::Map::new(),
            Value::Object(m) => m,
            other => {
                return Err(invalid(format!(
                    "arguments must be a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let allowed = self.allowed_fields();
        if let Some(extra) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(invalid(format!("unexpected field `{extra}`")));
        }

        match self {
            Self::Empty => Ok(ActionInput::Empty),
            Self::Amount { .. } => {
                match obj.get("amount") {
                    None => return Err(invalid("`amount` is required".into())),
                    Some(Value::String(s)) if s.trim().is_empty() => {
                        return Err(invalid("`amount` must not be empty".into()))
                    }
                    Some(Value::String(_)) => {}
                    Some(other) => {
                        return Err(invalid(format!(
                            "`amount` must be a string, got {}",
                            json_type_name(other)
                        )))
                    }
                }
                let req: AmountRequest = serde_json::from_value(Value::Object(obj))
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(ActionInput::Amount(req))
            }
        }
    }
}

const fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
