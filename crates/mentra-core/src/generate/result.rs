use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ErrorKind, GenerationOutcome};

/// Serialisable view of a [`GenerationOutcome`] for transport layers.
///
/// `details` carries the error list for validation failures and a message
/// string otherwise. `raw_response` is only set for parse and schema
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
}

impl GenerationResult {
    fn failure(kind: ErrorKind, error: &str, details: Value) -> Self {
        Self {
            success: false,
            roadmap: None,
            error: Some(error.to_string()),
            error_kind: Some(kind),
            details: Some(details),
            raw_response: None,
        }
    }

    fn with_raw_response(mut self, raw: Value) -> Self {
        self.raw_response = Some(raw);
        self
    }
}

fn errors_value<T: Serialize>(errors: &T) -> Value {
    serde_json::to_value(errors).unwrap_or(Value::Null)
}

impl From<GenerationOutcome> for GenerationResult {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Success(validated) => {
                let roadmap = match validated.into_raw() {
                    Value::Object(mut map) => map.remove("roadmap"),
                    _ => None,
                };
                Self {
                    success: true,
                    roadmap,
                    error: None,
                    error_kind: None,
                    details: None,
                    raw_response: None,
                }
            }
            GenerationOutcome::InvalidInput { errors } => Self::failure(
                ErrorKind::InvalidInput,
                "Invalid input",
                errors_value(&errors),
            ),
            GenerationOutcome::ParseError { message, raw_text } => Self::failure(
                ErrorKind::ParseError,
                "Failed to parse AI response as JSON",
                Value::String(message),
            )
            .with_raw_response(Value::String(raw_text)),
            GenerationOutcome::SchemaError { errors, parsed } => Self::failure(
                ErrorKind::SchemaError,
                "AI response does not match expected schema",
                errors_value(&errors),
            )
            .with_raw_response(parsed),
            GenerationOutcome::UpstreamError(e) => Self::failure(
                ErrorKind::UpstreamError,
                "AI provider request failed",
                Value::String(e.to_string()),
            ),
            GenerationOutcome::InternalError { message } => Self::failure(
                ErrorKind::InternalError,
                "Unexpected error in roadmap generation",
                Value::String(message),
            ),
        }
    }
}
