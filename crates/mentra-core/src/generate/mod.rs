//! Roadmap generation: one validated request, one model call, one verdict.
//!
//! [`RoadmapGenerator::generate`] runs the whole pipeline as a single
//! attempt:
//!
//! 1. sanitise and validate the request ([`crate::input`]),
//! 2. build the prompt ([`crate::prompt`]),
//! 3. call the model once ([`crate::model`]),
//! 4. strip code fences and parse the reply as JSON,
//! 5. validate the roadmap ([`crate::output`]).
//!
//! Every failure is folded into a [`GenerationOutcome`]; nothing is retried.

mod fence;
mod result;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::InputValidator;
use crate::model::{ModelClient, ModelError};
use crate::output::OutputValidator;
use crate::prompt::PromptBuilder;
use crate::roadmap::ValidatedRoadmap;
use crate::validation::ValidationError;

pub use fence::strip_code_fences;
pub use result::GenerationResult;

/// Failure category of a [`GenerationOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ParseError,
    SchemaError,
    UpstreamError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ParseError => "parse_error",
            Self::SchemaError => "schema_error",
            Self::UpstreamError => "upstream_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one generation attempt.
#[derive(Debug)]
pub enum GenerationOutcome {
    /// The roadmap passed both validation phases.
    Success(ValidatedRoadmap),
    /// The request failed input validation; the model was not called.
    InvalidInput { errors: Vec<ValidationError> },
    /// The reply was not JSON after fence stripping.
    ParseError { message: String, raw_text: String },
    /// The reply parsed but failed roadmap validation.
    SchemaError {
        errors: Vec<ValidationError>,
        parsed: Value,
    },
    /// The model call itself failed.
    UpstreamError(ModelError),
    /// Anything else, such as a panicking collaborator.
    InternalError { message: String },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// `None` on success.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::InvalidInput { .. } => Some(ErrorKind::InvalidInput),
            Self::ParseError { .. } => Some(ErrorKind::ParseError),
            Self::SchemaError { .. } => Some(ErrorKind::SchemaError),
            Self::UpstreamError(_) => Some(ErrorKind::UpstreamError),
            Self::InternalError { .. } => Some(ErrorKind::InternalError),
        }
    }
}

/// Runs the generation pipeline against a model and prompt builder.
///
/// Holds only shared, read-only collaborators; clone it freely or share it
/// behind an `Arc` across tasks.
#[derive(Clone)]
pub struct RoadmapGenerator {
    model: Arc<dyn ModelClient>,
    prompts: Arc<dyn PromptBuilder>,
    input_validator: Arc<InputValidator>,
    output_validator: Arc<OutputValidator>,
}

impl RoadmapGenerator {
    /// Create a generator using the embedded schemas.
    pub fn new(model: Arc<dyn ModelClient>, prompts: Arc<dyn PromptBuilder>) -> Self {
        Self {
            model,
            prompts,
            input_validator: Arc::new(InputValidator::shared().clone()),
            output_validator: Arc::new(OutputValidator::shared().clone()),
        }
    }

    pub fn with_input_validator(mut self, validator: Arc<InputValidator>) -> Self {
        self.input_validator = validator;
        self
    }

    pub fn with_output_validator(mut self, validator: Arc<OutputValidator>) -> Self {
        self.output_validator = validator;
        self
    }

    pub fn input_validator(&self) -> &InputValidator {
        &self.input_validator
    }

    pub fn output_validator(&self) -> &OutputValidator {
        &self.output_validator
    }

    /// Generate a roadmap for `raw`. Never panics and never retries.
    pub async fn generate(&self, raw: &Value) -> GenerationOutcome {
        match AssertUnwindSafe(self.run(raw)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(%message, "roadmap generation panicked");
                GenerationOutcome::InternalError { message }
            }
        }
    }

    async fn run(&self, raw: &Value) -> GenerationOutcome {
        // 1. Input.
        let checked = self.input_validator.sanitize_and_validate(raw);
        let input = match checked.sanitized {
            Some(input) => input,
            None => {
                tracing::warn!(errors = checked.result.errors.len(), "rejected invalid input");
                return GenerationOutcome::InvalidInput {
                    errors: checked.result.errors,
                };
            }
        };

        // 2. Prompt.
        let prompt = self.prompts.build(&input);
        let system = self.prompts.system_instruction();

        // 3. Model call, exactly once.
        tracing::info!(
            model = self.model.name(),
            weeks = input.time_constraints.total_weeks,
            "requesting roadmap from model"
        );
        let text = match self.model.complete(&prompt, system.as_deref()).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "model call failed");
                return GenerationOutcome::UpstreamError(e);
            }
        };

        // 4. Parse.
        let parsed: Value = match serde_json::from_str(strip_code_fences(&text)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, response_chars = text.len(), "model reply is not JSON");
                return GenerationOutcome::ParseError {
                    message: e.to_string(),
                    raw_text: text,
                };
            }
        };

        // 5. Output.
        let checked = self.output_validator.validate_and_process(&parsed);
        match checked.processed {
            Some(roadmap) => {
                tracing::info!(
                    weeks = roadmap.roadmap().weeks.len(),
                    hours = roadmap.roadmap().total_estimated_hours,
                    "roadmap validated"
                );
                GenerationOutcome::Success(roadmap)
            }
            None => {
                tracing::warn!(errors = checked.result.errors.len(), "model reply failed validation");
                GenerationOutcome::SchemaError {
                    errors: checked.result.errors,
                    parsed,
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::input::UserInput;
    use crate::prompt::DefaultPromptBuilder;

    struct FixedModel(Result<&'static str, &'static str>);

    #[async_trait]
    impl ModelClient for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _prompt: &str, _system: Option<&str>) -> Result<String, ModelError> {
            self.0
                .map(str::to_string)
                .map_err(|e| ModelError::RequestFailed(e.to_string()))
        }
    }

    struct PanickingPrompts;

    impl PromptBuilder for PanickingPrompts {
        fn system_instruction(&self) -> Option<String> {
            None
        }

        fn build(&self, _input: &UserInput) -> String {
            panic!("template missing")
        }
    }

    fn request() -> Value {
        json!({
            "skills": [{ "name": "Python", "level": "beginner" }],
            "goal": { "subject": "ML", "specificObjective": "Classify", "depth": "basic" },
            "timeConstraints": { "totalWeeks": 1, "hoursPerWeek": 5 }
        })
    }

    fn generator(model: FixedModel) -> RoadmapGenerator {
        RoadmapGenerator::new(Arc::new(model), Arc::new(DefaultPromptBuilder))
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let outcome = generator(FixedModel(Err("connection refused"))).generate(&request()).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::UpstreamError));
    }

    #[tokio::test]
    async fn non_json_reply_is_a_parse_error() {
        let outcome = generator(FixedModel(Ok("Sure! Here is your plan."))).generate(&request()).await;
        match outcome {
            GenerationOutcome::ParseError { raw_text, .. } => {
                assert_eq!(raw_text, "Sure! Here is your plan.");
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_collaborator_becomes_internal_error() {
        let generator = RoadmapGenerator::new(Arc::new(FixedModel(Ok("{}"))), Arc::new(PanickingPrompts));
        let outcome = generator.generate(&request()).await;
        match outcome {
            GenerationOutcome::InternalError { message } => assert_eq!(message, "template missing"),
            other => panic!("expected InternalError, got {other:?}"),
        }
    }

    #[test]
    fn error_kind_names() {
        assert_eq!(ErrorKind::InvalidInput.to_string(), "invalid_input");
        assert_eq!(
            serde_json::to_value(ErrorKind::SchemaError).unwrap(),
            json!("schema_error")
        );
    }
}
