//! Input validation: sanitise an untrusted learning request, then check it
//! against `schemas/input.schema.json`.
//!
//! On success the caller receives a typed [`UserInput`]; on failure it gets
//! the complete error list and no input at all, so a partially-checked
//! request can never reach prompt construction.

mod sanitize;

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::roadmap::whole_number;
use crate::schema::{CompiledSchema, SchemaError};
use crate::validation::{ValidationError, ValidationResult};

pub use sanitize::sanitize;

const INPUT_SCHEMA: &str = include_str!("../../schemas/input.schema.json");

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

/// How deep the learner wants to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        };
        f.write_str(s)
    }
}

/// A skill the learner already has. Skills are identified by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: SkillLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub subject: String,
    pub specific_objective: String,
    pub depth: Depth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConstraints {
    #[serde(deserialize_with = "whole_number")]
    pub total_weeks: i64,
    pub hours_per_week: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_days: Option<Vec<Weekday>>,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// A sanitised, schema-valid learning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub skills: Vec<Skill>,
    pub goal: Goal,
    pub time_constraints: TimeConstraints,
}

/// Result of [`InputValidator::sanitize_and_validate`].
///
/// `sanitized` and `sanitized_value` are `Some` exactly when
/// `result.is_valid`. `sanitized_value` is the trimmed request as it was
/// validated, fields unknown to [`UserInput`] included.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOutcome {
    pub sanitized: Option<UserInput>,
    pub sanitized_value: Option<Value>,
    pub result: ValidationResult,
}

impl InputOutcome {
    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

static SHARED: LazyLock<InputValidator> = LazyLock::new(|| {
    InputValidator::new().unwrap_or_else(|e| panic!("embedded input schema failed to compile: {e}"))
});

/// Validates learning requests against a compiled input schema.
///
/// Holds no mutable state; one instance can serve any number of concurrent
/// callers.
#[derive(Debug, Clone)]
pub struct InputValidator {
    schema: CompiledSchema,
}

impl InputValidator {
    /// Compile the embedded input schema.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: CompiledSchema::parse(INPUT_SCHEMA)?,
        })
    }

    /// Use a caller-supplied schema document instead of the embedded one.
    pub fn from_schema(document: &Value) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: CompiledSchema::compile(document)?,
        })
    }

    /// The process-wide instance built from the embedded schema.
    pub fn shared() -> &'static InputValidator {
        &SHARED
    }

    /// Check `input` against the schema without sanitising it.
    pub fn validate(&self, input: &Value) -> ValidationResult {
        ValidationResult::from_errors(self.schema.validate(input))
    }

    /// Trim the request, validate the trimmed copy, and return it typed.
    pub fn sanitize_and_validate(&self, raw: &Value) -> InputOutcome {
        let sanitized = sanitize(raw);
        let result = self.validate(&sanitized);

        if !result.is_valid {
            tracing::debug!(errors = result.errors.len(), "input failed schema validation");
            return InputOutcome {
                sanitized: None,
                sanitized_value: None,
                result,
            };
        }

        match UserInput::deserialize(&sanitized) {
            Ok(input) => InputOutcome {
                sanitized: Some(input),
                sanitized_value: Some(sanitized),
                result,
            },
            // Only reachable with an override schema looser than the types.
            Err(e) => InputOutcome {
                sanitized: None,
                sanitized_value: None,
                result: ValidationResult::from_errors(vec![ValidationError::new(
                    "/",
                    format!("input does not match the request model: {e}"),
                )]),
            },
        }
    }
}

/// Sanitise and validate with the shared validator.
pub fn sanitize_and_validate(raw: &Value) -> InputOutcome {
    InputValidator::shared().sanitize_and_validate(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> Value {
        json!({
            "skills": [{ "name": "Python", "level": "beginner" }],
            "goal": {
                "subject": "ML",
                "specificObjective": "Build a classifier",
                "depth": "intermediate"
            },
            "timeConstraints": { "totalWeeks": 4, "hoursPerWeek": 10 }
        })
    }

    #[test]
    fn accepts_minimal_request() {
        let outcome = sanitize_and_validate(&valid_request());
        assert!(outcome.is_valid(), "errors: {:?}", outcome.result.errors);
        let input = outcome.sanitized.expect("valid input should be returned");
        assert_eq!(input.skills[0].level, SkillLevel::Beginner);
        assert_eq!(input.goal.depth, Depth::Intermediate);
        assert_eq!(input.time_constraints.total_weeks, 4);
        assert!(input.time_constraints.preferred_days.is_none());
    }

    #[test]
    fn rejects_whitespace_only_subject_after_trimming() {
        let mut raw = valid_request();
        raw["goal"]["subject"] = json!("   ");
        let outcome = sanitize_and_validate(&raw);
        assert!(!outcome.is_valid());
        assert!(outcome.sanitized.is_none());
        assert!(outcome.result.error_for("/goal/subject").is_some());
    }

    #[test]
    fn custom_schema_is_honoured() {
        let validator = InputValidator::from_schema(&json!({ "type": "object" })).unwrap();
        let outcome = validator.sanitize_and_validate(&json!({}));
        // Schema passes but the request model cannot be built.
        assert!(!outcome.is_valid());
        assert!(outcome.sanitized.is_none());
        assert!(outcome.sanitized_value.is_none());
        assert_eq!(outcome.result.errors[0].field, "/");
    }

    #[test]
    fn sanitized_value_keeps_unknown_fields() {
        let mut raw = valid_request();
        raw["goal"]["subject"] = json!("  ML  ");
        raw["goal"]["motivation"] = json!("career change");
        raw["notes"] = json!("evenings only");

        let outcome = sanitize_and_validate(&raw);
        let value = outcome.sanitized_value.expect("valid input should be returned");
        assert_eq!(value["goal"]["subject"], "ML");
        assert_eq!(value["goal"]["motivation"], "career change");
        assert_eq!(value["notes"], "evenings only");
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(SkillLevel::Advanced.to_string(), "advanced");
        assert_eq!(Depth::Expert.to_string(), "expert");
        assert_eq!(Weekday::Saturday.to_string(), "saturday");
    }
}
