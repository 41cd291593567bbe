//! Output validation for model-generated roadmaps.
//!
//! Two phases, in order:
//! 1. Structural conformance to `schemas/output.schema.json`.
//! 2. Roadmap consistency (see [`consistency`]), run only when phase 1
//!    passed, since the rules assume the shape the schema guarantees.
//!
//! Errors from both phases are reported together; the raw object is handed
//! back untouched only when both phases pass.

pub mod consistency;

use std::sync::LazyLock;

use serde_json::Value;
use thiserror::Error;

use crate::roadmap::{RoadmapOutput, ValidatedRoadmap};
use crate::schema::{CompiledSchema, SchemaError};
use crate::validation::{ValidationError, ValidationResult};

const OUTPUT_SCHEMA: &str = include_str!("../../schemas/output.schema.json");

/// Absolute difference allowed between the declared and recomputed hour
/// totals.
pub const HOUR_SUM_TOLERANCE: f64 = 0.1;

/// An hour-sum tolerance that is negative, infinite or NaN.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("hour tolerance must be a finite non-negative number, got {0}")]
pub struct InvalidTolerance(pub f64);

/// Return `tolerance` if it can be used as an hour-sum tolerance.
pub fn check_tolerance(tolerance: f64) -> Result<f64, InvalidTolerance> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(tolerance)
    } else {
        Err(InvalidTolerance(tolerance))
    }
}

/// Result of [`OutputValidator::validate_and_process`].
///
/// `processed` is `Some` exactly when `result.is_valid`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOutcome {
    pub processed: Option<ValidatedRoadmap>,
    pub result: ValidationResult,
}

impl OutputOutcome {
    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

static SHARED: LazyLock<OutputValidator> = LazyLock::new(|| {
    OutputValidator::new().unwrap_or_else(|e| panic!("embedded output schema failed to compile: {e}"))
});

/// Validates roadmaps against a compiled output schema plus the consistency
/// rules.
#[derive(Debug, Clone)]
pub struct OutputValidator {
    schema: CompiledSchema,
    tolerance: f64,
}

impl OutputValidator {
    /// Compile the embedded output schema with the default tolerance.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: CompiledSchema::parse(OUTPUT_SCHEMA)?,
            tolerance: HOUR_SUM_TOLERANCE,
        })
    }

    /// Use a caller-supplied schema document instead of the embedded one.
    pub fn from_schema(document: &Value) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: CompiledSchema::compile(document)?,
            tolerance: HOUR_SUM_TOLERANCE,
        })
    }

    /// Override the hour-sum tolerance. Fails unless [`check_tolerance`]
    /// accepts it.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, InvalidTolerance> {
        self.tolerance = check_tolerance(tolerance)?;
        Ok(self)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The process-wide instance built from the embedded schema.
    pub fn shared() -> &'static OutputValidator {
        &SHARED
    }

    /// Phase 1 only.
    pub fn validate_schema(&self, output: &Value) -> ValidationResult {
        ValidationResult::from_errors(self.schema.validate(output))
    }

    /// Run both phases and return the raw object when it passes.
    pub fn validate_and_process(&self, raw: &Value) -> OutputOutcome {
        let structural = self.validate_schema(raw);
        if !structural.is_valid {
            tracing::debug!(errors = structural.errors.len(), "roadmap failed schema validation");
            return OutputOutcome {
                processed: None,
                result: structural,
            };
        }

        let output = match serde_json::from_value::<RoadmapOutput>(raw.clone()) {
            Ok(output) => output,
            // Only reachable with an override schema looser than the types.
            Err(e) => {
                return OutputOutcome {
                    processed: None,
                    result: ValidationResult::from_errors(vec![ValidationError::new(
                        "/",
                        format!("output does not match the roadmap model: {e}"),
                    )]),
                };
            }
        };

        let semantic = consistency::check_all(&output.roadmap, self.tolerance);
        if !semantic.is_empty() {
            tracing::debug!(errors = semantic.len(), "roadmap failed consistency checks");
        }
        let result = structural.merge(ValidationResult::from_errors(semantic));

        let processed = result.is_valid.then(|| ValidatedRoadmap {
            raw: raw.clone(),
            output,
        });
        OutputOutcome { processed, result }
    }
}

/// Validate with the shared validator.
pub fn validate_and_process(raw: &Value) -> OutputOutcome {
    OutputValidator::shared().validate_and_process(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one_week() -> Value {
        json!({
            "roadmap": {
                "weeks": [{
                    "weekNumber": 1,
                    "title": "Foundations",
                    "topics": [{
                        "name": "Syntax",
                        "description": "Core syntax",
                        "estimatedHours": 6,
                        "prerequisites": [],
                        "resources": [{ "type": "book", "title": "The Book" }]
                    }],
                    "weeklyGoal": "Write small programs",
                    "sequencingExplanation": "Everything builds on syntax"
                }],
                "totalWeeks": 1,
                "totalEstimatedHours": 6,
                "overallGoal": "Learn the language",
                "prerequisiteAnalysis": "No prior knowledge needed"
            }
        })
    }

    #[test]
    fn accepts_consistent_roadmap_and_returns_raw_object() {
        let raw = one_week();
        let outcome = validate_and_process(&raw);
        assert!(outcome.is_valid(), "errors: {:?}", outcome.result.errors);
        let processed = outcome.processed.expect("processed roadmap");
        assert_eq!(processed.raw, raw);
        assert_eq!(processed.roadmap().total_weeks, 1);
    }

    #[test]
    fn schema_failure_skips_consistency_phase() {
        let mut raw = one_week();
        raw["roadmap"]["weeks"][0]["topics"][0]["resources"][0]["type"] = json!("podcast");
        // Would also fail the count rule if phase 2 ran.
        raw["roadmap"]["totalWeeks"] = json!(9);
        let outcome = validate_and_process(&raw);
        assert!(!outcome.is_valid());
        assert!(outcome.processed.is_none());
        assert_eq!(outcome.result.errors.len(), 1);
        assert_eq!(
            outcome.result.errors[0].field,
            "/roadmap/weeks/0/topics/0/resources/0/type"
        );
    }

    #[test]
    fn tolerance_override_applies() {
        let mut raw = one_week();
        raw["roadmap"]["totalEstimatedHours"] = json!(6.5);
        assert!(!validate_and_process(&raw).is_valid());
        let lenient = OutputValidator::new().unwrap().with_tolerance(1.0).unwrap();
        assert!(lenient.validate_and_process(&raw).is_valid());
    }

    #[test]
    fn unusable_tolerances_are_refused() {
        for bad in [f64::NAN, f64::INFINITY, -0.5] {
            let result = OutputValidator::new().unwrap().with_tolerance(bad);
            assert!(result.is_err(), "{bad} was accepted");
        }
        assert_eq!(
            check_tolerance(-0.5).unwrap_err().to_string(),
            "hour tolerance must be a finite non-negative number, got -0.5"
        );
        let exact = OutputValidator::new().unwrap().with_tolerance(0.0).unwrap();
        assert!(exact.validate_and_process(&one_week()).is_valid());
    }

    #[test]
    fn default_tolerance_is_exposed() {
        assert_eq!(OutputValidator::shared().tolerance(), HOUR_SUM_TOLERANCE);
    }
}
