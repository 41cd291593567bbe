//! The result contract shared by the input and output validators.
//!
//! Both validators return a [`ValidationResult`]: an ordered list of
//! [`ValidationError`]s, each naming the offending field as a JSON pointer.
//! The detail attached to an error is a [`ViolationParams`] variant keyed by
//! the rule that fired.

use serde::{Deserialize, Serialize};

/// Structured detail for a single violation, tagged by rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationParams {
    /// A `required` property is absent from its parent object.
    MissingRequired { missing_property: String },
    /// The value has the wrong JSON type.
    TypeMismatch { expected: String, actual: String },
    /// The value is not one of the listed alternatives.
    EnumViolation { allowed: Vec<serde_json::Value> },
    /// A numeric bound was violated. `comparison` is one of `>=`, `>`, `<=`, `<`.
    Limit { comparison: String, limit: f64 },
    /// A string is shorter than allowed.
    MinLength { limit: usize },
    /// An array is shorter than allowed.
    MinItems { limit: usize },
    /// Two array items are identical where uniqueness is required.
    UniqueItems { first: usize, second: usize },
    /// A string does not match a named format.
    Format { format: String },
    /// A declared count disagrees with the actual number of elements.
    CountMismatch { declared: i64, actual: usize },
    /// A declared hour total disagrees with the recomputed one.
    HourMismatch {
        declared: f64,
        computed: f64,
        tolerance: f64,
    },
}

/// A single violation found by a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON pointer to the offending value (`/` for the document root).
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ViolationParams>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            params: None,
        }
    }

    /// Attach structured detail.
    pub fn with_params(mut self, params: ViolationParams) -> Self {
        self.params = Some(params);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// A passing result with no errors.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Build a result that is valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Concatenate two results, keeping `self`'s errors first.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self.is_valid = self.is_valid && other.is_valid && self.errors.is_empty();
        self
    }

    /// Find the first error reported for `field`.
    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == field)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Append a property name to a JSON pointer, escaping `~` and `/`.
pub(crate) fn pointer_child(parent: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    if parent == "/" || parent.is_empty() {
        format!("/{escaped}")
    } else {
        format!("{parent}/{escaped}")
    }
}

/// Append an array index to a JSON pointer.
pub(crate) fn pointer_index(parent: &str, index: usize) -> String {
    pointer_child(parent, &index.to_string())
}
