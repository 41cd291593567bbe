//! Walking a value against a compiled [`SchemaNode`].

use chrono::NaiveDate;
use serde_json::Value;

use super::{Format, JsonType, SchemaNode};
use crate::validation::{ValidationError, ViolationParams, pointer_child, pointer_index};

impl SchemaNode {
    /// Append every violation of `value` at `path` to `errors`.
    ///
    /// A type mismatch short-circuits the remaining keywords on this node,
    /// since none of them are meaningful against the wrong type.
    pub(crate) fn check(&self, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        if !self.types.is_empty() && !self.types.iter().any(|t| matches_type(*t, value)) {
            let expected = self
                .types
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",");
            errors.push(
                ValidationError::new(path, format!("must be {expected}")).with_params(
                    ViolationParams::TypeMismatch {
                        expected,
                        actual: type_name(value).to_string(),
                    },
                ),
            );
            return;
        }

        if let Some(allowed) = &self.enum_values {
            if !allowed.contains(value) {
                errors.push(
                    ValidationError::new(path, "must be equal to one of the allowed values")
                        .with_params(ViolationParams::EnumViolation {
                            allowed: allowed.clone(),
                        }),
                );
            }
        }

        match value {
            Value::Number(n) => {
                if let Some(x) = n.as_f64() {
                    self.check_bounds(x, path, errors);
                }
            }
            Value::String(s) => self.check_string(s, path, errors),
            Value::Array(items) => self.check_array(items, path, errors),
            Value::Object(map) => {
                for name in &self.required {
                    if !map.contains_key(name) {
                        errors.push(
                            ValidationError::new(
                                pointer_child(path, name),
                                format!("must have required property '{name}'"),
                            )
                            .with_params(ViolationParams::MissingRequired {
                                missing_property: name.clone(),
                            }),
                        );
                    }
                }
                for (name, sub) in &self.properties {
                    if let Some(child) = map.get(name) {
                        sub.check(child, &pointer_child(path, name), errors);
                    }
                }
            }
            Value::Null | Value::Bool(_) => {}
        }
    }

    fn check_bounds(&self, x: f64, path: &str, errors: &mut Vec<ValidationError>) {
        let bounds = [
            (self.minimum, ">=", x >= self.minimum.unwrap_or(f64::NEG_INFINITY)),
            (self.exclusive_minimum, ">", self.exclusive_minimum.is_none_or(|m| x > m)),
            (self.maximum, "<=", x <= self.maximum.unwrap_or(f64::INFINITY)),
            (self.exclusive_maximum, "<", self.exclusive_maximum.is_none_or(|m| x < m)),
        ];
        for (limit, comparison, ok) in bounds {
            if let (Some(limit), false) = (limit, ok) {
                errors.push(
                    ValidationError::new(path, format!("must be {comparison} {limit}")).with_params(
                        ViolationParams::Limit {
                            comparison: comparison.to_string(),
                            limit,
                        },
                    ),
                );
            }
        }
    }

    fn check_string(&self, s: &str, path: &str, errors: &mut Vec<ValidationError>) {
        if let Some(limit) = self.min_length {
            if s.chars().count() < limit {
                errors.push(
                    ValidationError::new(
                        path,
                        format!("must NOT have fewer than {limit} characters"),
                    )
                    .with_params(ViolationParams::MinLength { limit }),
                );
            }
        }
        if let Some(format) = self.format {
            if !matches_format(format, s) {
                errors.push(
                    ValidationError::new(path, format!("must match format \"{}\"", format.as_str()))
                        .with_params(ViolationParams::Format {
                            format: format.as_str().to_string(),
                        }),
                );
            }
        }
    }

    fn check_array(&self, items: &[Value], path: &str, errors: &mut Vec<ValidationError>) {
        if let Some(limit) = self.min_items {
            if items.len() < limit {
                errors.push(
                    ValidationError::new(path, format!("must NOT have fewer than {limit} items"))
                        .with_params(ViolationParams::MinItems { limit }),
                );
            }
        }
        if self.unique_items {
            if let Some((first, second)) = first_duplicate(items) {
                errors.push(
                    ValidationError::new(
                        path,
                        format!(
                            "must NOT have duplicate items (items ## {first} and {second} are identical)"
                        ),
                    )
                    .with_params(ViolationParams::UniqueItems { first, second }),
                );
            }
        }
        if let Some(item_schema) = &self.items {
            for (i, item) in items.iter().enumerate() {
                item_schema.check(item, &pointer_index(path, i), errors);
            }
        }
    }
}

fn matches_type(ty: JsonType, value: &Value) -> bool {
    match (ty, value) {
        (JsonType::Null, Value::Null) => true,
        (JsonType::Boolean, Value::Bool(_)) => true,
        (JsonType::Number, Value::Number(_)) => true,
        (JsonType::Integer, Value::Number(n)) => is_integral(n),
        (JsonType::String, Value::String(_)) => true,
        (JsonType::Array, Value::Array(_)) => true,
        (JsonType::Object, Value::Object(_)) => true,
        _ => false,
    }
}

/// The `i64` value of a whole number, or `None`.
///
/// `4` and `4.0` are both whole; `4.5` is not, and neither is anything
/// outside the `i64` range. The typed request and roadmap models read their
/// integer fields through this same function.
pub(crate) fn whole_i64(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        return None;
    }
    // 2^63 is exact in f64; anything at or above it overflows i64.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    n.as_f64()
        .filter(|x| x.fract() == 0.0 && *x >= -LIMIT && *x < LIMIT)
        .map(|x| x as i64)
}

fn is_integral(n: &serde_json::Number) -> bool {
    whole_i64(n).is_some()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_integral(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_format(format: Format, s: &str) -> bool {
    match format {
        // Length guard rejects chrono's lenient forms like `2024-1-5`.
        Format::Date => s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for j in 1..items.len() {
        for i in 0..j {
            if items[i] == items[j] {
                return Some((i, j));
            }
        }
    }
    None
}
