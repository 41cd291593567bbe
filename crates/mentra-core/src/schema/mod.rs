//! A compiled subset of JSON Schema used by both validators.
//!
//! [`CompiledSchema::compile`] turns a schema document into an immutable
//! node tree once; [`CompiledSchema::validate`] walks a value against it and
//! collects every violation rather than stopping at the first one.
//!
//! Supported keywords: `type`, `properties`, `required`, `items`, `enum`,
//! `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum`, `minLength`,
//! `minItems`, `uniqueItems`, `format` (`date`). Annotations (`$schema`,
//! `$id`, `title`, `description`) and `additionalProperties` are accepted
//! and never enforced: extra properties are tolerated and left in place.
//! Every other keyword is rejected at compile time.

mod check;

pub(crate) use check::whole_i64;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while compiling a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema node at {path:?} must be an object")]
    NotAnObject { path: String },

    #[error("unknown keyword {keyword:?} at {path:?}")]
    UnknownKeyword { path: String, keyword: String },

    #[error("invalid value for {keyword:?} at {path:?}: {reason}")]
    InvalidKeyword {
        path: String,
        keyword: String,
        reason: String,
    },

    #[error("unknown type {name:?} at {path:?}")]
    UnknownType { path: String, name: String },

    #[error("unknown format {format:?} at {path:?}")]
    UnknownFormat { path: String, format: String },
}

/// JSON value types a schema node may constrain to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

/// String formats understood by the `format` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Full calendar date, `YYYY-MM-DD`.
    Date,
}

impl Format {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
        }
    }
}

/// One compiled schema node.
#[derive(Debug, Clone, Default)]
pub(crate) struct SchemaNode {
    /// Allowed types; empty means any type.
    pub(crate) types: Vec<JsonType>,
    pub(crate) properties: Vec<(String, SchemaNode)>,
    pub(crate) required: Vec<String>,
    pub(crate) items: Option<Box<SchemaNode>>,
    pub(crate) enum_values: Option<Vec<Value>>,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_minimum: Option<f64>,
    pub(crate) exclusive_maximum: Option<f64>,
    pub(crate) min_length: Option<usize>,
    pub(crate) min_items: Option<usize>,
    pub(crate) unique_items: bool,
    pub(crate) format: Option<Format>,
}

/// An immutable, compiled schema. Cheap to share behind a `&'static` or `Arc`.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    root: SchemaNode,
}

impl CompiledSchema {
    /// Compile a schema document.
    pub fn compile(document: &Value) -> Result<Self, SchemaError> {
        let root = compile_node(document, "#")?;
        Ok(Self { root })
    }

    /// Parse and compile a schema from JSON text.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let document: Value = serde_json::from_str(text)?;
        Self::compile(&document)
    }

    /// Validate `value`, returning every violation in document order.
    pub fn validate(&self, value: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.root.check(value, "/", &mut errors);
        errors
    }
}

const ANNOTATIONS: &[&str] = &[
    "$schema",
    "$id",
    "title",
    "description",
    "additionalProperties",
];

fn compile_node(schema: &Value, path: &str) -> Result<SchemaNode, SchemaError> {
    let obj = schema.as_object().ok_or_else(|| SchemaError::NotAnObject {
        path: path.to_string(),
    })?;

    let mut node = SchemaNode::default();

    for (keyword, value) in obj {
        match keyword.as_str() {
            "type" => node.types = compile_types(value, path)?,
            "properties" => {
                let props = expect_object(value, path, keyword)?;
                for (name, sub) in props {
                    let sub_path = format!("{path}/properties/{name}");
                    node.properties
                        .push((name.clone(), compile_node(sub, &sub_path)?));
                }
            }
            "required" => node.required = compile_string_list(value, path, keyword)?,
            "items" => {
                let sub_path = format!("{path}/items");
                node.items = Some(Box::new(compile_node(value, &sub_path)?));
            }
            "enum" => {
                let values = value.as_array().ok_or_else(|| invalid(path, keyword, "expected an array"))?;
                if values.is_empty() {
                    return Err(invalid(path, keyword, "must list at least one value"));
                }
                node.enum_values = Some(values.clone());
            }
            "minimum" => node.minimum = Some(expect_number(value, path, keyword)?),
            "maximum" => node.maximum = Some(expect_number(value, path, keyword)?),
            "exclusiveMinimum" => {
                node.exclusive_minimum = Some(expect_number(value, path, keyword)?)
            }
            "exclusiveMaximum" => {
                node.exclusive_maximum = Some(expect_number(value, path, keyword)?)
            }
            "minLength" => node.min_length = Some(expect_count(value, path, keyword)?),
            "minItems" => node.min_items = Some(expect_count(value, path, keyword)?),
            "uniqueItems" => {
                node.unique_items = value
                    .as_bool()
                    .ok_or_else(|| invalid(path, keyword, "expected a boolean"))?
            }
            "format" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| invalid(path, keyword, "expected a string"))?;
                node.format = Some(match name {
                    "date" => Format::Date,
                    other => {
                        return Err(SchemaError::UnknownFormat {
                            path: path.to_string(),
                            format: other.to_string(),
                        });
                    }
                });
            }
            k if ANNOTATIONS.contains(&k) => {}
            other => {
                return Err(SchemaError::UnknownKeyword {
                    path: path.to_string(),
                    keyword: other.to_string(),
                });
            }
        }
    }

    // A required name must also appear in `properties`.
    if !node.properties.is_empty() {
        for name in &node.required {
            if !node.properties.iter().any(|(p, _)| p == name) {
                return Err(invalid(
                    path,
                    "required",
                    &format!("property {name:?} is not declared in properties"),
                ));
            }
        }
    }

    Ok(node)
}

fn compile_types(value: &Value, path: &str) -> Result<Vec<JsonType>, SchemaError> {
    let names: Vec<&str> = match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().ok_or_else(|| invalid(path, "type", "expected type names")))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid(path, "type", "expected a string or an array")),
    };
    names
        .into_iter()
        .map(|name| {
            JsonType::parse(name).ok_or_else(|| SchemaError::UnknownType {
                path: path.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

fn compile_string_list(value: &Value, path: &str, keyword: &str) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(path, keyword, "expected an array"))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(path, keyword, "expected property names"))
        })
        .collect()
}

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
    keyword: &str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| invalid(path, keyword, "expected an object"))
}

fn expect_number(value: &Value, path: &str, keyword: &str) -> Result<f64, SchemaError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(path, keyword, "expected a number"))
}

fn expect_count(value: &Value, path: &str, keyword: &str) -> Result<usize, SchemaError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(path, keyword, "expected a non-negative integer"))
}

fn invalid(path: &str, keyword: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidKeyword {
        path: path.to_string(),
        keyword: keyword.to_string(),
        reason: reason.to_string(),
    }
}
