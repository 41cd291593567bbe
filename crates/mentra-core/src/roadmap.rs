//! Typed view of a model-generated roadmap.
//!
//! These types mirror `schemas/output.schema.json`. They are only ever built
//! from a value that has already passed schema validation, and they ignore
//! (rather than reject) fields they do not know about.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::schema::whole_i64;

/// Accept exactly what the schema's `integer` type accepts, `4.0` included.
pub(crate) fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = serde_json::Number::deserialize(deserializer)?;
    whole_i64(&n).ok_or_else(|| D::Error::custom(format!("expected a whole number, got {n}")))
}

/// Kind of learning resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Book,
    Course,
    Video,
    Article,
    Tutorial,
    Documentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    pub description: String,
    pub estimated_hours: f64,
    /// Free-text topic names; not checked against the rest of the roadmap.
    pub prerequisites: Vec<String>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    #[serde(deserialize_with = "whole_number")]
    pub week_number: i64,
    pub title: String,
    pub topics: Vec<Topic>,
    pub weekly_goal: String,
    pub sequencing_explanation: String,
}

impl Week {
    /// Sum of `estimatedHours` over this week's topics.
    pub fn hours(&self) -> f64 {
        self.topics.iter().map(|t| t.estimated_hours).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub weeks: Vec<Week>,
    #[serde(deserialize_with = "whole_number")]
    pub total_weeks: i64,
    pub total_estimated_hours: f64,
    pub overall_goal: String,
    pub prerequisite_analysis: String,
}

impl Roadmap {
    /// Recompute the total from topics up through weeks.
    pub fn computed_hours(&self) -> f64 {
        self.weeks.iter().map(Week::hours).sum()
    }
}

/// Root object returned by the model: `{ "roadmap": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapOutput {
    pub roadmap: Roadmap,
}

/// A roadmap that passed both validation phases.
///
/// `raw` is the object exactly as the model produced it, extra fields
/// included; `output` is the typed view of the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRoadmap {
    pub raw: Value,
    pub output: RoadmapOutput,
}

impl ValidatedRoadmap {
    pub fn roadmap(&self) -> &Roadmap {
        &self.output.roadmap
    }

    /// The raw `roadmap` member, as handed to callers.
    pub fn raw_roadmap(&self) -> &Value {
        self.raw.get("roadmap").unwrap_or(&Value::Null)
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}
