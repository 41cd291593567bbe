//! Shared test fixtures for mentra integration tests.
//!
//! Provides:
//! - canned learning requests ([`sample_input`], [`ml_python_input`]),
//! - a roadmap document builder that keeps the totals consistent by default
//!   ([`RoadmapFixture`]),
//! - a [`ScriptedModel`] that replays queued replies and records every
//!   prompt it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use mentra_core::{ModelClient, ModelError};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A minimal valid request: one skill, four weeks at ten hours.
pub fn sample_input() -> Value {
    json!({
        "skills": [{ "name": "Python", "level": "beginner" }],
        "goal": {
            "subject": "Machine Learning",
            "specificObjective": "Build a classifier",
            "depth": "intermediate"
        },
        "timeConstraints": { "totalWeeks": 4, "hoursPerWeek": 10 }
    })
}

/// The intermediate Python learner aiming at ML deployment, with padding
/// and optional schedule fields filled in.
pub fn ml_python_input() -> Value {
    json!({
        "skills": [
            { "name": "  Python  ", "level": "intermediate", "description": " pandas and numpy " },
            { "name": "Statistics", "level": "beginner" }
        ],
        "goal": {
            "subject": " Machine Learning ",
            "specificObjective": "Train and deploy a model",
            "depth": "intermediate"
        },
        "timeConstraints": {
            "totalWeeks": 4,
            "hoursPerWeek": 8,
            "preferredDays": ["monday", "wednesday"],
            "startDate": "2025-09-01"
        }
    })
}

// ---------------------------------------------------------------------------
// Roadmaps
// ---------------------------------------------------------------------------

/// Builder for roadmap documents in the model's reply format.
///
/// `build()` produces `{"roadmap": {...}}` with sequential week numbers,
/// `totalWeeks` equal to the week count and `totalEstimatedHours` equal to
/// the topic sum, unless overridden.
#[derive(Debug, Clone)]
pub struct RoadmapFixture {
    weeks: usize,
    topics_per_week: usize,
    hours_per_topic: f64,
    total_weeks: Option<Value>,
    total_hours: Option<Value>,
}

impl RoadmapFixture {
    pub fn new(weeks: usize) -> Self {
        Self {
            weeks,
            topics_per_week: 2,
            hours_per_topic: 4.0,
            total_weeks: None,
            total_hours: None,
        }
    }

    pub fn topics_per_week(mut self, n: usize) -> Self {
        self.topics_per_week = n;
        self
    }

    pub fn hours_per_topic(mut self, hours: f64) -> Self {
        self.hours_per_topic = hours;
        self
    }

    /// Declare a `totalWeeks` that may disagree with the week count.
    pub fn declared_weeks(mut self, total: impl Into<Value>) -> Self {
        self.total_weeks = Some(total.into());
        self
    }

    /// Declare a `totalEstimatedHours` that may disagree with the topic sum.
    pub fn declared_hours(mut self, total: impl Into<Value>) -> Self {
        self.total_hours = Some(total.into());
        self
    }

    pub fn computed_hours(&self) -> f64 {
        self.weeks as f64 * self.topics_per_week as f64 * self.hours_per_topic
    }

    pub fn build(&self) -> Value {
        let weeks: Vec<Value> = (1..=self.weeks)
            .map(|n| {
                let topics: Vec<Value> = (1..=self.topics_per_week)
                    .map(|t| {
                        let prerequisites = match (n, t) {
                            (1, 1) => json!([]),
                            (_, 1) => json!([format!("Topic {}.1", n - 1)]),
                            _ => json!([format!("Topic {n}.{}", t - 1)]),
                        };
                        json!({
                            "name": format!("Topic {n}.{t}"),
                            "description": format!("Material for topic {t} of week {n}"),
                            "estimatedHours": self.hours_per_topic,
                            "prerequisites": prerequisites,
                            "resources": [
                                { "type": "article", "title": format!("Reading {n}.{t}") }
                            ]
                        })
                    })
                    .collect();
                json!({
                    "weekNumber": n,
                    "title": format!("Week {n}"),
                    "topics": topics,
                    "weeklyGoal": format!("Finish the week {n} exercises"),
                    "sequencingExplanation": format!("Week {n} builds on the previous week")
                })
            })
            .collect();

        json!({
            "roadmap": {
                "weeks": weeks,
                "totalWeeks": self.total_weeks.clone().unwrap_or_else(|| json!(self.weeks)),
                "totalEstimatedHours": self
                    .total_hours
                    .clone()
                    .unwrap_or_else(|| json!(self.computed_hours())),
                "overallGoal": "Reach the learning objective",
                "prerequisiteAnalysis": "Starts from the learner's listed skills"
            }
        })
    }

    /// `build()` serialised as compact JSON text.
    pub fn to_text(&self) -> String {
        self.build().to_string()
    }
}

/// A consistent roadmap of `weeks` weeks with two four-hour topics each.
pub fn roadmap_value(weeks: usize) -> Value {
    RoadmapFixture::new(weeks).build()
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A prompt/system pair captured by [`ScriptedModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system: Option<String>,
}

/// A [`ModelClient`] that replays queued replies in order.
///
/// Once the queue is empty every call fails with
/// [`ModelError::RequestFailed`].
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model with a single successful reply.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().then_reply(text)
    }

    /// A model with a single failing reply.
    pub fn failing(error: ModelError) -> Self {
        Self::new().then_fail(error)
    }

    pub fn then_reply(mut self, text: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(text.into()));
        self
    }

    pub fn then_fail(mut self, error: ModelError) -> Self {
        self.replies.get_mut().push_back(Err(error));
        self
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError> {
        self.calls.lock().await.push(RecordedCall {
            prompt: prompt.to_string(),
            system: system.map(str::to_string),
        });
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::RequestFailed("no scripted reply left".to_string())))
    }
}
