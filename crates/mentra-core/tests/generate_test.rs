//! End-to-end tests for the roadmap generator with a scripted model.

use std::sync::Arc;

use serde_json::{Value, json};

use mentra_core::generate::{ErrorKind, GenerationOutcome};
use mentra_core::{
    DefaultPromptBuilder, GenerationResult, ModelError, OutputValidator, RoadmapGenerator,
};
use mentra_test_utils::{RoadmapFixture, ScriptedModel, ml_python_input};

fn ml_request() -> Value {
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

fn generator(model: &Arc<ScriptedModel>) -> RoadmapGenerator {
    RoadmapGenerator::new(model.clone(), Arc::new(DefaultPromptBuilder))
}

#[tokio::test]
async fn four_week_ml_plan_succeeds() {
    let reply = RoadmapFixture::new(4).hours_per_topic(5.0).to_text();
    let model = Arc::new(ScriptedModel::replying(reply));

    let outcome = generator(&model).generate(&ml_request()).await;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let result = GenerationResult::from(outcome);
    assert!(result.success);
    assert!(result.error.is_none());
    assert!(result.raw_response.is_none());

    let roadmap = result.roadmap.expect("roadmap");
    assert_eq!(roadmap["totalWeeks"], 4);
    assert_eq!(roadmap["totalEstimatedHours"], 40.0);
    assert_eq!(roadmap["weeks"][3]["weekNumber"], 4);
    assert_eq!(model.call_count().await, 1);
}

#[tokio::test]
async fn prompt_reflects_the_sanitized_request() {
    let model = Arc::new(ScriptedModel::replying(RoadmapFixture::new(4).to_text()));
    let outcome = generator(&model).generate(&ml_python_input()).await;
    assert!(outcome.is_success(), "outcome: {outcome:?}");

    let calls = model.calls().await;
    let call = &calls[0];
    assert!(call.prompt.contains("- Python (intermediate): pandas and numpy"));
    assert!(call.prompt.contains("Machine Learning - Train and deploy a model"));
    assert!(call.prompt.contains("Preferred days: monday, wednesday"));
    assert!(!call.prompt.contains("  Python  "));
    assert!(call.system.as_deref().is_some_and(|s| s.contains("totalEstimatedHours")));
}

#[tokio::test]
async fn fenced_reply_is_accepted() {
    let reply = format!("```json\n{}\n```", RoadmapFixture::new(4).to_text());
    let model = Arc::new(ScriptedModel::replying(reply));
    let outcome = generator(&model).generate(&ml_request()).await;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_model() {
    let model = Arc::new(ScriptedModel::replying(RoadmapFixture::new(4).to_text()));
    let mut request = ml_request();
    request["goal"]["subject"] = json!("");

    let outcome = generator(&model).generate(&request).await;
    match &outcome {
        GenerationOutcome::InvalidInput { errors } => {
            assert_eq!(errors[0].field, "/goal/subject");
        }
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert_eq!(model.call_count().await, 0);

    let result = GenerationResult::from(outcome);
    assert_eq!(result.error.as_deref(), Some("Invalid input"));
    assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));
    assert!(result.raw_response.is_none());
}

#[tokio::test]
async fn unparseable_reply_is_returned_for_debugging() {
    let model = Arc::new(ScriptedModel::replying("Here is your roadmap: {weeks: 4"));
    let outcome = generator(&model).generate(&ml_request()).await;
    assert_eq!(outcome.kind(), Some(ErrorKind::ParseError));

    let result = GenerationResult::from(outcome);
    assert_eq!(result.error.as_deref(), Some("Failed to parse AI response as JSON"));
    assert_eq!(
        result.raw_response,
        Some(json!("Here is your roadmap: {weeks: 4"))
    );
}

#[tokio::test]
async fn inconsistent_reply_is_a_schema_error() {
    let reply = RoadmapFixture::new(3).declared_weeks(4).to_text();
    let model = Arc::new(ScriptedModel::replying(reply));
    let outcome = generator(&model).generate(&ml_request()).await;

    match &outcome {
        GenerationOutcome::SchemaError { errors, parsed } => {
            assert!(errors.iter().any(|e| e.field == "/roadmap/totalWeeks"));
            assert_eq!(parsed["roadmap"]["totalWeeks"], 4);
        }
        other => panic!("expected SchemaError, got {other:?}"),
    }

    let result = GenerationResult::from(outcome);
    assert_eq!(
        result.error.as_deref(),
        Some("AI response does not match expected schema")
    );
    assert!(result.details.as_ref().is_some_and(Value::is_array));
    assert_eq!(result.raw_response.as_ref().unwrap()["roadmap"]["totalWeeks"], 4);
}

#[tokio::test]
async fn provider_failure_is_not_retried() {
    let model = Arc::new(
        ScriptedModel::failing(ModelError::RateLimited("quota exhausted".to_string()))
            .then_reply(RoadmapFixture::new(4).to_text()),
    );
    let outcome = generator(&model).generate(&ml_request()).await;

    assert!(matches!(
        outcome,
        GenerationOutcome::UpstreamError(ModelError::RateLimited(_))
    ));
    assert_eq!(model.call_count().await, 1);

    let result = GenerationResult::from(outcome);
    assert_eq!(result.error.as_deref(), Some("AI provider request failed"));
    assert!(
        result
            .details
            .as_ref()
            .and_then(Value::as_str)
            .is_some_and(|d| d.contains("quota exhausted"))
    );
}

#[tokio::test]
async fn output_validator_override_is_used() {
    let reply = RoadmapFixture::new(4)
        .hours_per_topic(5.0)
        .declared_hours(41)
        .to_text();
    let model = Arc::new(ScriptedModel::replying(reply));
    let lenient = Arc::new(OutputValidator::new().unwrap().with_tolerance(1.5).unwrap());

    let outcome = generator(&model)
        .with_output_validator(lenient)
        .generate(&ml_request())
        .await;
    assert!(outcome.is_success(), "outcome: {outcome:?}");
}

#[tokio::test]
async fn generator_is_shareable_across_tasks() {
    let model = Arc::new(
        ScriptedModel::replying(RoadmapFixture::new(4).to_text())
            .then_reply(RoadmapFixture::new(4).to_text()),
    );
    let generator = Arc::new(generator(&model));

    let a = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(&ml_request()).await.is_success() }
    });
    let b = tokio::spawn({
        let generator = generator.clone();
        async move { generator.generate(&ml_request()).await.is_success() }
    });

    assert!(a.await.unwrap());
    assert!(b.await.unwrap());
    assert_eq!(model.call_count().await, 2);
}
