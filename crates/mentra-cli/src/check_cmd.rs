//! `mentra check-input` and `mentra check-roadmap`: run a validator over a
//! file without calling the model.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use mentra_core::generate::strip_code_fences;
use mentra_core::{InputValidator, OutputValidator, ValidationResult};

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_json(path: &Path, text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .with_context(|| format!("{} does not contain valid JSON", path.display()))
}

fn print_errors(what: &str, result: &ValidationResult) {
    eprintln!("{what} is invalid ({} errors):", result.errors.len());
    for err in &result.errors {
        eprintln!("  {err}");
    }
}

/// Validate a learning request. Prints the sanitized request on success.
/// Returns whether the request was valid.
pub fn run_check_input(path: &Path) -> Result<bool> {
    let raw = parse_json(path, &read_text(path)?)?;
    let outcome = InputValidator::shared().sanitize_and_validate(&raw);

    match outcome.sanitized_value {
        Some(sanitized) => {
            let json =
                serde_json::to_string_pretty(&sanitized).context("failed to render input")?;
            println!("{json}");
            Ok(true)
        }
        None => {
            print_errors("input", &outcome.result);
            Ok(false)
        }
    }
}

/// Validate a model reply (code fences allowed). Returns whether it was
/// valid.
pub fn run_check_roadmap(path: &Path, hour_tolerance: f64) -> Result<bool> {
    let text = read_text(path)?;
    let raw = parse_json(path, strip_code_fences(&text))?;
    let validator = OutputValidator::shared().clone().with_tolerance(hour_tolerance)?;
    let outcome = validator.validate_and_process(&raw);

    match outcome.processed {
        Some(validated) => {
            let roadmap = validated.roadmap();
            println!(
                "roadmap is valid: {} weeks, {} topics, {} hours",
                roadmap.weeks.len(),
                roadmap.weeks.iter().map(|w| w.topics.len()).sum::<usize>(),
                roadmap.total_estimated_hours
            );
            Ok(true)
        }
        None => {
            print_errors("roadmap", &outcome.result);
            Ok(false)
        }
    }
}
