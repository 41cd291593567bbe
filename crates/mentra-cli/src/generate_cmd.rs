//! `mentra generate`: one roadmap request against the configured model.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use mentra_core::{
    DefaultPromptBuilder, GeminiClient, GenerationResult, OutputValidator, RoadmapGenerator,
};

use crate::config::MentraConfig;

/// Build the generator used by `generate` and `serve`.
pub fn build_generator(config: &MentraConfig) -> Result<RoadmapGenerator> {
    let client = GeminiClient::new(config.model_config()?).context("failed to create model client")?;
    let output = OutputValidator::shared().clone().with_tolerance(config.hour_tolerance)?;
    Ok(
        RoadmapGenerator::new(Arc::new(client), Arc::new(DefaultPromptBuilder))
            .with_output_validator(Arc::new(output)),
    )
}

/// Run the generator on the request in `input` and write the result JSON to
/// `output` (or stdout). Returns whether generation succeeded.
pub async fn run_generate(
    generator: &RoadmapGenerator,
    input: &Path,
    output: Option<&Path>,
) -> Result<bool> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let raw: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} does not contain valid JSON", input.display()))?;

    let outcome = generator.generate(&raw).await;
    let kind = outcome.kind();
    let result = GenerationResult::from(outcome);
    let json = serde_json::to_string_pretty(&result).context("failed to render result")?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Result written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(kind) = kind {
        eprintln!(
            "generation failed ({kind}): {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(result.success)
}
