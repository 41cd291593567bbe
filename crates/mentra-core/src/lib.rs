//! Validation and consistency enforcement for model-generated learning roadmaps.
//!
//! The crate is organised as two leaf validators plus the orchestrator that
//! glues them around a single model call:
//!
//! ```text
//! raw request --> input::InputValidator --> prompt::PromptBuilder
//!                                                  |
//!                                                  v
//!                                          model::ModelClient
//!                                                  |
//!              GenerationOutcome <-- output::OutputValidator <-- JSON text
//! ```
//!
//! Invalid data is never an `Err`: both validators report it through a
//! [`validation::ValidationResult`], and [`generate::RoadmapGenerator`] folds
//! every failure mode into a [`generate::GenerationOutcome`].

pub mod generate;
pub mod input;
pub mod model;
pub mod output;
pub mod prompt;
pub mod roadmap;
pub mod schema;
pub mod validation;

pub use generate::{ErrorKind, GenerationOutcome, GenerationResult, RoadmapGenerator, strip_code_fences};
pub use input::{InputOutcome, InputValidator, UserInput, sanitize_and_validate};
pub use model::{GeminiClient, ModelClient, ModelConfig, ModelError};
pub use output::{HOUR_SUM_TOLERANCE, InvalidTolerance, OutputOutcome, OutputValidator, validate_and_process};
pub use prompt::{DefaultPromptBuilder, PromptBuilder};
pub use roadmap::{Roadmap, RoadmapOutput, ValidatedRoadmap};
pub use validation::{ValidationError, ValidationResult, ViolationParams};
