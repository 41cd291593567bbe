//! Language-model client interface.
//!
//! The orchestrator only knows the [`ModelClient`] trait: text in, text or
//! [`ModelError`] out, one attempt per call. [`GeminiClient`] is the stock
//! implementation.

mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiClient, ModelConfig};

/// Failures from the model provider. None of them are retried by this crate.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider rejected credentials: {0}")]
    AuthFailed(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider request failed: {0}")]
    RequestFailed(String),

    #[error("provider returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("provider returned no text: {0}")]
    EmptyResponse(String),

    #[error("failed to build provider client: {0}")]
    Client(String),
}

/// Adapter interface for a text-completion provider.
///
/// Object-safe so it can be held as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Short provider name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt`, with an optional system instruction, and return the
    /// response text.
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError>;
}

// Compile-time assertion: ModelClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModelClient) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError> {
            Ok(format!("{}|{prompt}", system.unwrap_or("-")))
        }
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let model: Box<dyn ModelClient> = Box::new(EchoModel);
        assert_eq!(model.name(), "echo");
        assert_eq!(model.complete("hi", None).await.unwrap(), "-|hi");
        assert_eq!(model.complete("hi", Some("sys")).await.unwrap(), "sys|hi");
    }

    #[test]
    fn errors_render_provider_detail() {
        let err = ModelError::RateLimited("quota exhausted".to_string());
        assert_eq!(err.to_string(), "provider rate limit exceeded: quota exhausted");
    }
}
