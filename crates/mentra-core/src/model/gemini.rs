use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ModelClient, ModelError};

/// Connection settings for [`GeminiClient`].
///
/// [`ModelConfig::from_env`] reads `GEMINI_API_KEY`, `MENTRA_MODEL` and
/// `MENTRA_MODEL_BASE_URL`, falling back to the defaults below.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ModelConfig {
    pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Config with the given key and default model, endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Build a config from the environment. The key defaults to empty,
    /// which the provider will reject.
    pub fn from_env() -> Self {
        let mut config = Self::new(env::var("GEMINI_API_KEY").unwrap_or_default());
        if let Ok(model) = env::var("MENTRA_MODEL") {
            config.model = model;
        }
        if let Ok(url) = env::var("MENTRA_MODEL_BASE_URL") {
            config.base_url = url;
        }
        config
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full `generateContent` endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    config: ModelConfig,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

fn build_request(prompt: &str, system: Option<&str>) -> GenerateRequest {
    GenerateRequest {
        system_instruction: system.map(|text| Content {
            role: None,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }),
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, ModelError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::EmptyResponse("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(ModelError::EmptyResponse(format!("finish reason: {reason}")));
    }
    Ok(text)
}

fn map_status(status: StatusCode, body: String) -> ModelError {
    match status.as_u16() {
        401 | 403 => ModelError::AuthFailed(format!("{status}: {body}")),
        429 => ModelError::RateLimited(format!("{status}: {body}")),
        _ => ModelError::RequestFailed(format!("{status}: {body}")),
    }
}

fn map_transport(error: reqwest::Error) -> ModelError {
    if error.is_timeout() {
        ModelError::RequestFailed(format!("request timed out: {error}"))
    } else if error.is_connect() {
        ModelError::RequestFailed(format!("connection error: {error}"))
    } else {
        ModelError::RequestFailed(error.to_string())
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String, ModelError> {
        let request = build_request(prompt, system);
        tracing::debug!(model = %self.config.model, prompt_chars = prompt.len(), "calling gemini");

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(map_status(status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        extract_text(parsed)
    }
}
