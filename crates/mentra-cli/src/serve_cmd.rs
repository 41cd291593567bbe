use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::Instrument;
use uuid::Uuid;

use mentra_core::generate::ErrorKind;
use mentra_core::{GenerationResult, RoadmapGenerator, ValidationResult};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct InputCheckResponse {
    #[serde(flatten)]
    pub result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized: Option<Value>,
}

fn validity_status(result: &ValidationResult) -> StatusCode {
    if result.is_valid {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

fn generation_status(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::ParseError | ErrorKind::SchemaError | ErrorKind::UpstreamError) => {
            StatusCode::BAD_GATEWAY
        }
        Some(ErrorKind::InternalError) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(generator: Arc<RoadmapGenerator>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/validate/input", post(validate_input))
        .route("/api/validate/roadmap", post(validate_roadmap))
        .route("/api/roadmap", post(generate_roadmap))
        .layer(CorsLayer::permissive())
        .with_state(generator)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(generator: RoadmapGenerator, bind: &str, port: u16) -> Result<()> {
    let app = build_router(Arc::new(generator));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("mentra serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("mentra serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn validate_input(
    State(generator): State<Arc<RoadmapGenerator>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(raw) = body?;
    let outcome = generator.input_validator().sanitize_and_validate(&raw);
    let status = validity_status(&outcome.result);
    let response = InputCheckResponse {
        result: outcome.result,
        sanitized: outcome.sanitized_value,
    };
    Ok((status, Json(response)))
}

async fn validate_roadmap(
    State(generator): State<Arc<RoadmapGenerator>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(raw) = body?;
    let outcome = generator.output_validator().validate_and_process(&raw);
    Ok((validity_status(&outcome.result), Json(outcome.result)))
}

async fn generate_roadmap(
    State(generator): State<Arc<RoadmapGenerator>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(raw) = body?;
    let span = tracing::info_span!("roadmap_request", request_id = %Uuid::new_v4());
    let outcome = generator.generate(&raw).instrument(span.clone()).await;
    let status = generation_status(outcome.kind());
    if status != StatusCode::OK {
        span.in_scope(|| {
            tracing::warn!(status = status.as_u16(), kind = ?outcome.kind(), "roadmap request failed");
        });
    }
    Ok((status, Json(GenerationResult::from(outcome))))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
