//! HTTP surface for EchoBreak.
//!
//! A compact Axum router with four endpoints:
//!
//! - `GET /` – Liveness message with the active model.
//! - `GET /health` – Health payload with `model_loaded` and an RFC3339 timestamp.
//! - `POST /analyze` – Summarize `{"text": "..."}`. Returns the summary together with chunk
//!   counts, lengths, timing, and the model identifier. Errors come back as `{"error": "..."}`
//!   with `400` (no text or malformed body), `413` (input above the model's token ceiling), or
//!   `500` (summarization failed).
//! - `GET /metrics` – Request and chunk counters since startup.
//!
//! A panic inside a handler is answered with `500` and the same `{"error": "..."}` shape.

use crate::metrics::MetricsSnapshot;
use crate::pipeline::{PipelineError, SummaryApi, SummaryOutcome};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tower_http::catch_panic::CatchPanicLayer;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummaryApi + 'static,
{
    Router::new()
        .route("/", get(get_status::<S>))
        .route("/health", get(get_health::<S>))
        .route("/analyze", post(analyze::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(service)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown failure");
    tracing::error!(panic = message, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Internal server error: {message}") })),
    )
        .into_response()
}

/// Request body for `POST /analyze`.
#[derive(Deserialize)]
struct AnalyzeRequest {
    /// Article text to summarize.
    #[serde(default)]
    text: Option<String>,
}

/// Success response for `POST /analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Final summary text.
    pub summary: String,
    /// Identifier of the summarizer that produced the summary.
    pub model: String,
    /// Number of chunks the document was split into.
    pub chunks_processed: usize,
    /// Chunks skipped after a summarization error.
    pub chunks_failed: usize,
    /// Submitted text length in characters.
    pub original_length: usize,
    /// Summary length in characters.
    pub summary_length: usize,
    /// Pipeline duration, formatted as seconds (for example `"1.42s"`).
    pub processing_time: String,
    /// Whether the input was cut to the character budget.
    pub truncated: bool,
    /// Whether the joined partial summaries were summarized again.
    pub resummarized: bool,
    /// Always `"complete"` on success.
    pub progress: &'static str,
}

impl From<SummaryOutcome> for AnalyzeResponse {
    fn from(outcome: SummaryOutcome) -> Self {
        Self {
            summary: outcome.summary,
            model: outcome.model,
            chunks_processed: outcome.chunk_count,
            chunks_failed: outcome.chunks_failed,
            original_length: outcome.original_length,
            summary_length: outcome.summary_length,
            processing_time: format!("{:.2}s", outcome.elapsed.as_secs_f64()),
            truncated: outcome.truncated,
            resummarized: outcome.resummarized,
            progress: "complete",
        }
    }
}

/// Summarize the submitted text.
async fn analyze<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError>
where
    S: SummaryApi,
{
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected malformed analyze request");
        AppError(PipelineError::InvalidInput(format!(
            "Invalid JSON body: {}",
            rejection.body_text()
        )))
    })?;

    let outcome = service.summarize_text(request.text).await?;
    Ok(Json(AnalyzeResponse::from(outcome)))
}

/// Liveness payload for `GET /`.
async fn get_status<S>(State(service): State<Arc<S>>) -> Json<serde_json::Value>
where
    S: SummaryApi,
{
    Json(json!({
        "message": "EchoBreak is running!",
        "model": service.model_id(),
        "running": true,
    }))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model: String,
    timestamp: String,
}

async fn get_health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: SummaryApi,
{
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(HealthResponse {
        status: "healthy",
        model_loaded: service.model_loaded(),
        model: service.model_id().to_string(),
        timestamp,
    })
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: SummaryApi,
{
    Json(service.metrics_snapshot())
}

struct AppError(PipelineError);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::InputTooLong { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::Chunking(_) | PipelineError::SummarizationFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Analyze request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
