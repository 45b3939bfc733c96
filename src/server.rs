//! HTTP surface: a health check and the summarize endpoint.
//!
//! Every request runs the same linear pipeline (credential check, body,
//! transcript, summary) and ends in exactly one JSON response.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::summarize::{CompletionBackend, Summarizer};
use crate::youtube::{CaptionSource, TranscriptFetcher};

/// Returned as a successful summary when the completion backend fails
pub const SUMMARY_FAILED: &str = "Summary failed";

const NOT_CONFIGURED: &str = "Groq API not configured. Please set GROQ_API_KEY environment variable.";
const URL_MISSING: &str = "URL missing";
const INVALID_BODY: &str = "Invalid JSON body";
const TRANSCRIPT_NOT_FOUND: &str = "Transcript not found";

/// Shared, read-only state built once at startup
pub struct AppState<C, B> {
    transcripts: Arc<TranscriptFetcher<C>>,
    summarizer: Option<Arc<Summarizer<B>>>,
    api_key_configured: bool,
}

impl<C, B> AppState<C, B> {
    /// `summarizer` is `None` when no completion client could be built; the
    /// service then runs degraded and `/summarize` always answers 500.
    pub fn new(
        transcripts: TranscriptFetcher<C>,
        summarizer: Option<Summarizer<B>>,
        api_key_configured: bool,
    ) -> Self {
        Self {
            transcripts: Arc::new(transcripts),
            summarizer: summarizer.map(Arc::new),
            api_key_configured,
        }
    }
}

impl<C, B> Clone for AppState<C, B> {
    fn clone(&self) -> Self {
        Self {
            transcripts: Arc::clone(&self.transcripts),
            summarizer: self.summarizer.clone(),
            api_key_configured: self.api_key_configured,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub api_key_configured: bool,
}

/// JSON error body with its HTTP status
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router<C, B>(state: AppState<C, B>) -> Router
where
    C: CaptionSource + Send + Sync + 'static,
    B: CompletionBackend + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health::<C, B>))
        .route("/summarize", post(summarize::<C, B>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health<C, B>(State(state): State<AppState<C, B>>) -> Json<HealthResponse>
where
    C: CaptionSource + Send + Sync + 'static,
    B: CompletionBackend + Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "YouTube Video Summarizer API".to_string(),
        api_key_configured: state.api_key_configured,
    })
}

async fn summarize<C, B>(
    State(state): State<AppState<C, B>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> ApiResult<Json<SummarizeResponse>>
where
    C: CaptionSource + Send + Sync + 'static,
    B: CompletionBackend + Send + Sync + 'static,
{
    let Some(summarizer) = state.summarizer.as_deref() else {
        return Err(ApiError::internal(NOT_CONFIGURED));
    };

    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected request body: {rejection}");
        ApiError::bad_request(INVALID_BODY)
    })?;

    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::bad_request(URL_MISSING))?;

    info!("Getting transcript for URL: {url}");
    let text = match state.transcripts.fetch(url).await {
        Ok(transcript) => {
            debug!(
                "Transcript for {}: {} segments, lang={} ({})",
                transcript.video_id,
                transcript.segments.len(),
                transcript.language,
                transcript.kind
            );
            transcript.text()
        }
        Err(e) => {
            warn!("Transcript error: {e}");
            String::new()
        }
    };

    if text.is_empty() {
        return Err(ApiError::not_found(TRANSCRIPT_NOT_FOUND));
    }

    let summary = match summarizer.summarize(&text).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Groq summarization error: {e}");
            SUMMARY_FAILED.to_string()
        }
    };

    Ok(Json(SummarizeResponse { summary }))
}
