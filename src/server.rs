//! HTTP surface of the relay.
//!
//! Every failure is turned into `{"error": ...}` here. Upstream detail is
//! logged and never forwarded to the client.

use crate::config::Config;
use crate::media::{infer_audio_mime, Payload};
use crate::models::{
    ErrorResponse, GeneratePromptRequest, GeneratedTextResponse, ProcessedTextResponse,
    StatusResponse,
};
use crate::relay::Relay;
use crate::{Error, Result};
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

pub const AUDIO_FIELD: &str = "audio_file";

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    relay: Option<Arc<Relay>>,
}

impl AppState {
    /// State backed by the Gemini relay. A missing credential leaves the relay
    /// unset, so requests fail with a config error instead of the process.
    pub fn from_config(config: Config, client: reqwest::Client) -> Self {
        let relay = match Relay::from_config(&config, client) {
            Ok(relay) => Some(Arc::new(relay)),
            Err(e) => {
                tracing::warn!("Relay disabled: {}", e);
                None
            }
        };

        Self {
            config: Arc::new(config),
            relay,
        }
    }

    pub fn with_relay(config: Config, relay: Option<Relay>) -> Self {
        Self {
            config: Arc::new(config),
            relay: relay.map(Arc::new),
        }
    }

    fn relay(&self) -> Result<&Relay> {
        self.relay
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate))
        .route("/process-audio", post(process_audio))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Error::Validation(_) | Error::PayloadTooLarge(_) => {
                tracing::warn!("Rejected request: {}", self)
            }
            _ => tracing::error!("Request failed ({}): {}", status, self),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.client_message(),
            }),
        )
            .into_response()
    }
}

/// GET / - liveness check
async fn index(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = if state.relay.is_some() {
        "API Key Configured"
    } else {
        "API Key MISSING!"
    };
    Json(StatusResponse {
        message: format!("Audio Processing API is running! Status: {}", status),
    })
}

/// POST /generate - plain text prompt
async fn generate(
    State(state): State<AppState>,
    body: std::result::Result<Json<GeneratePromptRequest>, JsonRejection>,
) -> Result<Json<GeneratedTextResponse>> {
    let relay = state.relay()?;

    let Json(body) = body.map_err(|e| {
        Error::Validation(format!(
            "Request must be JSON with a 'prompt' field: {}",
            e.body_text()
        ))
    })?;
    let prompt = body
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::Validation("Missing 'prompt' key in JSON request".to_string()))?;

    let span = tracing::info_span!("generate", request_id = %Uuid::new_v4());
    let generated_text = relay.generate_text(&prompt).instrument(span).await?;
    Ok(Json(GeneratedTextResponse { generated_text }))
}

/// POST /process-audio - multipart upload with an `audio_file` field
async fn process_audio(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessedTextResponse>> {
    let relay = state.relay()?;

    let multipart = multipart.map_err(|e| {
        Error::Validation(format!("Expected multipart form data: {}", e.body_text()))
    })?;
    let (file_name, bytes) = read_audio_field(multipart).await?;

    let staging_dir = state.config.staging_dir.as_deref();
    let span = tracing::info_span!(
        "process_audio",
        request_id = %Uuid::new_v4(),
        file = %file_name
    );
    async {
        let media_type = infer_audio_mime(&file_name);
        let payload = Payload::stage_locally(&bytes, &file_name, media_type, staging_dir).await?;

        let result = relay.process_audio(&payload).await;

        match payload.close() {
            Ok(path) => tracing::debug!("Temporary file cleaned up: {}", path.display()),
            Err(e) => tracing::warn!("Error removing temporary file: {}", e),
        }

        let processed_text = result?;
        tracing::info!("Processed audio into {} chars", processed_text.len());
        Ok::<_, Error>(Json(ProcessedTextResponse { processed_text }))
    }
    .instrument(span)
    .await
}

async fn read_audio_field(mut multipart: Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read form data", e))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(Error::Validation("No selected audio file".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read audio file", e))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(Error::Validation(format!(
        "Missing '{}' in request files",
        AUDIO_FIELD
    )))
}

/// Keeps axum's 413 for bodies over the upload limit; anything else is
/// malformed input.
fn multipart_error(context: &str, err: MultipartError) -> Error {
    let detail = format!("{}: {}", context, err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(detail)
    } else {
        Error::Validation(detail)
    }
}
