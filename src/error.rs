//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror. Every
//! variant maps to one client-facing status code; the upstream detail carried
//! by a variant is for server-side logs only.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream transport error: {0}")]
    Transport(String),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Upstream API error (status {status}): {body}")]
    UpstreamHttp { status: StatusCode, body: String },

    #[error("Unexpected upstream response: {0}")]
    UpstreamFormat(String),

    #[error("Content generation stopped unexpectedly. Reason: {reason}")]
    GenerationStopped { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs carry the API key as a query parameter.
        let err = err.without_url();
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl Error {
    /// HTTP status returned to the relay's client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::UpstreamHttp { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Error::Config(_)
            | Error::UpstreamFormat(_)
            | Error::GenerationStopped { .. }
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the relay's client.
    ///
    /// Upstream bodies and transport detail never appear here.
    pub fn client_message(&self) -> String {
        match self {
            Error::Config(_) => "API key not configured on the server".to_string(),
            Error::Validation(msg) => msg.clone(),
            Error::PayloadTooLarge(_) => "Uploaded file is too large".to_string(),
            Error::Transport(_) => {
                "Failed to communicate with the backend generative API".to_string()
            }
            Error::Timeout(_) => "Processing service request timed out".to_string(),
            Error::UpstreamHttp { .. } => {
                "Failed to communicate with the backend generative API".to_string()
            }
            Error::UpstreamFormat(_) => {
                "Failed to parse response from processing service".to_string()
            }
            Error::GenerationStopped { reason } => {
                format!("Content generation stopped unexpectedly. Reason: {}", reason)
            }
            Error::Io(_) => "An internal server error occurred".to_string(),
        }
    }
}
