//! Data models and structures
//!
//! Defines the request-scoped relay types and the JSON bodies exchanged with
//! the relay's clients.

use crate::gemini::types::{Content, FileData, GenerateContentRequest, Part};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A file staged with the upstream File API, usable once in a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReference {
    /// Upstream resource name, e.g. `files/abc123`.
    pub id: String,
    pub retrieval_uri: String,
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Text(String),
    Media(UploadReference),
}

/// Ordered parts of a single-turn generation request.
///
/// Only constructible through [`GenerationRequest::text`] and
/// [`GenerationRequest::with_media`], which guarantee at least one part and,
/// for media requests, exactly one media part plus one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    parts: Vec<RequestPart>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(Error::Validation(
                "Missing 'prompt' key in JSON request".to_string(),
            ));
        }
        Ok(Self {
            parts: vec![RequestPart::Text(prompt)],
        })
    }

    pub fn with_media(reference: UploadReference, instruction: impl Into<String>) -> Result<Self> {
        let instruction = instruction.into();
        if instruction.trim().is_empty() {
            return Err(Error::Validation(
                "Media requests need an instruction prompt".to_string(),
            ));
        }
        Ok(Self {
            parts: vec![
                RequestPart::Media(reference),
                RequestPart::Text(instruction),
            ],
        })
    }

    pub fn parts(&self) -> &[RequestPart] {
        &self.parts
    }

    pub fn has_media(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, RequestPart::Media(_)))
    }

    /// Upstream wire shape: one user turn carrying every part in order.
    pub fn to_wire(&self) -> GenerateContentRequest {
        let parts = self
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Text(text) => Part::Text { text: text.clone() },
                RequestPart::Media(reference) => Part::FileData {
                    file_data: FileData {
                        mime_type: reference.media_type.clone(),
                        file_uri: reference.retrieval_uri.clone(),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        }
    }
}

/// Selects the timeout budget for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Text,
    Audio,
}

impl Workload {
    /// Requests grounded on staged media get the long budget.
    pub fn for_request(request: &GenerationRequest) -> Self {
        if request.has_media() {
            Workload::Audio
        } else {
            Workload::Text
        }
    }
}

// Relay HTTP bodies
#[derive(Debug, Deserialize)]
pub struct GeneratePromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedTextResponse {
    pub generated_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessedTextResponse {
    pub processed_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
