//! Gemini `generateContent` relay.

use super::client::GeminiHttpClient;
use super::types::GenerateContentResponse;
use super::ContentGenerator;
use crate::models::{GenerationRequest, Workload};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Finish reason reported for a normal, complete generation.
pub const NORMAL_FINISH_REASON: &str = "STOP";

pub struct GeminiGenerateClient {
    http: GeminiHttpClient,
    text_timeout: Duration,
    audio_timeout: Duration,
}

impl GeminiGenerateClient {
    pub fn new(http: GeminiHttpClient, text_timeout: Duration, audio_timeout: Duration) -> Self {
        Self {
            http,
            text_timeout,
            audio_timeout,
        }
    }

    fn timeout_for(&self, workload: Workload) -> Duration {
        match workload {
            Workload::Text => self.text_timeout,
            Workload::Audio => self.audio_timeout,
        }
    }

    /// Pulls the text of the first candidate out of a `generateContent` reply.
    ///
    /// Part texts are concatenated with no separator before trimming, so a
    /// multi-part candidate is not newline-joined.
    ///
    /// Empty text is only a success when generation ended normally or the
    /// upstream gave no finish reason at all.
    pub fn extract_text(response: &GenerateContentResponse) -> Result<String> {
        let candidate = response.candidates.first().ok_or_else(|| {
            let block_reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            tracing::error!(
                "No candidates found in Gemini response (block reason: {:?})",
                block_reason
            );
            Error::UpstreamFormat(match block_reason {
                Some(reason) => format!("Gemini returned no candidates (blocked: {})", reason),
                None => "Gemini returned no candidates".to_string(),
            })
        })?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .map(|part| part.text.as_deref().unwrap_or_default())
            .collect();
        let text = text.trim();

        if !text.is_empty() {
            return Ok(text.to_string());
        }

        match candidate.finish_reason.as_deref() {
            Some(NORMAL_FINISH_REASON) => {
                tracing::warn!("Gemini finished normally with empty text");
                Ok(String::new())
            }
            None => {
                tracing::warn!("Gemini returned empty text without a finish reason");
                Ok(String::new())
            }
            Some(reason) => {
                tracing::error!("Gemini returned empty text. Finish reason: {}", reason);
                Err(Error::GenerationStopped {
                    reason: reason.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerateClient {
    async fn generate(&self, request: &GenerationRequest, workload: Workload) -> Result<String> {
        tracing::debug!(
            "Calling Gemini generateContent with {} part(s), model {}",
            request.parts().len(),
            self.http.model()
        );

        let response: GenerateContentResponse = self
            .http
            .post_json(
                &self.http.generate_content_url(),
                &request.to_wire(),
                self.timeout_for(workload),
            )
            .await?;

        let text = Self::extract_text(&response)?;
        tracing::info!("Gemini generated {} chars", text.len());
        Ok(text)
    }
}
