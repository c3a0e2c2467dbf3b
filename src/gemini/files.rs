//! Gemini File API staging.
//!
//! Uploads a request's payload as multipart form data and normalizes the two
//! response shapes the service returns into an [`UploadReference`].

use super::client::GeminiHttpClient;
use super::types::{FileRecord, UploadResponse};
use super::FileStager;
use crate::media::Payload;
use crate::models::UploadReference;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

const DELETE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GeminiFileClient {
    http: GeminiHttpClient,
    upload_timeout: Duration,
}

impl GeminiFileClient {
    pub fn new(http: GeminiHttpClient, upload_timeout: Duration) -> Self {
        Self {
            http,
            upload_timeout,
        }
    }

    /// Maps a decoded upload response onto an [`UploadReference`].
    ///
    /// The flat shape is only trusted when its name looks like a File API
    /// resource; anything else fails closed.
    pub fn normalize(response: UploadResponse, declared_type: &str) -> Result<UploadReference> {
        let record = match response {
            UploadResponse::Nested { file } => file,
            UploadResponse::Flat(record) if record.name.starts_with("files/") => record,
            UploadResponse::Flat(record) => {
                return Err(Error::UpstreamFormat(format!(
                    "Upload response name '{}' is not a file resource",
                    record.name
                )))
            }
        };

        Ok(Self::into_reference(record, declared_type))
    }

    fn into_reference(record: FileRecord, declared_type: &str) -> UploadReference {
        UploadReference {
            id: record.name,
            retrieval_uri: record.uri,
            media_type: record
                .mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| declared_type.to_string()),
        }
    }
}

#[async_trait]
impl FileStager for GeminiFileClient {
    async fn stage(&self, payload: &Payload) -> Result<UploadReference> {
        tracing::info!(
            "Uploading '{}' ({} bytes, {}) to Gemini File API",
            payload.file_name(),
            payload.len(),
            payload.media_type()
        );

        let part = Part::bytes(payload.read().await?)
            .file_name(payload.file_name().to_string())
            .mime_str(payload.media_type())
            .map_err(|e| Error::Validation(format!("Invalid media type: {}", e.without_url())))?;
        let form = Form::new().part("file", part);

        let response: UploadResponse = self
            .http
            .post_multipart(&self.http.files_url(), form, self.upload_timeout)
            .await
            .map_err(|e| match e {
                Error::UpstreamHttp { status, .. } => Error::Transport(format!(
                    "File upload rejected by Gemini with status {}",
                    status
                )),
                Error::Timeout(detail) => {
                    Error::Transport(format!("File upload timed out: {}", detail))
                }
                Error::UpstreamFormat(detail) => Error::UpstreamFormat(format!(
                    "Upload succeeded but response lacked file details: {}",
                    detail
                )),
                other => other,
            })?;

        let reference = Self::normalize(response, payload.media_type())?;
        tracing::info!(
            "File upload successful. Name: {}, URI: {}",
            reference.id,
            reference.retrieval_uri
        );
        Ok(reference)
    }

    async fn delete(&self, reference: &UploadReference) -> Result<()> {
        self.http
            .delete(&self.http.file_url(&reference.id), DELETE_TIMEOUT)
            .await?;
        tracing::info!("Deleted staged Gemini file {}", reference.id);
        Ok(())
    }
}
