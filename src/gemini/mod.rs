//! Gemini API integration for file staging and content generation.

pub mod client;
pub mod files;
pub mod generate;
pub mod types;

pub use client::GeminiHttpClient;
pub use files::GeminiFileClient;
pub use generate::GeminiGenerateClient;

use crate::media::Payload;
use crate::models::{GenerationRequest, UploadReference, Workload};
use crate::Result;
use async_trait::async_trait;

/// Stages a local payload with the upstream provider.
#[async_trait]
pub trait FileStager: Send + Sync {
    async fn stage(&self, payload: &Payload) -> Result<UploadReference>;
    async fn delete(&self, reference: &UploadReference) -> Result<()>;
}

/// Sends a generation request upstream and returns the extracted text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest, workload: Workload) -> Result<String>;
}
