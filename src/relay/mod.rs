//! Request pipelines composed from the file stager and the content generator.

pub mod mock;

pub use mock::{MockContentGenerator, MockFileStager};

use crate::config::Config;
use crate::gemini::{
    ContentGenerator, FileStager, GeminiFileClient, GeminiGenerateClient, GeminiHttpClient,
};
use crate::media::Payload;
use crate::models::{GenerationRequest, Workload};
use crate::{prompts, Result};
use tracing::{info, warn};

/// Stateless relay shared by every request handler.
pub struct Relay {
    stager: Box<dyn FileStager>,
    generator: Box<dyn ContentGenerator>,
    delete_uploads: bool,
}

/// Injectable service bundle used to construct [`Relay`] in tests.
pub struct RelayServices {
    pub stager: Box<dyn FileStager>,
    pub generator: Box<dyn ContentGenerator>,
}

impl Relay {
    pub fn with_services(services: RelayServices, delete_uploads: bool) -> Self {
        Self {
            stager: services.stager,
            generator: services.generator,
            delete_uploads,
        }
    }

    /// Build the Gemini-backed relay. Fails with `Error::Config` when no
    /// credential is configured.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self> {
        let http = GeminiHttpClient::new(
            config.require_api_key()?.to_string(),
            config.model.clone(),
            config.base_url.clone(),
            client,
        );
        info!("Gemini relay using model {}", http.model());

        Ok(Self::with_services(
            RelayServices {
                stager: Box::new(GeminiFileClient::new(http.clone(), config.upload_timeout)),
                generator: Box::new(GeminiGenerateClient::new(
                    http,
                    config.text_timeout,
                    config.audio_timeout,
                )),
            },
            config.delete_uploads,
        ))
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest::text(prompt)?;
        let preview: String = prompt.chars().take(50).collect();
        info!("Generating text for prompt: '{}...'", preview);
        self.generator
            .generate(&request, Workload::for_request(&request))
            .await
    }

    /// Stage the payload upstream, then ask for the audio analysis.
    pub async fn process_audio(&self, payload: &Payload) -> Result<String> {
        let reference = self.stager.stage(payload).await?;
        info!(
            "Calling generateContent for file URI: {}",
            reference.retrieval_uri
        );

        let request = GenerationRequest::with_media(reference.clone(), prompts::AUDIO_ANALYSIS)?;
        let result = self
            .generator
            .generate(&request, Workload::for_request(&request))
            .await;

        if self.delete_uploads {
            if let Err(e) = self.stager.delete(&reference).await {
                warn!("Failed to delete staged file {}: {}", reference.id, e);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestPart, UploadReference};
    use crate::Error;

    fn reference() -> UploadReference {
        UploadReference {
            id: "files/abc".to_string(),
            retrieval_uri: "https://example.com/files/abc".to_string(),
            media_type: "audio/wav".to_string(),
        }
    }

    fn relay(stager: MockFileStager, generator: MockContentGenerator, delete: bool) -> Relay {
        Relay::with_services(
            RelayServices {
                stager: Box::new(stager),
                generator: Box::new(generator),
            },
            delete,
        )
    }

    async fn payload(dir: &tempfile::TempDir) -> Payload {
        Payload::stage_locally(b"wav", "a.wav", "audio/wav".to_string(), Some(dir.path()))
            .await
            .unwrap()
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let result = Relay::from_config(&Config::default(), reqwest::Client::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_generate_text_passes_prompt_through() {
        let generator = MockContentGenerator::new().with_response("Hello!".to_string());
        let relay = relay(MockFileStager::new(reference()), generator.clone(), false);

        assert_eq!(relay.generate_text("Say hello").await.unwrap(), "Hello!");

        let requests = generator.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, Workload::Text);
        assert_eq!(
            requests[0].0.parts(),
            &[RequestPart::Text("Say hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_prompt_never_reaches_generator() {
        let generator = MockContentGenerator::new();
        let relay = relay(MockFileStager::new(reference()), generator.clone(), false);

        let err = relay.generate_text("").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(generator.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_process_audio_grounds_generation_in_upload() {
        let dir = tempfile::tempdir().unwrap();
        let stager = MockFileStager::new(reference());
        let generator = MockContentGenerator::new().with_response("TRANSCRIPT".to_string());
        let relay = relay(stager.clone(), generator.clone(), false);

        let text = relay.process_audio(&payload(&dir).await).await.unwrap();
        assert_eq!(text, "TRANSCRIPT");
        assert_eq!(stager.get_stage_count(), 1);
        assert_eq!(stager.get_delete_count(), 0);

        let requests = generator.get_requests();
        assert_eq!(requests[0].1, Workload::Audio);
        assert_eq!(
            requests[0].0.parts(),
            &[
                RequestPart::Media(reference()),
                RequestPart::Text(prompts::AUDIO_ANALYSIS.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_failure_skips_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = MockContentGenerator::new();
        let relay = relay(
            MockFileStager::new(reference()).with_failure("connection reset".to_string()),
            generator.clone(),
            true,
        );

        let err = relay.process_audio(&payload(&dir).await).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(generator.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_uploads_runs_even_when_generation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stager = MockFileStager::new(reference());
        let relay = relay(
            stager.clone(),
            MockContentGenerator::new().with_failure("boom".to_string()),
            true,
        );

        assert!(relay.process_audio(&payload(&dir).await).await.is_err());
        assert_eq!(stager.get_delete_count(), 1);
    }
}
