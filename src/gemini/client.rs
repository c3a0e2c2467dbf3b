use crate::{Error, Result};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Lightweight Gemini REST client shared by the file and generation modules.
///
/// The credential travels as the `key` query parameter, so URLs are stripped
/// from every error before it is logged.
#[derive(Clone)]
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` may be given with or without the `models/` prefix.
    pub fn new(api_key: String, model: String, base_url: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            client,
            api_key,
            model,
            base_url,
        }
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    pub fn files_url(&self) -> String {
        format!("{}/v1beta/files", self.base_url)
    }

    /// URL of a staged file, given its `files/...` resource name.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name)
    }

    pub async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp> {
        let builder = self.client.post(url).json(request);
        let response = self.send(builder, timeout).await?;
        Self::parse_body(response).await
    }

    pub async fn post_multipart<Resp: DeserializeOwned>(
        &self,
        url: &str,
        form: Form,
        timeout: Duration,
    ) -> Result<Resp> {
        let builder = self.client.post(url).multipart(form);
        let response = self.send(builder, timeout).await?;
        Self::parse_body(response).await
    }

    pub async fn delete(&self, url: &str, timeout: Duration) -> Result<()> {
        let builder = self.client.delete(url);
        self.send(builder, timeout).await?;
        Ok(())
    }

    async fn send(&self, builder: RequestBuilder, timeout: Duration) -> Result<Response> {
        let response = builder
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let err = Error::from(e);
                tracing::error!("Failed to send request to Gemini: {}", err);
                err
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = describe_error_body(&response.text().await?);
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(Error::UpstreamHttp { status, body });
        }

        Ok(response)
    }

    async fn parse_body<Resp: DeserializeOwned>(response: Response) -> Result<Resp> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::UpstreamFormat(format!("Failed to parse Gemini response: {}", e))
        })
    }
}

/// Compact JSON rendering of an upstream error body, or the raw text when it
/// is not JSON.
fn describe_error_body(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value.to_string(),
        Err(_) => raw.to_string(),
    }
}
