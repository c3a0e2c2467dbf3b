//! Relay configuration
//!
//! Built once at startup and handed to each component, so tests can point the
//! relay at a mock upstream with a fake credential.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub host: String,
    pub port: u16,
    pub text_timeout: Duration,
    pub audio_timeout: Duration,
    pub upload_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Directory for request-scoped upload files; `None` uses the system temp dir.
    pub staging_dir: Option<PathBuf>,
    pub delete_uploads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            text_timeout: Duration::from_secs(60),
            audio_timeout: Duration::from_secs(300),
            upload_timeout: Duration::from_secs(120),
            max_upload_bytes: 100 * 1024 * 1024,
            staging_dir: None,
            delete_uploads: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("text_timeout", &self.text_timeout)
            .field("audio_timeout", &self.audio_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("staging_dir", &self.staging_dir)
            .field("delete_uploads", &self.delete_uploads)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key: var("GEMINI_API_KEY"),
            base_url: var("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: var("GEMINI_MODEL").unwrap_or(defaults.model),
            host: var("RELAY_HOST").unwrap_or(defaults.host),
            port: parse_var("RELAY_PORT", var("RELAY_PORT"))?.unwrap_or(defaults.port),
            text_timeout: parse_var("TEXT_TIMEOUT_SECS", var("TEXT_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.text_timeout),
            audio_timeout: parse_var("AUDIO_TIMEOUT_SECS", var("AUDIO_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.audio_timeout),
            upload_timeout: parse_var("UPLOAD_TIMEOUT_SECS", var("UPLOAD_TIMEOUT_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_timeout),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", var("MAX_UPLOAD_BYTES"))?
                .unwrap_or(defaults.max_upload_bytes),
            staging_dir: var("STAGING_DIR").map(PathBuf::from),
            delete_uploads: parse_bool("GEMINI_DELETE_UPLOADS", var("GEMINI_DELETE_UPLOADS"))?
                .unwrap_or(defaults.delete_uploads),
        })
    }

    /// The configured credential, or `Error::Config` when it is missing.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw)))
        })
        .transpose()
}

fn parse_bool(key: &str, value: Option<String>) -> Result<Option<bool>> {
    value
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::Config(format!(
                "{} must be a boolean, got '{}'",
                key, raw
            ))),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.port, 5000);
        assert_eq!(config.text_timeout, Duration::from_secs(60));
        assert_eq!(config.audio_timeout, Duration::from_secs(300));
        assert_eq!(config.upload_timeout, Duration::from_secs(120));
        assert!(!config.delete_uploads);
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_BASE_URL", "http://localhost:9999/"),
            ("RELAY_PORT", "8080"),
            ("TEXT_TIMEOUT_SECS", "5"),
            ("GEMINI_DELETE_UPLOADS", "yes"),
            ("STAGING_DIR", "/tmp/relay"),
        ]))
        .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.port, 8080);
        assert_eq!(config.text_timeout, Duration::from_secs(5));
        assert!(config.delete_uploads);
        assert_eq!(config.staging_dir, Some(PathBuf::from("/tmp/relay")));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert!(matches!(config.require_api_key(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[("RELAY_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_bool_is_config_error() {
        let err =
            Config::from_lookup(lookup_from(&[("GEMINI_DELETE_UPLOADS", "maybe")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
