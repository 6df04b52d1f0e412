//! Blocking HTTP client for the Gemini API.

use crate::wire::{GenerateRequest, GenerateResponse};
use quizzard_core::{build_prompt, Error, Generator, Result};
use std::time::Duration;

/// Public Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `generateContent` URL for the configured model, without the key.
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// [`Generator`] backed by the Gemini `generateContent` endpoint.
///
/// One request per call; no retries.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::GenerationError("Missing Gemini API key".to_string()));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::GenerationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

impl Generator for GeminiClient {
    fn generate(&self, corpus: &str, instruction: &str) -> Result<Option<String>> {
        let prompt = build_prompt(corpus, instruction);
        log::debug!(
            "Requesting {} ({} prompt bytes)",
            self.config.model,
            prompt.len()
        );

        // Errors are stripped of the URL so the key never reaches the logs
        let response = self
            .http
            .post(self.config.url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .map_err(|e| Error::GenerationError(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::GenerationError(format!(
                "Gemini returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|e| Error::GenerationError(format!("Invalid response body: {}", e.without_url())))?;

        Ok(body.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::new("secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            config.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_url_with_custom_endpoint_and_model() {
        let config = GeminiConfig::new("secret")
            .with_endpoint("http://localhost:8080/v1/")
            .with_model("gemini-1.5-flash");
        assert_eq!(
            config.url(),
            "http://localhost:8080/v1/models/gemini-1.5-flash:generateContent"
        );
        assert!(!config.url().contains("secret"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new(GeminiConfig::new("  ")),
            Err(Error::GenerationError(_))
        ));
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let config = GeminiConfig::new("secret")
            .with_endpoint("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = GeminiClient::new(config).unwrap();

        match client.generate("corpus", "instruction") {
            Err(Error::GenerationError(message)) => assert!(!message.contains("secret")),
            other => panic!("expected a generation error, got {:?}", other),
        }
    }
}
