//! HTTP client for the `generateContent` endpoint.

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::{classify_http_failure, GenAiError};
use crate::models::{GenerateContentRequest, GenerateContentResponse};

/// Default base URL of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Upper bound on each request, including connect and body read.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Client for the hosted generative-text API.
pub struct GeminiClient {
    http: Client,
    config: ClientConfig,
}

/// Error envelope returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self, GenAiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GenAiError::Network)?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        )
    }

    /// Send one generation request and return the decoded response.
    ///
    /// Non-success statuses are classified before any decode attempt; the
    /// request URL carries the API key and is never logged.
    pub async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        debug!(
            "generateContent: model={} turns={}",
            self.config.model,
            request.contents.len()
        );

        let response = self
            .http
            .post(self.api_url())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenAiError::Timeout
                } else {
                    GenAiError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|error| error.message)
                .unwrap_or(body);
            warn!("generateContent failed: {} - {}", status, message);
            return Err(classify_http_failure(status, &message));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenAiError::Timeout
            } else {
                GenAiError::Network(e)
            }
        })?;
        serde_json::from_str(&body).map_err(|e| GenAiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RetryClass;
    use crate::models::Content;

    #[test]
    fn test_api_url_includes_model_and_key() {
        let config = ClientConfig::new("test-key", "gemini-2.5-flash")
            .with_base_url("http://localhost:9099");
        let client = GeminiClient::new(config).unwrap();
        assert_eq!(
            client.api_url(),
            "http://localhost:9099/models/gemini-2.5-flash:generateContent?key=test-key"
        );
    }

    #[test]
    fn test_error_envelope_message_extraction() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.error.and_then(|e| e.message).as_deref(),
            Some("Resource has been exhausted")
        );
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("k", "m");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_generate_maps_connection_failure_to_network_error() {
        // Nothing listens on port 1; the connect fails immediately.
        let config = ClientConfig::new("k", "m").with_base_url("http://127.0.0.1:1");
        let client = GeminiClient::new(config).unwrap();

        let request = GenerateContentRequest {
            contents: vec![Content::user("hi")],
            system_instruction: None,
            generation_config: None,
        };

        let error = client.generate(&request).await.unwrap_err();
        assert!(matches!(error, GenAiError::Network(_)));
        assert_eq!(error.retry_class(), RetryClass::Never);
    }
}
