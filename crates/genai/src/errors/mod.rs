//! Error types and retry classification for the genai client.
//!
//! This module provides:
//! - [`GenAiError`]: the main error enum for `generateContent` calls
//! - [`RetryClass`]: classification for determining retry behavior
//! - [`classify_http_failure`]: mapping from a non-success reply to an error

mod retry;

pub use retry::RetryClass;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to the generative-text API.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which determines whether the caller
/// should retry the request.
#[derive(Error, Debug)]
pub enum GenAiError {
    /// The service rate limited the request (HTTP 429).
    /// Should retry with exponential backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The service rejected the credentials (HTTP 401).
    /// This is a terminal error - retrying won't help.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The service reported plan or quota exhaustion (HTTP 403).
    /// This is a terminal error - retrying won't help.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The request to the service timed out.
    /// Should retry with exponential backoff.
    #[error("Request timed out")]
    Timeout,

    /// The service replied 2xx but the body carried no usable candidate text.
    #[error("Empty response from model")]
    EmptyResponse,

    /// Any other non-success reply from the service.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code of the reply.
        status: u16,
        /// Message extracted from the reply body.
        message: String,
    },

    /// A network error occurred while communicating with the service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl GenAiError {
    /// Returns the retry classification for this error.
    ///
    /// Only rate limiting and timeouts are transient; everything else is
    /// terminal for the request that produced it.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited(_) | Self::Timeout => RetryClass::WithBackoff,

            Self::AuthFailed(_)
            | Self::QuotaExceeded(_)
            | Self::EmptyResponse
            | Self::Api { .. }
            | Self::Network(_)
            | Self::Decode(_) => RetryClass::Never,
        }
    }
}

/// Classify a non-success API reply into a [`GenAiError`].
///
/// The HTTP status code is the primary signal. Substring matching against the
/// body is kept only as a fallback for gateways that rewrite status codes;
/// it is inherently fragile and must never override a recognized status.
pub fn classify_http_failure(status: StatusCode, message: &str) -> GenAiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => return GenAiError::RateLimited(message.to_string()),
        StatusCode::UNAUTHORIZED => return GenAiError::AuthFailed(message.to_string()),
        StatusCode::FORBIDDEN => return GenAiError::QuotaExceeded(message.to_string()),
        _ => {}
    }

    let lowered = message.to_lowercase();
    if lowered.contains("rate limit") || lowered.contains("429") {
        GenAiError::RateLimited(message.to_string())
    } else if lowered.contains("api key") || lowered.contains("401") {
        GenAiError::AuthFailed(message.to_string())
    } else if lowered.contains("quota") || lowered.contains("403") {
        GenAiError::QuotaExceeded(message.to_string())
    } else {
        GenAiError::Api {
            status: status.as_u16(),
            message: message.to_string(),
        }
    }
}
