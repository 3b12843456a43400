//! Assistant error types and user-facing message translation.

use thiserror::Error;

use fiboard_genai::GenAiError;

/// Assistant session errors.
///
/// These never cross [`crate::AssistantSession::ask`]: every failure is
/// translated into a renderable string via [`user_message`](Self::user_message)
/// before it reaches the UI. Diagnostic detail stays in the logs.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Invalid or missing configuration (blank API key).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by the generative-text service.
    #[error(transparent)]
    GenAi(#[from] GenAiError),

    /// Another ask is already in flight on this session.
    #[error("Session is busy with another request")]
    Busy,
}

impl AssistantError {
    /// Error code for logs and programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Busy => "SESSION_BUSY",
            Self::GenAi(e) => match e {
                GenAiError::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
                GenAiError::AuthFailed(_) => "INVALID_API_KEY",
                GenAiError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
                GenAiError::Timeout => "TIMEOUT",
                GenAiError::EmptyResponse => "EMPTY_RESPONSE",
                _ => "GENERAL_ERROR",
            },
        }
    }

    /// Fixed, renderable message for the chat UI.
    ///
    /// The caller always receives one of these strings, never the raw remote
    /// error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => {
                "Configuration error: API key not found. Please contact support."
            }
            Self::Busy => {
                "I'm still working on your previous question. Please wait a moment and try again."
            }
            Self::GenAi(e) => match e {
                GenAiError::RateLimited(_) => {
                    "I'm receiving too many requests right now. Please wait a moment and try again."
                }
                GenAiError::AuthFailed(_) => {
                    "Authentication error: Invalid API key. Please contact support."
                }
                GenAiError::QuotaExceeded(_) => {
                    "Service temporarily unavailable due to quota limits. Please try again later."
                }
                _ => "I'm sorry, I encountered a technical error. Please try again in a moment.",
            },
        }
    }
}
