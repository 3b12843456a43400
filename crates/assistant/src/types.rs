//! Chat turn types shared with the dashboard UI.

use serde::{Deserialize, Serialize};

use crate::config::ModelConfigUpdate;

/// Role of a chat turn.
///
/// Determines rendering and wire formatting only; it never influences retry
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Model => write!(f, "model"),
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "model" => Ok(TurnRole::Model),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// One turn of the conversation as the UI retains it.
///
/// Turns are immutable once created. The session reads them as input context
/// only; it never stores or mutates the sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub id: String,
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    /// Create a user turn with a fresh id.
    pub fn user(text: &str) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            role: TurnRole::User,
            text: text.to_string(),
        }
    }

    /// Create a model turn with a fresh id.
    pub fn model(text: &str) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            role: TurnRole::Model,
            text: text.to_string(),
        }
    }
}

/// Per-call overrides for [`crate::AssistantSession::ask`].
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Configuration override applied to any context opened by this call.
    /// The session's stored configuration is not changed.
    pub config: Option<ModelConfigUpdate>,
    /// Maximum retry count for transient failures.
    /// Defaults to [`crate::DEFAULT_MAX_RETRIES`].
    pub max_retries: Option<u32>,
}
