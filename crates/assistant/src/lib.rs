//! Fiboard assistant - conversational session core.
//!
//! This crate mediates one logical conversation between the dashboard UI and
//! a remote generative-text model, presenting a single "ask a question, get a
//! renderable answer" operation that hides context creation, transient-failure
//! retry, and error translation.
//!
//! # Architecture
//!
//! - `session`: the `AssistantSession` lifecycle (lazy context init, retry
//!   with backoff, busy guard, config updates)
//! - `backend`: the conversation seam (`ConversationBackend`), the production
//!   Gemini implementation, and a scripted stub for tests
//! - `config`: `ModelConfig` loaded from the environment with documented
//!   fallback defaults
//! - `prompt`: system-instruction construction around the financial snapshot
//! - `types`: chat turn types shared with the UI
//! - `error`: error taxonomy and the fixed user-facing message strings
//!
//! # Example
//!
//! ```ignore
//! use fiboard_assistant::{AssistantSession, GeminiBackend, ModelConfig};
//!
//! let session = AssistantSession::new(
//!     Arc::new(GeminiBackend::new()),
//!     ModelConfig::from_env()?,
//! );
//!
//! // Always renderable, never an error.
//! let reply = session
//!     .ask("What is my net worth?", &history, &summary, None)
//!     .await;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod prompt;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use backend::{ContextSpec, Conversation, ConversationBackend, GeminiBackend, StubBackend};
pub use config::{ModelConfig, ModelConfigUpdate};
pub use error::AssistantError;
pub use prompt::build_system_instruction;
pub use session::{ApiKeyCheck, AssistantSession, DEFAULT_MAX_RETRIES};
pub use types::{AskOptions, ChatTurn, TurnRole};
