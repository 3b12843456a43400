//! Assistant session management.
//!
//! `AssistantSession` mediates one logical conversation between the dashboard
//! UI and the remote generative-text model, presenting a single `ask`
//! operation that hides context creation, transient-failure retry, and error
//! translation. The session has exactly two modes - "no live context" and
//! "live context" - with transitions via first ask, empty caller history,
//! reset, and configuration updates.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, warn};

use fiboard_genai::RetryClass;

use crate::backend::{ContextSpec, Conversation, ConversationBackend};
use crate::config::{ModelConfig, ModelConfigUpdate};
use crate::error::AssistantError;
use crate::prompt::build_system_instruction;
use crate::types::{AskOptions, ChatTurn};

/// Default bound on transient-failure retries per ask.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Result of an API-key verification probe.
#[derive(Debug, Clone)]
pub struct ApiKeyCheck {
    pub valid: bool,
    pub message: String,
}

/// Guard that clears the busy flag on drop, so the flag is released even when
/// the surrounding future is cancelled mid-ask.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    /// Attempt to acquire the busy flag. Fails if an ask is already in flight.
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AssistantError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(AssistantError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A live conversation context plus the config epoch it was opened under.
/// A stale epoch means a reset or config update happened since.
struct LiveContext {
    handle: Box<dyn Conversation>,
    epoch: u64,
}

/// One logical conversation with the remote model.
///
/// At most one conversation context is live per session. `ask` opens it
/// lazily; an empty caller history, [`reset_conversation`](Self::reset_conversation),
/// or [`update_config`](Self::update_config) discard it so the next ask
/// starts fresh.
pub struct AssistantSession {
    backend: Arc<dyn ConversationBackend>,
    config: Mutex<ModelConfig>,
    conversation: tokio::sync::Mutex<Option<LiveContext>>,
    /// Bumped on reset/config-update; contexts opened under an older epoch
    /// are discarded on the next ask. This keeps both operations synchronous
    /// even while an ask is in flight.
    epoch: AtomicU64,
    busy: AtomicBool,
    retry_base_delay: Duration,
}

impl AssistantSession {
    /// Create a session over a backend with an explicit configuration.
    pub fn new(backend: Arc<dyn ConversationBackend>, config: ModelConfig) -> Self {
        Self {
            backend,
            config: Mutex::new(config),
            conversation: tokio::sync::Mutex::new(None),
            epoch: AtomicU64::new(0),
            busy: AtomicBool::new(false),
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }

    /// Create a session configured from the process environment.
    ///
    /// Fails fast when no usable API key is configured, before any network
    /// attempt.
    pub fn from_env(backend: Arc<dyn ConversationBackend>) -> Result<Self, AssistantError> {
        Ok(Self::new(backend, ModelConfig::from_env()?))
    }

    /// Shrink or stretch the backoff base. Tests use this to avoid
    /// multi-second sleeps.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Ask the assistant a question about the supplied financial snapshot.
    ///
    /// Never fails: every error path resolves to a renderable string. An
    /// empty or whitespace-only prompt is a no-op returning an empty string
    /// without touching the remote service or the live context. An empty
    /// `history` forces a fresh context seeded with `financial_data_summary`;
    /// otherwise the history is read-only input and is never stored.
    pub async fn ask(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        financial_data_summary: &str,
        options: Option<AskOptions>,
    ) -> String {
        if prompt.trim().is_empty() {
            return String::new();
        }

        let _guard = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Rejected overlapping ask on busy session");
                return e.user_message().to_string();
            }
        };

        let options = options.unwrap_or_default();
        let max_retries = options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);

        match self
            .ask_with_retries(prompt, history, financial_data_summary, &options, max_retries)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("ask failed ({}): {}", e.code(), e);
                e.user_message().to_string()
            }
        }
    }

    async fn ask_with_retries(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        financial_data_summary: &str,
        options: &AskOptions,
        max_retries: u32,
    ) -> Result<String, AssistantError> {
        let mut slot = self.conversation.lock().await;
        let current_epoch = self.epoch.load(Ordering::SeqCst);

        // An empty caller history means "new conversation"; a stale epoch
        // means the context predates a reset or config update. Either way
        // the live context is discarded.
        let stale = history.is_empty()
            || slot
                .as_ref()
                .map(|live| live.epoch != current_epoch)
                .unwrap_or(false);
        if stale {
            *slot = None;
        }

        let mut attempt: u32 = 0;
        loop {
            if slot.is_none() {
                let handle = self.open_context(financial_data_summary, options).await?;
                *slot = Some(LiveContext {
                    handle,
                    epoch: current_epoch,
                });
            }
            let live = slot.as_mut().expect("context opened above");

            match live.handle.send(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if e.retry_class() == RetryClass::WithBackoff && attempt < max_retries {
                        attempt += 1;
                        let delay = backoff_delay(self.retry_base_delay, attempt);
                        warn!(
                            "Transient failure ({}), retrying in {:?} ({}/{})",
                            e, delay, attempt, max_retries
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    async fn open_context(
        &self,
        financial_data_summary: &str,
        options: &AskOptions,
    ) -> Result<Box<dyn Conversation>, AssistantError> {
        let base = self.config.lock().unwrap().clone();
        let config = match &options.config {
            Some(update) => {
                update.validate()?;
                update.merged_over(&base)
            }
            None => base,
        };

        debug!("Opening conversation context (model {})", config.model);
        let spec = ContextSpec {
            system_instruction: build_system_instruction(financial_data_summary),
            config,
        };
        self.backend
            .open(spec)
            .await
            .map_err(AssistantError::from)
    }

    /// Discard the live conversation context; the next ask starts a new
    /// conversation.
    pub fn reset_conversation(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!("Conversation context invalidated");
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ModelConfig {
        self.config.lock().unwrap().clone()
    }

    /// Apply a partial configuration update.
    ///
    /// A blank API key is rejected synchronously and nothing changes. A
    /// successful update tears down the live context so the next ask
    /// re-initializes under the new settings.
    pub fn update_config(&self, update: ModelConfigUpdate) -> Result<(), AssistantError> {
        update.validate()?;
        {
            let mut config = self.config.lock().unwrap();
            let merged = update.merged_over(&config);
            *config = merged;
        }
        self.reset_conversation();
        Ok(())
    }

    /// Probe the remote service with `candidate` (or the configured key).
    ///
    /// Opens a throwaway context outside the session's own conversation; the
    /// live context is left untouched. Never fails.
    pub async fn verify_api_key(&self, candidate: Option<&str>) -> ApiKeyCheck {
        let mut config = self.config.lock().unwrap().clone();
        if let Some(key) = candidate {
            config.api_key = key.to_string();
        }
        if let Err(e) = config.validate() {
            return ApiKeyCheck {
                valid: false,
                message: e.to_string(),
            };
        }

        let spec = ContextSpec {
            system_instruction: "You are a test assistant. Respond with 'Test successful'."
                .to_string(),
            config,
        };

        let mut probe = match self.backend.open(spec).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("API key probe failed to open context: {}", e);
                return ApiKeyCheck {
                    valid: false,
                    message: AssistantError::from(e).user_message().to_string(),
                };
            }
        };

        match probe.send("Test").await {
            Ok(_) => ApiKeyCheck {
                valid: true,
                message: "API key is valid and working".to_string(),
            },
            Err(e) => {
                warn!("API key probe failed: {}", e);
                ApiKeyCheck {
                    valid: false,
                    message: AssistantError::from(e).user_message().to_string(),
                }
            }
        }
    }
}

/// Exponential backoff: `base * 2^attempt` for attempt >= 1.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}
