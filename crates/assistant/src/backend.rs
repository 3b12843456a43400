//! Conversation backends.
//!
//! `ConversationBackend` is the seam between the session manager and the
//! hosted generative-text service. The abstraction enables:
//!
//! - Swapping the remote service without changing session code
//! - Testing with scripted backends (no network access)
//!
//! `GeminiBackend` is the production implementation; `StubBackend` returns
//! canned outcomes for tests.

use async_trait::async_trait;
use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fiboard_genai::{
    ClientConfig, Content, GeminiClient, GenAiError, GenerateContentRequest, GenerationConfig,
};

use crate::config::ModelConfig;

/// Everything needed to open a fresh conversation context.
#[derive(Debug, Clone)]
pub struct ContextSpec {
    /// Persona- and constraint-setting preamble, attached once per context.
    pub system_instruction: String,
    /// Settings for the context's model.
    pub config: ModelConfig,
}

/// An ongoing dialogue with the remote model.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Submit one prompt and await the model's reply text.
    async fn send(&mut self, prompt: &str) -> Result<String, GenAiError>;
}

/// Opens conversation contexts against a generative-text service.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    async fn open(&self, spec: ContextSpec) -> Result<Box<dyn Conversation>, GenAiError>;
}

// ============================================================================
// Gemini Backend
// ============================================================================

/// Production backend talking to the Generative Language API.
#[derive(Debug, Default)]
pub struct GeminiBackend {
    base_url: Option<String>,
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every opened context at a different API host (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }
}

#[async_trait]
impl ConversationBackend for GeminiBackend {
    async fn open(&self, spec: ContextSpec) -> Result<Box<dyn Conversation>, GenAiError> {
        let mut client_config = ClientConfig::new(&spec.config.api_key, &spec.config.model)
            .with_request_timeout(spec.config.request_timeout);
        if let Some(base_url) = &self.base_url {
            client_config = client_config.with_base_url(base_url);
        }
        let client = GeminiClient::new(client_config)?;
        debug!("Opened conversation context for model {}", spec.config.model);

        Ok(Box::new(GeminiConversation {
            client,
            system_instruction: Content::system(&spec.system_instruction),
            generation: GenerationConfig {
                temperature: Some(spec.config.temperature),
                top_p: Some(spec.config.top_p),
                top_k: Some(spec.config.top_k),
                max_output_tokens: None,
            },
            transcript: Vec::new(),
        }))
    }
}

/// Conversation handle over the stateless HTTP endpoint.
///
/// The endpoint takes the full turn list on every call; this handle owns that
/// transcript, which is what makes the dialogue multi-turn.
struct GeminiConversation {
    client: GeminiClient,
    system_instruction: Content,
    generation: GenerationConfig,
    transcript: Vec<Content>,
}

#[async_trait]
impl Conversation for GeminiConversation {
    async fn send(&mut self, prompt: &str) -> Result<String, GenAiError> {
        self.transcript.push(Content::user(prompt));

        let request = GenerateContentRequest {
            contents: self.transcript.clone(),
            system_instruction: Some(self.system_instruction.clone()),
            generation_config: Some(self.generation.clone()),
        };

        let response = match self.client.generate(&request).await {
            Ok(response) => response,
            Err(e) => {
                // Roll the user turn back so a retried send is not doubled.
                self.transcript.pop();
                return Err(e);
            }
        };

        let Some(text) = response.primary_text() else {
            self.transcript.pop();
            return Err(GenAiError::EmptyResponse);
        };

        self.transcript.push(Content::model(&text));
        Ok(text)
    }
}

// ============================================================================
// Stub Backend (for tests)
// ============================================================================

const DEFAULT_STUB_REPLY: &str = "Hello! I'm Fi Agent. How can I help you today?";

/// One scripted outcome for a [`StubBackend`] send.
pub enum StubOutcome {
    Reply(String),
    DelayedReply(String, Duration),
    Failure(GenAiError),
}

#[derive(Default)]
struct StubState {
    script: Mutex<VecDeque<StubOutcome>>,
    opened: AtomicUsize,
    sent: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    specs: Mutex<Vec<ContextSpec>>,
}

/// A scripted backend that returns canned outcomes without any network.
///
/// Outcomes are consumed in order; once the script runs dry, sends return a
/// fixed greeting. Counters expose how many contexts were opened and prompts
/// sent, and every [`ContextSpec`] is recorded for assertions.
#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<StubState>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next send outcome as a successful reply.
    pub fn push_reply(&self, text: &str) {
        self.state
            .script
            .lock()
            .unwrap()
            .push_back(StubOutcome::Reply(text.to_string()));
    }

    /// Queue a reply that resolves only after `delay`.
    pub fn push_delayed_reply(&self, text: &str, delay: Duration) {
        self.state
            .script
            .lock()
            .unwrap()
            .push_back(StubOutcome::DelayedReply(text.to_string(), delay));
    }

    /// Queue the next send outcome as a failure.
    pub fn push_failure(&self, error: GenAiError) {
        self.state
            .script
            .lock()
            .unwrap()
            .push_back(StubOutcome::Failure(error));
    }

    /// Number of contexts opened so far.
    pub fn opened_contexts(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of prompts sent so far, across all contexts.
    pub fn sent_prompts(&self) -> usize {
        self.state.sent.load(Ordering::SeqCst)
    }

    /// Prompts sent so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.state.prompts.lock().unwrap().clone()
    }

    /// The spec of the most recently opened context.
    pub fn last_spec(&self) -> Option<ContextSpec> {
        self.state.specs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ConversationBackend for StubBackend {
    async fn open(&self, spec: ContextSpec) -> Result<Box<dyn Conversation>, GenAiError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.specs.lock().unwrap().push(spec);
        Ok(Box::new(StubConversation {
            state: self.state.clone(),
        }))
    }
}

struct StubConversation {
    state: Arc<StubState>,
}

#[async_trait]
impl Conversation for StubConversation {
    async fn send(&mut self, prompt: &str) -> Result<String, GenAiError> {
        self.state.sent.fetch_add(1, Ordering::SeqCst);
        self.state.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.state.script.lock().unwrap().pop_front();
        match next {
            Some(StubOutcome::Reply(text)) => Ok(text),
            Some(StubOutcome::DelayedReply(text, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(StubOutcome::Failure(error)) => Err(error),
            None => Ok(DEFAULT_STUB_REPLY.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ContextSpec {
        ContextSpec {
            system_instruction: "Be helpful.".to_string(),
            config: ModelConfig::new("test-key").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_stub_backend_scripted_replies() {
        let backend = StubBackend::new();
        backend.push_reply("first");
        backend.push_failure(GenAiError::RateLimited("slow down".to_string()));

        let mut conversation = backend.open(spec()).await.unwrap();
        assert_eq!(conversation.send("a").await.unwrap(), "first");
        assert!(conversation.send("b").await.is_err());
        // Script exhausted - fixed greeting.
        assert_eq!(conversation.send("c").await.unwrap(), DEFAULT_STUB_REPLY);

        assert_eq!(backend.opened_contexts(), 1);
        assert_eq!(backend.sent_prompts(), 3);
        assert_eq!(backend.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_stub_backend_records_specs() {
        let backend = StubBackend::new();
        backend.open(spec()).await.unwrap();

        let recorded = backend.last_spec().unwrap();
        assert_eq!(recorded.system_instruction, "Be helpful.");
        assert_eq!(recorded.config.api_key, "test-key");
    }
}
