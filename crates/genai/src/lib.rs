//! Fiboard GenAI - typed client for the Generative Language API.
//!
//! This crate wraps the hosted `generateContent` endpoint behind a small
//! typed surface:
//!
//! - `models`: wire request/response types (contents, system instruction,
//!   generation config)
//! - `client`: the HTTP client with status-code error classification
//! - `errors`: the error taxonomy and retry classification
//!
//! The endpoint is stateless per request; multi-turn dialogue is built by the
//! caller resending the accumulated turn list (see the assistant crate's
//! conversation handle).

pub mod client;
pub mod errors;
pub mod models;

pub use client::{ClientConfig, GeminiClient, DEFAULT_BASE_URL};
pub use errors::{GenAiError, RetryClass};
pub use models::{
    Candidate, Content, ContentRole, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part,
};
