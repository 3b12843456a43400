//! Wire types for the `generateContent` endpoint.

use serde::{Deserialize, Serialize};

/// Role attached to a conversation turn on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

/// A single text fragment within a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One conversation turn: a role plus its text parts.
///
/// System instructions are carried as a role-less content block, so the role
/// is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ContentRole>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn.
    pub fn user(text: &str) -> Self {
        Self {
            role: Some(ContentRole::User),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    /// Create a model turn.
    pub fn model(text: &str) -> Self {
        Self {
            role: Some(ContentRole::Model),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    /// Create a role-less block for the `systemInstruction` field.
    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

/// Sampling parameters for a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Full turn list, oldest first. The service holds no state between
    /// calls, so the caller resends the transcript every time.
    pub contents: Vec<Content>,
    /// Persona/constraint preamble attached to the whole conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Response body for `generateContent`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, or `None` when the reply
    /// carries no usable text.
    pub fn primary_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("Hello")],
            system_instruction: Some(Content::system("Be helpful.")),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                top_p: Some(0.9),
                top_k: Some(40),
                max_output_tokens: None,
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "Be helpful."
        );
        // System instruction blocks carry no role.
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["topP"], 0.9);
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert!(value["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_primary_text_extracts_first_candidate() {
        let json = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Hi " }, { "text": "there" }] } },
                { "content": { "role": "model", "parts": [{ "text": "ignored" }] } }
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.primary_text(), Some("Hi there".to_string()));
    }

    #[test]
    fn test_primary_text_none_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.primary_text(), None);
    }

    #[test]
    fn test_primary_text_none_for_blank_text() {
        let json = r#"{
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "   " }] }, "finishReason": "STOP" }
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.primary_text(), None);
    }
}
