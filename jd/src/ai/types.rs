//! Request/response types for text generation
//!
//! Provider-agnostic: a single user prompt in, a single block of text out.

use serde::{Deserialize, Serialize};

/// A completion request - everything needed for one call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,

    /// JSON schema the response must follow; `None` for free text
    pub response_schema: Option<serde_json::Value>,

    /// Max tokens for the response
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Free-text request
    pub fn text(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
            max_tokens,
        }
    }

    /// Request whose response is JSON matching `schema`
    pub fn structured(prompt: impl Into<String>, schema: serde_json::Value, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: Some(schema),
            max_tokens,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Generated text (if any)
    pub content: Option<String>,

    /// Why generation stopped
    pub finish_reason: FinishReason,

    /// Token accounting
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Response carrying only text, as a finished generation
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FinishReason {
    #[default]
    Stop,
    MaxTokens,
    Safety,
    Other(String),
}

impl FinishReason {
    /// Parse the provider's finish reason string
    pub fn from_gemini(s: &str) -> Self {
        match s {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::MaxTokens,
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => Self::Safety,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
