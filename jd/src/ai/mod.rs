//! AI text service for JustDoIt
//!
//! Subtask breakdown and motivational quotes from a hosted text-generation
//! endpoint, with fixed local fallbacks.

pub mod client;
mod error;
mod gemini;
mod service;
mod types;

pub use client::LlmClient;
pub use error::AiError;
pub use gemini::GeminiClient;
pub use service::{
    DEFAULT_QUOTE, FAILURE_QUOTE, FALLBACK_SUBTASKS, GenerativeTextService, MAX_QUOTE_WORDS, OfflineTextService,
    TextService, create_text_service, fallback_subtasks,
};
pub use types::{CompletionRequest, CompletionResponse, FinishReason, TokenUsage};
