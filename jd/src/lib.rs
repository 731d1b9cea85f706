//! JustDoIt - task manager behind the Speaker Bankole dashboard
//!
//! Wraps the `taskstore` collection with the pieces an interactive front end
//! needs: a single-writer actor that serializes mutations, an AI text
//! service that breaks tasks into subtasks and supplies a daily quote, and a
//! command-line front end.
//!
//! # Modules
//!
//! - [`ai`] - LLM client trait, Gemini implementation, fallback text service
//! - [`state`] - StoreManager actor owning the TaskStore
//! - [`breakdown`] - AI subtask breakdown flow
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod ai;
pub mod breakdown;
pub mod cli;
pub mod config;
pub mod state;

// Re-export commonly used types
pub use ai::{
    AiError, GeminiClient, GenerativeTextService, LlmClient, OfflineTextService, TextService, create_text_service,
};
pub use breakdown::{BreakdownOutcome, breakdown};
pub use config::{AiConfig, Config, StorageConfig};
pub use state::{StateError, StoreManager};
