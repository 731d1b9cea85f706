//! AI service error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the text-generation endpoint
///
/// None of these reach the user: the text service swaps in a fallback.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
