//! Error types for task store operations

use thiserror::Error;

/// User input failed a precondition; the operation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task title must not be empty")]
    EmptyTitle,
}

/// Durable read or write failed
///
/// Never fatal: the in-memory collection stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
}
