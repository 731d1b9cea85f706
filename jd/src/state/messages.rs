//! StoreManager messages
//!
//! Commands and responses for the actor pattern.

use taskstore::{Filter, PersistenceError, Task, TaskStats, ValidationError};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Channel error")]
    ChannelError,
}

/// Response from store operations
pub type StateResponse<T> = Result<T, StateError>;

/// Result of a mutation: `None` when the write-through succeeded, otherwise
/// the persistence failure to show as a warning
pub type SaveWarning = Option<PersistenceError>;

/// Commands sent to the StoreManager actor
#[derive(Debug)]
pub enum StoreCommand {
    Add {
        title: String,
        reply: oneshot::Sender<StateResponse<(Task, SaveWarning)>>,
    },
    Toggle {
        id: String,
        reply: oneshot::Sender<SaveWarning>,
    },
    Delete {
        id: String,
        reply: oneshot::Sender<SaveWarning>,
    },
    /// With `only_if_empty`, replies `None` and leaves the task alone when it
    /// already has subtasks
    AddSubtasks {
        task_id: String,
        titles: Vec<String>,
        only_if_empty: bool,
        reply: oneshot::Sender<Option<SaveWarning>>,
    },
    ToggleSubtask {
        task_id: String,
        subtask_id: String,
        reply: oneshot::Sender<SaveWarning>,
    },

    // Queries
    Get {
        id: String,
        reply: oneshot::Sender<Option<Task>>,
    },
    List {
        filter: Filter,
        reply: oneshot::Sender<Vec<Task>>,
    },
    Resolve {
        reference: String,
        reply: oneshot::Sender<Result<Option<String>, Vec<String>>>,
    },
    Stats {
        reply: oneshot::Sender<TaskStats>,
    },

    // Re-read persisted state written by another process
    Reload {
        reply: oneshot::Sender<bool>,
    },

    // Shutdown
    Shutdown,
}
