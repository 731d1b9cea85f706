//! Persistence adapter - durable mirror of the task collection

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::kv::KvStore;
use crate::task::Task;

/// Fixed key the task list is stored under
pub const STORAGE_KEY: &str = "justdoit-tasks";

/// Serializes the whole task list to a `KvStore` under `STORAGE_KEY`
pub struct TaskPersistence {
    kv: Box<dyn KvStore>,
}

impl TaskPersistence {
    pub fn new(kv: impl KvStore + 'static) -> Self {
        Self { kv: Box::new(kv) }
    }

    /// Overwrite the stored collection with `tasks`
    pub fn save(&mut self, tasks: &[Task]) -> Result<(), PersistenceError> {
        debug!(task_count = tasks.len(), "save: called");
        let json = serde_json::to_string(tasks)?;
        self.kv.set(STORAGE_KEY, &json)
    }

    /// Read the stored collection
    ///
    /// Missing, unreadable and malformed values all come back as `None`;
    /// the caller falls back to seed data.
    pub fn load(&self) -> Option<Vec<Task>> {
        let raw = match self.kv.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("load: no stored tasks");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "load: failed to read stored tasks");
                return None;
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => match duplicate_id(&tasks) {
                Some(id) => {
                    warn!(%id, "load: stored tasks repeat an id, ignoring");
                    None
                }
                None => {
                    debug!(task_count = tasks.len(), "load: restored tasks");
                    Some(tasks)
                }
            },
            Err(e) => {
                warn!(error = %e, "load: stored tasks are malformed, ignoring");
                None
            }
        }
    }
}

/// First task id, or subtask id within one task, that appears twice
fn duplicate_id(tasks: &[Task]) -> Option<&str> {
    let mut task_ids = HashSet::new();
    for task in tasks {
        if !task_ids.insert(task.id.as_str()) {
            return Some(&task.id);
        }
        let mut subtask_ids = HashSet::new();
        if let Some(sub) = task.subtasks.iter().find(|s| !subtask_ids.insert(s.id.as_str())) {
            return Some(&sub.id);
        }
    }
    None
}
