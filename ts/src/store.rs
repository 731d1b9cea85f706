//! Core TaskStore implementation

use tracing::{debug, info, warn};

use crate::error::{PersistenceError, ValidationError};
use crate::id::IdResolver;
use crate::persistence::TaskPersistence;
use crate::task::{DEFAULT_CATEGORY, Filter, Priority, SubTask, Task, TaskStats};

/// Outcome of the write-through that follows every mutation
///
/// A failed save does not undo the mutation; the in-memory collection stays
/// authoritative and the failure is only a warning for the caller to show.
#[must_use = "a failed save should be reported to the user"]
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    Failed(PersistenceError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }

    /// The persistence failure, if the save did not go through
    pub fn warning(&self) -> Option<&PersistenceError> {
        match self {
            SaveStatus::Saved => None,
            SaveStatus::Failed(e) => Some(e),
        }
    }

    pub fn into_warning(self) -> Option<PersistenceError> {
        match self {
            SaveStatus::Saved => None,
            SaveStatus::Failed(e) => Some(e),
        }
    }
}

/// Demo tasks used when nothing has been stored yet
pub fn seed_tasks() -> Vec<Task> {
    let now = crate::now_ms();

    let documentation = Task::new("Complete Project Documentation", Priority::High, "Work");

    let mut goals = Task::new("Review Quarterly Goals", Priority::Medium, "Work");
    goals.completed = true;
    goals.created_at = now - 100_000;

    vec![documentation, goals]
}

/// Stored tasks if present, otherwise the seed set
pub fn load(persistence: &TaskPersistence) -> Vec<Task> {
    match persistence.load() {
        Some(tasks) => tasks,
        None => {
            info!("No stored tasks, starting from seed data");
            seed_tasks()
        }
    }
}

/// Canonical in-memory task collection
///
/// Newest tasks are kept first. Every mutating method writes the full
/// collection through to persistence before returning.
pub struct TaskStore {
    tasks: Vec<Task>,
    persistence: TaskPersistence,
}

impl TaskStore {
    /// Build the store from persisted state (or seed data)
    pub fn open(persistence: TaskPersistence) -> Self {
        let tasks = load(&persistence);
        debug!(task_count = tasks.len(), "Opened task store");
        Self { tasks, persistence }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// Resolve a full id, prefix, or short id to a task id
    pub fn resolve_id(&self, reference: &str) -> Result<Option<String>, Vec<String>> {
        IdResolver::new(self.tasks.iter().map(|t| t.id.as_str())).resolve(reference)
    }

    /// Create a task and put it at the front of the list
    pub fn add(&mut self, title: &str) -> Result<(Task, SaveStatus), ValidationError> {
        debug!(%title, "add: called");
        let title = title.trim();
        if title.is_empty() {
            debug!("add: rejected empty title");
            return Err(ValidationError::EmptyTitle);
        }

        let task = Task::new(title, Priority::Medium, DEFAULT_CATEGORY);
        self.tasks.insert(0, task.clone());
        info!(id = %task.id, "Added task");
        Ok((task, self.persist()))
    }

    /// Flip `completed` on a task; unknown ids are ignored
    pub fn toggle(&mut self, id: &str) -> SaveStatus {
        debug!(%id, "toggle: called");
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                debug!(%id, completed = task.completed, "toggle: flipped");
            }
            None => debug!(%id, "toggle: no such task"),
        }
        self.persist()
    }

    /// Remove a task and all its subtasks; unknown ids are ignored
    pub fn delete(&mut self, id: &str) -> SaveStatus {
        debug!(%id, "delete: called");
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() < before {
            info!(%id, "Deleted task");
        }
        self.persist()
    }

    /// Append one subtask per title, in order, after existing subtasks
    pub fn add_subtasks<I, S>(&mut self, task_id: &str, titles: I) -> SaveStatus
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        debug!(%task_id, "add_subtasks: called");
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) {
            let before = task.subtasks.len();
            task.subtasks.extend(titles.into_iter().map(SubTask::new));
            debug!(%task_id, added = task.subtasks.len() - before, "add_subtasks: appended");
        } else {
            debug!(%task_id, "add_subtasks: no such task");
        }
        self.persist()
    }

    /// Append subtasks only while the task has none
    ///
    /// Returns `None` without writing when the task already has subtasks.
    /// An unknown id behaves like `add_subtasks`.
    pub fn add_subtasks_if_empty<I, S>(&mut self, task_id: &str, titles: I) -> Option<SaveStatus>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.get(task_id).is_some_and(Task::has_subtasks) {
            debug!(%task_id, "add_subtasks_if_empty: task already broken down");
            return None;
        }
        Some(self.add_subtasks(task_id, titles))
    }

    /// Flip `completed` on one subtask; unknown ids are ignored
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> SaveStatus {
        debug!(%task_id, %subtask_id, "toggle_subtask: called");
        let subtask = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == subtask_id));

        match subtask {
            Some(subtask) => subtask.completed = !subtask.completed,
            None => debug!(%task_id, %subtask_id, "toggle_subtask: no such subtask"),
        }
        self.persist()
    }

    /// Lazy view of the tasks matching `filter`, in collection order
    ///
    /// The iterator borrows the store and can be cloned to walk it again.
    pub fn filter(&self, filter: Filter) -> impl Iterator<Item = &Task> + Clone + '_ {
        self.tasks.iter().filter(move |t| filter.matches(t))
    }

    /// Replace the in-memory list with what is currently stored
    ///
    /// Picks up changes written by another process. Returns `false` and keeps
    /// the current list when nothing usable is stored.
    pub fn reload(&mut self) -> bool {
        debug!("reload: called");
        match self.persistence.load() {
            Some(tasks) => {
                self.tasks = tasks;
                true
            }
            None => false,
        }
    }

    fn persist(&mut self) -> SaveStatus {
        match self.persistence.save(&self.tasks) {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                warn!(error = %e, "Failed to save tasks; keeping in-memory state");
                SaveStatus::Failed(e)
            }
        }
    }
}
