//! Task and SubTask records, priority levels and list filters

use serde::{Deserialize, Serialize};

/// Category given to every task created through `TaskStore::add`
pub const DEFAULT_CATEGORY: &str = "General";

/// Priority level of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// A single actionable step belonging to exactly one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl SubTask {
    /// Create an incomplete subtask with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: crate::generate_id(),
            title: title.into(),
            completed: false,
        }
    }
}

/// A to-do item
///
/// Field names serialize in camelCase so a stored list keeps the same
/// layout the web dashboard wrote to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub category: String,
    /// Creation timestamp (unix ms)
    pub created_at: i64,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
}

impl Task {
    /// Create an active task with a fresh id and no subtasks
    pub fn new(title: impl Into<String>, priority: Priority, category: impl Into<String>) -> Self {
        Self {
            id: crate::generate_id(),
            title: title.into(),
            completed: false,
            priority,
            category: category.into(),
            created_at: crate::now_ms(),
            subtasks: Vec::new(),
        }
    }

    /// Completed and total subtask counts
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }

    /// Resolve a full id, prefix, or short id among this task's subtasks
    pub fn resolve_subtask(&self, reference: &str) -> Result<Option<String>, Vec<String>> {
        crate::IdResolver::new(self.subtasks.iter().map(|s| s.id.as_str())).resolve(reference)
    }
}

/// Which tasks a list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Whether a task belongs in this view
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    /// Heading shown above the list
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "My Tasks",
            Self::Active => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(format!("Unknown filter: {} (expected all, active or completed)", s)),
        }
    }
}

/// Counters for the sidebar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }
}
