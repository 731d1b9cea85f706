//! TaskStore - task collection with write-through persistence
//!
//! Holds the canonical in-memory list of tasks and mirrors every mutation
//! into a durable key-value store before the mutation returns.
//!
//! # Architecture
//!
//! ```text
//! {data_dir}/
//! ├── justdoit-tasks.json   # full task list, camelCase JSON
//! └── justdoit-tasks.lock   # advisory lock for readers/writers
//! ```
//!
//! # Example
//!
//! ```ignore
//! use taskstore::{Filter, FileKvStore, TaskPersistence, TaskStore};
//!
//! let persistence = TaskPersistence::new(FileKvStore::open("~/.local/share/justdoit")?);
//! let mut store = TaskStore::open(persistence);
//! let (task, _saved) = store.add("Draft keynote outline")?;
//! let active: Vec<_> = store.filter(Filter::Active).collect();
//! ```

mod error;
mod id;
mod kv;
mod persistence;
mod store;
mod task;

pub use error::{PersistenceError, ValidationError};
pub use id::{IdResolver, generate_id, short_id};
pub use kv::{FileKvStore, KvStore, MemoryKvStore, SessionLock};
pub use persistence::{STORAGE_KEY, TaskPersistence};
pub use store::{SaveStatus, TaskStore, load, seed_tasks};
pub use task::{DEFAULT_CATEGORY, Filter, Priority, SubTask, Task, TaskStats};

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
