//! State management - single-writer actor over the TaskStore

mod manager;
mod messages;

pub use manager::StoreManager;
pub use messages::{SaveWarning, StateError, StateResponse, StoreCommand};
