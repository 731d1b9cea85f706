//! StoreManager - actor that owns the TaskStore
//!
//! All mutations go through one task, so id lookups and in-place edits are
//! never interleaved even when several AI breakdowns finish at once.

use taskstore::{Filter, SaveStatus, Task, TaskStats, TaskStore};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{SaveWarning, StateError, StateResponse, StoreCommand};

/// Handle to send commands to the StoreManager
#[derive(Clone)]
pub struct StoreManager {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreManager {
    /// Spawn a new StoreManager actor owning `store`
    pub fn spawn(store: TaskStore) -> Self {
        debug!(task_count = store.len(), "spawn: called");
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(actor_loop(store, rx));

        info!("StoreManager spawned");
        Self { tx }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> StoreCommand) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)
    }

    /// Create a task; blank titles are refused
    pub async fn add(&self, title: &str) -> StateResponse<(Task, SaveWarning)> {
        debug!(%title, "add: called");
        let title = title.to_string();
        self.request(|reply| StoreCommand::Add { title, reply }).await?
    }

    pub async fn toggle(&self, id: &str) -> StateResponse<SaveWarning> {
        debug!(%id, "toggle: called");
        let id = id.to_string();
        self.request(|reply| StoreCommand::Toggle { id, reply }).await
    }

    pub async fn delete(&self, id: &str) -> StateResponse<SaveWarning> {
        debug!(%id, "delete: called");
        let id = id.to_string();
        self.request(|reply| StoreCommand::Delete { id, reply }).await
    }

    pub async fn add_subtasks(&self, task_id: &str, titles: Vec<String>) -> StateResponse<SaveWarning> {
        debug!(%task_id, count = titles.len(), "add_subtasks: called");
        let task_id = task_id.to_string();
        let reply = self
            .request(|reply| StoreCommand::AddSubtasks {
                task_id,
                titles,
                only_if_empty: false,
                reply,
            })
            .await?;
        Ok(reply.flatten())
    }

    /// Append subtasks unless the task already has some; `None` if skipped
    ///
    /// The check and the append happen in one actor step, so overlapping
    /// breakdowns of one task cannot both land.
    pub async fn add_subtasks_if_empty(
        &self,
        task_id: &str,
        titles: Vec<String>,
    ) -> StateResponse<Option<SaveWarning>> {
        debug!(%task_id, count = titles.len(), "add_subtasks_if_empty: called");
        let task_id = task_id.to_string();
        self.request(|reply| StoreCommand::AddSubtasks {
            task_id,
            titles,
            only_if_empty: true,
            reply,
        })
        .await
    }

    pub async fn toggle_subtask(&self, task_id: &str, subtask_id: &str) -> StateResponse<SaveWarning> {
        debug!(%task_id, %subtask_id, "toggle_subtask: called");
        let task_id = task_id.to_string();
        let subtask_id = subtask_id.to_string();
        self.request(|reply| StoreCommand::ToggleSubtask {
            task_id,
            subtask_id,
            reply,
        })
        .await
    }

    /// Snapshot of a task by id
    pub async fn get(&self, id: &str) -> StateResponse<Option<Task>> {
        debug!(%id, "get: called");
        let id = id.to_string();
        self.request(|reply| StoreCommand::Get { id, reply }).await
    }

    /// Snapshot of the tasks matching `filter`, newest first
    pub async fn list(&self, filter: Filter) -> StateResponse<Vec<Task>> {
        debug!(%filter, "list: called");
        self.request(|reply| StoreCommand::List { filter, reply }).await
    }

    /// Resolve a full id, prefix or short id
    pub async fn resolve(&self, reference: &str) -> StateResponse<Result<Option<String>, Vec<String>>> {
        debug!(%reference, "resolve: called");
        let reference = reference.to_string();
        self.request(|reply| StoreCommand::Resolve { reference, reply })
            .await
    }

    pub async fn stats(&self) -> StateResponse<TaskStats> {
        self.request(|reply| StoreCommand::Stats { reply }).await
    }

    /// Re-read persisted state; `false` if nothing usable was stored
    pub async fn reload(&self) -> StateResponse<bool> {
        debug!("reload: called");
        self.request(|reply| StoreCommand::Reload { reply }).await
    }

    /// Stop the actor; later requests fail with `ChannelError`
    pub async fn shutdown(&self) -> StateResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(StoreCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

async fn actor_loop(mut store: TaskStore, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!("StoreManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::Add { title, reply } => {
                debug!("actor_loop: Add command");
                let result = store
                    .add(&title)
                    .map(|(task, status)| (task, status.into_warning()))
                    .map_err(StateError::from);
                let _ = reply.send(result);
            }

            StoreCommand::Toggle { id, reply } => {
                debug!(%id, "actor_loop: Toggle command");
                let _ = reply.send(store.toggle(&id).into_warning());
            }

            StoreCommand::Delete { id, reply } => {
                debug!(%id, "actor_loop: Delete command");
                let _ = reply.send(store.delete(&id).into_warning());
            }

            StoreCommand::AddSubtasks {
                task_id,
                titles,
                only_if_empty,
                reply,
            } => {
                debug!(%task_id, only_if_empty, "actor_loop: AddSubtasks command");
                let status = if only_if_empty {
                    store.add_subtasks_if_empty(&task_id, titles)
                } else {
                    Some(store.add_subtasks(&task_id, titles))
                };
                let _ = reply.send(status.map(SaveStatus::into_warning));
            }

            StoreCommand::ToggleSubtask {
                task_id,
                subtask_id,
                reply,
            } => {
                debug!(%task_id, %subtask_id, "actor_loop: ToggleSubtask command");
                let _ = reply.send(store.toggle_subtask(&task_id, &subtask_id).into_warning());
            }

            StoreCommand::Get { id, reply } => {
                let _ = reply.send(store.get(&id).cloned());
            }

            StoreCommand::List { filter, reply } => {
                let _ = reply.send(store.filter(filter).cloned().collect());
            }

            StoreCommand::Resolve { reference, reply } => {
                let _ = reply.send(store.resolve_id(&reference));
            }

            StoreCommand::Stats { reply } => {
                let _ = reply.send(store.stats());
            }

            StoreCommand::Reload { reply } => {
                debug!("actor_loop: Reload command");
                let _ = reply.send(store.reload());
            }

            StoreCommand::Shutdown => {
                info!("StoreManager shutting down");
                break;
            }
        }
    }

    debug!("StoreManager actor stopped");
}
