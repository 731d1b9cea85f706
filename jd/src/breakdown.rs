//! AI subtask breakdown flow
//!
//! The store is never held while the text service is working, so other
//! tasks can be edited (or this one deleted) while a request is pending.

use taskstore::{SubTask, Task};
use tracing::{debug, info};

use crate::ai::TextService;
use crate::state::{SaveWarning, StateResponse, StoreManager};

/// What a breakdown request did
#[derive(Debug)]
pub enum BreakdownOutcome {
    /// Subtasks were generated and appended
    Generated { task: Task, warning: SaveWarning },
    /// The task already had subtasks; nothing was requested
    AlreadyBrokenDown(Task),
    /// The task was deleted while the request was in flight
    TaskRemoved,
    /// No task has this id
    NotFound,
}

impl BreakdownOutcome {
    /// The subtasks to show after the request, if the task still exists
    pub fn subtasks(&self) -> &[SubTask] {
        match self {
            Self::Generated { task, .. } | Self::AlreadyBrokenDown(task) => &task.subtasks,
            Self::TaskRemoved | Self::NotFound => &[],
        }
    }
}

/// Break a task into subtasks with the text service
///
/// A task that already has subtasks is left alone: the caller should toggle
/// its expanded view instead of asking again.
pub async fn breakdown(
    manager: &StoreManager,
    service: &dyn TextService,
    task_id: &str,
) -> StateResponse<BreakdownOutcome> {
    debug!(%task_id, "breakdown: called");
    let Some(task) = manager.get(task_id).await? else {
        debug!(%task_id, "breakdown: no such task");
        return Ok(BreakdownOutcome::NotFound);
    };

    if task.has_subtasks() {
        debug!(%task_id, "breakdown: task already has subtasks, suppressing request");
        return Ok(BreakdownOutcome::AlreadyBrokenDown(task));
    }

    let steps = service.generate_subtasks(&task.title).await;

    // Another breakdown of this task may have landed while we were waiting
    let Some(warning) = manager.add_subtasks_if_empty(task_id, steps).await? else {
        debug!(%task_id, "breakdown: lost race to another breakdown, discarding steps");
        return match manager.get(task_id).await? {
            Some(task) => Ok(BreakdownOutcome::AlreadyBrokenDown(task)),
            None => Ok(BreakdownOutcome::TaskRemoved),
        };
    };

    match manager.get(task_id).await? {
        Some(task) => {
            info!(%task_id, count = task.subtasks.len(), "Broke task down into subtasks");
            Ok(BreakdownOutcome::Generated { task, warning })
        }
        None => {
            debug!(%task_id, "breakdown: task removed while generating");
            Ok(BreakdownOutcome::TaskRemoved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{FALLBACK_SUBTASKS, OfflineTextService, fallback_subtasks};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use taskstore::{MemoryKvStore, TaskPersistence, TaskStore};
    use tokio::sync::Notify;

    fn spawn_manager() -> StoreManager {
        StoreManager::spawn(TaskStore::open(TaskPersistence::new(MemoryKvStore::new())))
    }

    /// Echoes the title back as steps, after an optional gate
    struct EchoService {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        delay: Duration,
    }

    impl EchoService {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl TextService for EchoService {
        async fn generate_subtasks(&self, title: &str) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            tokio::time::sleep(self.delay).await;
            vec![format!("{} step 1", title), format!("{} step 2", title)]
        }

        async fn motivational_quote(&self) -> String {
            String::new()
        }

        fn is_live(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_breakdown_offline_appends_fallback() {
        let manager = spawn_manager();
        let (task, _) = manager.add("Write report").await.unwrap();

        let outcome = breakdown(&manager, &OfflineTextService, &task.id).await.unwrap();
        let titles: Vec<String> = outcome.subtasks().iter().map(|s| s.title.clone()).collect();
        assert_eq!(titles, fallback_subtasks());
        assert!(matches!(outcome, BreakdownOutcome::Generated { warning: None, .. }));
    }

    #[tokio::test]
    async fn test_breakdown_suppressed_when_subtasks_exist() {
        let manager = spawn_manager();
        let (task, _) = manager.add("Write report").await.unwrap();
        let service = EchoService::new();

        breakdown(&manager, &service, &task.id).await.unwrap();
        let outcome = breakdown(&manager, &service, &task.id).await.unwrap();

        assert!(matches!(outcome, BreakdownOutcome::AlreadyBrokenDown(_)));
        assert_eq!(outcome.subtasks().len(), 2);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_breakdown_unknown_task() {
        let manager = spawn_manager();
        let outcome = breakdown(&manager, &EchoService::new(), "missing").await.unwrap();
        assert!(matches!(outcome, BreakdownOutcome::NotFound));
        assert!(outcome.subtasks().is_empty());
    }

    #[tokio::test]
    async fn test_delete_while_generating() {
        let manager = spawn_manager();
        let (task, _) = manager.add("Doomed").await.unwrap();
        let gate = Arc::new(Notify::new());
        let service = Arc::new(EchoService {
            gate: Some(gate.clone()),
            ..EchoService::new()
        });

        let pending = {
            let manager = manager.clone();
            let service = service.clone();
            let id = task.id.clone();
            tokio::spawn(async move { breakdown(&manager, service.as_ref(), &id).await })
        };

        // The store stays usable while the request is pending
        while service.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        manager.delete(&task.id).await.unwrap();
        gate.notify_one();

        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, BreakdownOutcome::TaskRemoved));
        assert!(manager.get(&task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_breakdowns_of_one_task_append_once() {
        let manager = spawn_manager();
        let (task, _) = manager.add("Plan launch").await.unwrap();

        let (first, second) = tokio::join!(
            breakdown(&manager, &OfflineTextService, &task.id),
            breakdown(&manager, &OfflineTextService, &task.id)
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        let generated = outcomes
            .iter()
            .filter(|o| matches!(o, BreakdownOutcome::Generated { .. }))
            .count();
        assert_eq!(generated, 1);
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, BreakdownOutcome::AlreadyBrokenDown(_)))
        );

        let task = manager.get(&task.id).await.unwrap().unwrap();
        assert_eq!(task.subtasks.len(), FALLBACK_SUBTASKS.len());
    }

    #[tokio::test]
    async fn test_concurrent_breakdowns_are_independent() {
        let manager = spawn_manager();
        let (a, _) = manager.add("Alpha").await.unwrap();
        let (b, _) = manager.add("Beta").await.unwrap();
        let slow = EchoService {
            delay: Duration::from_millis(30),
            ..EchoService::new()
        };
        let fast = EchoService::new();

        let (ra, rb) = tokio::join!(breakdown(&manager, &slow, &a.id), breakdown(&manager, &fast, &b.id));
        ra.unwrap();
        rb.unwrap();

        let a = manager.get(&a.id).await.unwrap().unwrap();
        let b = manager.get(&b.id).await.unwrap().unwrap();
        assert_eq!(a.subtasks[0].title, "Alpha step 1");
        assert_eq!(b.subtasks[1].title, "Beta step 2");
    }
}
