//! Locally persisted task list.
//!
//! The whole list is written to its [`SnapshotSlot`] after every mutation and
//! read back once in [`TaskStore::open`]. Storage failures are surfaced next to
//! the result of the operation instead of failing it: the in-memory list is the
//! source of truth for the session.

use std::collections::HashSet;

use shared::domain::{Task, TaskCounts, TaskFilter, TaskId};
use storage::SnapshotSlot;
use tracing::{info, warn};

use crate::error::{PersistenceError, TaskStoreError};

/// Result of a mutation that was applied in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome<T> {
    pub value: T,
    /// Set when the snapshot write after the mutation failed.
    pub persist_error: Option<PersistenceError>,
}

impl<T> StoreOutcome<T> {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

pub struct TaskStore<S: SnapshotSlot> {
    slot: S,
    tasks: Vec<Task>,
}

impl<S: SnapshotSlot> TaskStore<S> {
    /// Rehydrates from `slot`. A missing snapshot yields an empty store; an
    /// unreadable or malformed one yields an empty store plus the error.
    pub async fn open(slot: S) -> (Self, Option<PersistenceError>) {
        let loaded = match slot.read_snapshot().await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(raw)) => decode_snapshot(&raw).map_err(|reason| PersistenceError::Malformed {
                slot: slot.describe(),
                reason,
            }),
            Err(err) => Err(PersistenceError::Read {
                slot: slot.describe(),
                reason: format!("{err:#}"),
            }),
        };

        match loaded {
            Ok(tasks) => {
                info!("tasks: loaded count={} slot={}", tasks.len(), slot.describe());
                (Self { slot, tasks }, None)
            }
            Err(err) => {
                warn!("tasks: starting empty, snapshot unusable: {err}");
                (
                    Self {
                        slot,
                        tasks: Vec::new(),
                    },
                    Some(err),
                )
            }
        }
    }

    /// All tasks in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn list_filtered(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|task| filter.matches(task)).collect()
    }

    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        TaskCounts {
            total: self.tasks.len(),
            active: self.tasks.len() - completed,
            completed,
        }
    }

    pub async fn create(&mut self, title: &str) -> Result<StoreOutcome<Task>, TaskStoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskStoreError::Validation(
                "title must not be empty".to_string(),
            ));
        }

        let mut task = Task::new(title);
        while self.get(task.id).is_some() {
            task.id = TaskId::generate();
        }
        self.tasks.push(task.clone());
        Ok(self.commit(task).await)
    }

    pub async fn toggle_complete(
        &mut self,
        id: TaskId,
    ) -> Result<StoreOutcome<Task>, TaskStoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(TaskStoreError::NotFound(id))?;
        task.completed = !task.completed;
        let task = task.clone();
        Ok(self.commit(task).await)
    }

    /// Removes and returns the task. Removing the same id twice fails.
    pub async fn remove(&mut self, id: TaskId) -> Result<StoreOutcome<Task>, TaskStoreError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskStoreError::NotFound(id))?;
        let task = self.tasks.remove(index);
        Ok(self.commit(task).await)
    }

    async fn commit<T>(&self, value: T) -> StoreOutcome<T> {
        let persist_error = self.persist().await.err();
        StoreOutcome {
            value,
            persist_error,
        }
    }

    async fn persist(&self) -> Result<(), PersistenceError> {
        let payload = encode_snapshot(&self.tasks)?;
        self.slot.write_snapshot(&payload).await.map_err(|err| {
            let err = PersistenceError::Write {
                slot: self.slot.describe(),
                reason: format!("{err:#}"),
            };
            warn!("tasks: {err}; keeping in-memory state");
            err
        })
    }
}

pub fn encode_snapshot(tasks: &[Task]) -> Result<String, PersistenceError> {
    serde_json::to_string(tasks).map_err(|err| PersistenceError::Encode(err.to_string()))
}

/// Parses a snapshot and checks the invariants a valid task list upholds.
pub fn decode_snapshot(raw: &str) -> Result<Vec<Task>, String> {
    let tasks: Vec<Task> = serde_json::from_str(raw).map_err(|err| err.to_string())?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(format!("duplicate task id {}", task.id));
        }
        if task.title.trim().is_empty() {
            return Err(format!("task {} has an empty title", task.id));
        }
    }
    Ok(tasks)
}

#[cfg(test)]
#[path = "tests/task_store_tests.rs"]
mod tests;
