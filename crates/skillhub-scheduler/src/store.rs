use std::sync::Arc;

use dashmap::DashMap;
use tracing::instrument;

use crate::error::{Result, SchedulerError};
use crate::types::ScheduledTask;

/// Persistence collaborator for scheduled-task records.
///
/// Plain CRUD with no transactions: concurrent writers to the same id are
/// last-writer-wins.
pub trait TaskStore: Send + Sync {
    /// Persist a new record. The id must not exist yet.
    fn insert(&self, task: &ScheduledTask) -> Result<()>;

    /// Fetch a record, `None` when the id is unknown.
    fn get(&self, id: &str) -> Result<Option<ScheduledTask>>;

    /// Overwrite an existing record. Fails with `NotFound` if the id is unknown.
    fn update(&self, task: &ScheduledTask) -> Result<()>;

    /// Remove a record. Fails with `NotFound` if the id is unknown.
    fn delete(&self, id: &str) -> Result<()>;

    /// Every stored record, oldest first.
    fn list(&self) -> Result<Vec<ScheduledTask>>;
}

/// In-process store backed by a concurrent map. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: DashMap<String, ScheduledTask>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    #[instrument(skip(self, task), fields(id = %task.id))]
    fn insert(&self, task: &ScheduledTask) -> Result<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(SchedulerError::Storage(format!("duplicate task id: {}", task.id)));
        }
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ScheduledTask>> {
        Ok(self.tasks.get(id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    fn update(&self, task: &ScheduledTask) -> Result<()> {
        match self.tasks.get_mut(&task.id) {
            Some(mut entry) => {
                *entry = task.clone();
                Ok(())
            }
            None => Err(SchedulerError::NotFound {
                id: task.id.clone(),
            }),
        }
    }

    #[instrument(skip(self))]
    fn delete(&self, id: &str) -> Result<()> {
        self.tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SchedulerError::NotFound { id: id.to_string() })
    }

    fn list(&self) -> Result<Vec<ScheduledTask>> {
        let mut tasks: Vec<ScheduledTask> = self.tasks.iter().map(|e| e.value().clone()).collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }
}

impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    fn insert(&self, task: &ScheduledTask) -> Result<()> {
        (**self).insert(task)
    }

    fn get(&self, id: &str) -> Result<Option<ScheduledTask>> {
        (**self).get(id)
    }

    fn update(&self, task: &ScheduledTask) -> Result<()> {
        (**self).update(task)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }

    fn list(&self) -> Result<Vec<ScheduledTask>> {
        (**self).list()
    }
}
