//! # Task list reconciler
//!
//! [`TaskList`] is the client-side copy of the current owner's tasks. It is filled by
//! a bulk fetch ([`TaskList::load`], taken with [`TaskList::replace_loaded`]) and kept
//! current by applying [`TaskEvent`]s from the record store's change subscription
//! through the single [`TaskList::apply`] entry point.
//!
//! The async steps never borrow the list, so a caller keeping it behind a reactive
//! cell only writes to it between awaits.
//!
//! Ordering is `created_at` descending after a load; later inserts are prepended, so
//! after the first event the order is "most recent event first".
//!
//! Update and delete are idempotent (matched by id). Insert is governed by
//! [`InsertPolicy`]: `AlwaysPrepend` reproduces the historical behavior where a
//! redelivered insert produces a duplicate entry, `ReplaceExisting` keeps ids unique.

use serde::{Deserialize, Serialize};

use crate::backend::{ChangeKind, RecordChange, RecordStore};
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::filter::{Filter, Order};
use crate::models::{Owner, Task, TaskId};

/// How an insert event for an id that is already listed is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertPolicy {
    /// Prepend unconditionally; a repeated insert yields a duplicate entry.
    AlwaysPrepend,
    /// Replace the listed entry in place; prepend only unseen ids.
    #[default]
    ReplaceExisting,
}

/// One change to apply to the list.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskEvent {
    Insert(Task),
    Update(Task),
    Delete(TaskId),
}

impl TaskEvent {
    /// Project a raw record-store change onto a typed event.
    pub fn from_change(change: RecordChange) -> Result<Self> {
        let decode = |row: Option<serde_json::Value>| -> Result<Task> {
            let row = row.ok_or_else(|| Error::Fetch("change is missing its record".to_string()))?;
            serde_json::from_value(row).map_err(|e| Error::Fetch(e.to_string()))
        };
        match change.kind {
            ChangeKind::Insert => decode(change.new).map(TaskEvent::Insert),
            ChangeKind::Update => decode(change.new).map(TaskEvent::Update),
            ChangeKind::Delete => change
                .old
                .as_ref()
                .and_then(|old| old.get("id"))
                .and_then(|id| id.as_i64())
                .map(TaskEvent::Delete)
                .ok_or_else(|| Error::Fetch("delete change is missing the id".to_string())),
        }
    }
}

/// Ordered tasks of one owner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
    policy: InsertPolicy,
}

impl TaskList {
    pub fn new(policy: InsertPolicy) -> Self {
        Self {
            tasks: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> InsertPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Fetch the owner's tasks, newest first. Pair with [`TaskList::replace_loaded`].
    pub async fn load<S: RecordStore>(
        store: &S,
        config: &TasksConfig,
        owner_email: &str,
    ) -> Result<Vec<Task>> {
        let filter = Filter::new().eq(&config.owner_column, owner_email);
        store
            .select(&config.table, &filter, Some(&Order::desc("created_at")))
            .await
    }

    /// Replace the whole sequence.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Take the result of a [`TaskList::load`]. On failure the current sequence is kept.
    pub fn replace_loaded(&mut self, loaded: Result<Vec<Task>>) -> Result<()> {
        let tasks = loaded?;
        tracing::debug!(count = tasks.len(), "loaded tasks");
        self.replace(tasks);
        Ok(())
    }

    /// Apply one change event.
    pub fn apply(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Insert(task) => self.apply_insert(task),
            TaskEvent::Update(task) => self.apply_update(task),
            TaskEvent::Delete(id) => self.apply_delete(id),
        }
    }

    pub fn apply_insert(&mut self, task: Task) {
        if self.policy == InsertPolicy::ReplaceExisting {
            if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                tracing::debug!(id = task.id, "insert for listed task, replacing");
                *existing = task;
                return;
            }
        }
        self.tasks.insert(0, task);
    }

    pub fn apply_update(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => tracing::debug!(id = task.id, "update for unlisted task dropped"),
        }
    }

    pub fn apply_delete(&mut self, id: TaskId) {
        self.tasks.retain(|t| t.id != id);
    }

    /// Delete a task on the backend, scoped to its owner. On failure the owner's
    /// tasks are loaded again so the list can be resynchronized.
    ///
    /// Nothing is changed locally until the outcome is passed to
    /// [`TaskList::settle_delete`].
    pub async fn delete<S: RecordStore>(
        store: &S,
        config: &TasksConfig,
        id: TaskId,
        owner: &Owner,
    ) -> DeleteOutcome {
        match delete_task(store, config, id, owner).await {
            Ok(()) => DeleteOutcome::Deleted(id),
            Err(error) => {
                tracing::warn!(id, %error, "delete failed, reloading tasks");
                let reloaded = Self::load(store, config, &owner.email).await;
                DeleteOutcome::Failed { error, reloaded }
            }
        }
    }

    /// Apply a delete outcome: drop the task, or take the reloaded tasks. Returns the
    /// delete's own error, if any.
    ///
    /// A successful delete also arrives later as a delete event; that second removal
    /// is a no-op.
    pub fn settle_delete(&mut self, outcome: DeleteOutcome) -> Result<()> {
        match outcome {
            DeleteOutcome::Deleted(id) => {
                self.apply_delete(id);
                Ok(())
            }
            DeleteOutcome::Failed { error, reloaded } => {
                if let Err(reload) = self.replace_loaded(reloaded) {
                    tracing::warn!(error = %reload, "reload after failed delete also failed");
                }
                Err(error)
            }
        }
    }
}

/// What a delete attempt left to apply to the list.
#[derive(Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted(TaskId),
    Failed {
        error: Error,
        reloaded: Result<Vec<Task>>,
    },
}

/// Issue a delete filtered by id and owner email.
async fn delete_task<S: RecordStore>(
    store: &S,
    config: &TasksConfig,
    id: TaskId,
    owner: &Owner,
) -> Result<()> {
    let filter = Filter::new()
        .eq("id", id)
        .eq(&config.owner_column, owner.email.as_str());
    store.delete(&config.table, &filter).await
}
