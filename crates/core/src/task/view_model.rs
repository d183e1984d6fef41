//! Task-list view-model
//!
//! Owns the in-memory task collection for the current session. The
//! collection only ever reflects server-confirmed state: each operation
//! calls the transport first and applies the returned result afterwards.
//! The lock is never held across a transport call, so concurrent operations
//! each apply their own response when it arrives.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::filter::{filtered_view, TaskFilter};
use super::model::{CreateTaskDto, Task, TaskId, TaskStatus, UpdateTaskDto};
use super::transport::TaskTransport;
use crate::notify::Notifier;
use crate::validation::{validate_new_task, validate_task_patch};
use crate::{Error, Result};

/// Loading state of the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// The last fetch failed. The previous collection is kept.
    Failed { message: String },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

#[derive(Debug)]
struct ViewState {
    tasks: Vec<Task>,
    load: LoadState,
    /// Page-level error from the last failed action
    error: Option<String>,
}

/// View-model for the protected task page
pub struct TaskViewModel {
    transport: Arc<dyn TaskTransport>,
    notifier: Notifier,
    state: RwLock<ViewState>,
}

impl TaskViewModel {
    pub fn new(transport: Arc<dyn TaskTransport>, notifier: Notifier) -> Self {
        Self {
            transport,
            notifier,
            state: RwLock::new(ViewState {
                tasks: Vec::new(),
                load: LoadState::Idle,
                error: None,
            }),
        }
    }

    pub async fn load_state(&self) -> LoadState {
        self.state.read().await.load.clone()
    }

    /// Page-level error message, if the last action failed
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Snapshot of the collection in insertion order
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.tasks.is_empty()
    }

    /// Filtered snapshot; see [`filtered_view`]
    pub async fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        let state = self.state.read().await;
        filtered_view(&state.tasks, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fetch the whole collection. Entered on mount and on explicit refresh.
    pub async fn refresh(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.load = LoadState::Loading;
            state.error = None;
        }

        match self.transport.list().await {
            Ok(tasks) => {
                debug!("Loaded {} tasks", tasks.len());
                let mut state = self.state.write().await;
                state.tasks = tasks;
                state.load = LoadState::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching tasks: {}", e);
                let mut state = self.state.write().await;
                // Stale collection is kept on purpose
                if e.is_session_expired() {
                    state.load = LoadState::Failed {
                        message: e.to_string(),
                    };
                } else {
                    let message = "Failed to load tasks. Please try again later.".to_string();
                    state.load = LoadState::Failed {
                        message: message.clone(),
                    };
                    state.error = Some(message);
                    drop(state);
                    self.notifier.error("Failed to load tasks");
                }
                Err(e)
            }
        }
    }

    /// Validate, submit, and append the server-returned task unless the
    /// collection already holds its id
    pub async fn create(&self, draft: CreateTaskDto) -> Result<Task> {
        validate_new_task(&draft)?;
        self.clear_error().await;

        match self.transport.create(&draft).await {
            Ok(task) => {
                debug!("Created task {}", task.id);
                let mut state = self.state.write().await;
                // A refresh that landed first may already hold this task
                match state.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(entry) => *entry = task.clone(),
                    None => state.tasks.push(task.clone()),
                }
                drop(state);
                self.notifier.success("Task created successfully");
                Ok(task)
            }
            Err(e) => {
                warn!("Error creating task: {}", e);
                Err(self
                    .fail(e, "Failed to create task. Please try again.", "Failed to create task")
                    .await)
            }
        }
    }

    /// Submit a partial update and replace the matching entry by id
    pub async fn update(&self, id: TaskId, patch: UpdateTaskDto) -> Result<Task> {
        validate_task_patch(&patch)?;
        self.clear_error().await;

        match self.transport.update(id, &patch).await {
            Ok(task) => {
                debug!("Updated task {}", id);
                let mut state = self.state.write().await;
                if let Some(entry) = state.tasks.iter_mut().find(|t| t.id == id) {
                    *entry = task.clone();
                }
                drop(state);
                self.notifier.success("Task updated successfully");
                Ok(task)
            }
            Err(e) => {
                warn!("Error updating task {}: {}", id, e);
                Err(self
                    .fail(e, "Failed to update task. Please try again.", "Failed to update task")
                    .await)
            }
        }
    }

    /// Delete on the server, then drop the entry by id
    pub async fn delete(&self, id: TaskId) -> Result<()> {
        self.clear_error().await;

        match self.transport.delete(id).await {
            Ok(()) => {
                debug!("Deleted task {}", id);
                self.state.write().await.tasks.retain(|t| t.id != id);
                self.notifier.success("Task deleted successfully");
                Ok(())
            }
            Err(e) => {
                warn!("Error deleting task {}: {}", id, e);
                Err(self
                    .fail(e, "Failed to delete task. Please try again.", "Failed to delete task")
                    .await)
            }
        }
    }

    /// Fetch one task; a held entry with that id is replaced by the fresh copy
    pub async fn fetch(&self, id: TaskId) -> Result<Task> {
        self.clear_error().await;

        match self.transport.get(id).await {
            Ok(task) => {
                let mut state = self.state.write().await;
                if let Some(entry) = state.tasks.iter_mut().find(|t| t.id == id) {
                    *entry = task.clone();
                }
                Ok(task)
            }
            Err(e) => {
                warn!("Error fetching task {}: {}", id, e);
                Err(self
                    .fail(e, "Failed to fetch task. Please try again.", "Failed to fetch task")
                    .await)
            }
        }
    }

    /// Same as `update(id, {status})`
    pub async fn change_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        self.update(id, UpdateTaskDto::status(status)).await
    }

    async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    /// Record the page error and notify, unless the session expired; that
    /// case is handled globally.
    async fn fail(&self, error: Error, page_message: &str, toast: &str) -> Error {
        if !error.is_session_expired() {
            self.state.write().await.error = Some(page_message.to_string());
            self.notifier.error(toast);
        }
        error
    }
}
