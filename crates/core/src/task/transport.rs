//! Task transport trait
//!
//! Defines the interface the view-model uses to reach the task collection
//! endpoint. Implementations translate every failure into one of the
//! kind-labelled errors (`FetchFailed`, `CreateFailed`, `UpdateFailed`,
//! `DeleteFailed`) or `SessionExpired`, and never return partial data.

use async_trait::async_trait;

use super::model::{CreateTaskDto, Task, TaskId, UpdateTaskDto};
use crate::Result;

/// Transport interface for task CRUD operations
#[async_trait]
pub trait TaskTransport: Send + Sync {
    /// `GET /api/tasks/`
    async fn list(&self) -> Result<Vec<Task>>;

    /// `GET /api/tasks/{id}/`
    async fn get(&self, id: TaskId) -> Result<Task>;

    /// `POST /api/tasks/`
    async fn create(&self, task: &CreateTaskDto) -> Result<Task>;

    /// `PATCH /api/tasks/{id}/`
    async fn update(&self, id: TaskId, patch: &UpdateTaskDto) -> Result<Task>;

    /// `DELETE /api/tasks/{id}/`
    async fn delete(&self, id: TaskId) -> Result<()>;
}
