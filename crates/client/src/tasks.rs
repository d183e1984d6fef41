//! Task collection endpoint
//!
//! Thin request/response mapping for `/api/tasks/`. Every failure is
//! relabelled with the operation it belongs to; a 401 becomes
//! `SessionExpired`.

use async_trait::async_trait;
use tracing::error;

use tm_core::task::{CreateTaskDto, Task, TaskId, TaskTransport, UpdateTaskDto};
use tm_core::{Error, Result};

use crate::api::ApiClient;
use crate::error::ApiError;

const TASKS_PATH: &str = "/api/tasks/";

fn task_path(id: TaskId) -> String {
    format!("{}{}/", TASKS_PATH, id)
}

/// Map a request failure to the caller-facing error for one operation
fn label(err: ApiError, kind: impl FnOnce(String) -> Error) -> Error {
    match err {
        ApiError::Unauthorized => Error::SessionExpired,
        other => kind(other.to_string()),
    }
}

/// [`TaskTransport`] over HTTP
#[derive(Clone)]
pub struct HttpTaskTransport {
    api: ApiClient,
}

impl HttpTaskTransport {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TaskTransport for HttpTaskTransport {
    async fn list(&self) -> Result<Vec<Task>> {
        self.api.get(TASKS_PATH).await.map_err(|e| {
            error!("Error fetching tasks: {}", e);
            label(e, |reason| Error::fetch_failed(None, reason))
        })
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        self.api.get(&task_path(id)).await.map_err(|e| {
            error!("Error fetching task {}: {}", id, e);
            label(e, |reason| Error::fetch_failed(Some(id), reason))
        })
    }

    async fn create(&self, task: &CreateTaskDto) -> Result<Task> {
        self.api.post(TASKS_PATH, task).await.map_err(|e| {
            error!("Error creating task: {}", e);
            label(e, Error::create_failed)
        })
    }

    async fn update(&self, id: TaskId, patch: &UpdateTaskDto) -> Result<Task> {
        self.api.patch(&task_path(id), patch).await.map_err(|e| {
            error!("Error updating task {}: {}", id, e);
            label(e, |reason| Error::update_failed(id, reason))
        })
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.api.delete(&task_path(id)).await.map_err(|e| {
            error!("Error deleting task {}: {}", id, e);
            label(e, |reason| Error::delete_failed(id, reason))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HttpAuthApi;
    use crate::stub::{serve, RecordingCredentials};
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tm_core::session::{
        LoginCredentials, MemoryTokenStore, SessionEvent, SessionHandle, SessionStore,
    };
    use tm_core::task::{TaskPriority, TaskStatus};

    #[derive(Clone)]
    struct Backend {
        tasks: Arc<Mutex<Vec<Task>>>,
    }

    fn authorized(headers: &HeaderMap) -> std::result::Result<(), StatusCode> {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Token tok") => Ok(()),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn list_tasks(
        State(backend): State<Backend>,
        headers: HeaderMap,
    ) -> std::result::Result<Json<Vec<Task>>, StatusCode> {
        authorized(&headers)?;
        Ok(Json(backend.tasks.lock().unwrap().clone()))
    }

    async fn create_task(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Json(req): Json<CreateTaskDto>,
    ) -> std::result::Result<(StatusCode, Json<Task>), StatusCode> {
        authorized(&headers)?;
        if req.title.is_empty() {
            return Err(StatusCode::BAD_REQUEST);
        }
        let mut tasks = backend.tasks.lock().unwrap();
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut task = Task::new(id, req.title, req.description)
            .with_priority(req.priority)
            .with_owner(1);
        task.status = req.status;
        tasks.push(task.clone());
        Ok((StatusCode::CREATED, Json(task)))
    }

    async fn get_task(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<TaskId>,
    ) -> std::result::Result<Json<Task>, StatusCode> {
        authorized(&headers)?;
        backend
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .map(Json)
            .ok_or(StatusCode::NOT_FOUND)
    }

    async fn update_task(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<TaskId>,
        Json(patch): Json<UpdateTaskDto>,
    ) -> std::result::Result<Json<Task>, StatusCode> {
        authorized(&headers)?;
        let mut tasks = backend.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StatusCode::NOT_FOUND)?;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if patch.status.is_some() {
            task.status = patch.status;
        }
        task.updated_at = chrono::Utc::now();
        Ok(Json(task.clone()))
    }

    async fn delete_task(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<TaskId>,
    ) -> StatusCode {
        if let Err(status) = authorized(&headers) {
            return status;
        }
        let mut tasks = backend.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::NO_CONTENT
        }
    }

    /// Login that hands out a token the task endpoints do not accept
    async fn issue_revoked_token() -> Json<Value> {
        Json(json!({ "id": 1, "username": "alice", "email": "a@x.com", "token": "revoked" }))
    }

    fn seeded() -> Backend {
        Backend {
            tasks: Arc::new(Mutex::new(vec![
                Task::new(1, "Task 1", "Description 1")
                    .with_status(TaskStatus::Pending)
                    .with_owner(1),
                Task::new(2, "Task 2", "Description 2")
                    .with_priority(TaskPriority::High)
                    .with_status(TaskStatus::InProgress)
                    .with_owner(1),
            ])),
        }
    }

    async fn start_backend() -> (String, Backend) {
        let backend = seeded();
        let router = Router::new()
            .route("/api/tasks/", get(list_tasks).post(create_task))
            .route(
                "/api/tasks/{id}/",
                get(get_task).patch(update_task).delete(delete_task),
            )
            .with_state(backend.clone());
        (serve(router).await, backend)
    }

    fn transport(base: String, token: &str) -> (HttpTaskTransport, Arc<RecordingCredentials>) {
        let credentials = RecordingCredentials::with_token(token);
        let api = ApiClient::new(base, credentials.clone());
        (HttpTaskTransport::new(api), credentials)
    }

    #[tokio::test]
    async fn test_list_tasks() {
        let (base, backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        let result = tasks.list().await.unwrap();

        assert_eq!(result, *backend.tasks.lock().unwrap());
    }

    #[tokio::test]
    async fn test_get_task_by_id() {
        let (base, _backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        let task = tasks.get(2).await.unwrap();
        assert_eq!(task.title, "Task 2");

        let err = tasks.get(999).await.unwrap_err();
        assert!(matches!(err, Error::FetchFailed { task_id: Some(999), .. }));
        assert_eq!(err.to_string(), "Failed to fetch task");
    }

    #[tokio::test]
    async fn test_create_task() {
        let (base, backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        let dto = CreateTaskDto::new("New Task", "New Description")
            .with_priority(TaskPriority::Low)
            .with_status(TaskStatus::Pending);
        let created = tasks.create(&dto).await.unwrap();

        assert_eq!(created.id, 3);
        assert_eq!(created.title, "New Task");
        assert_eq!(created.priority, TaskPriority::Low);
        assert_eq!(backend.tasks.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_rejected_is_create_failed() {
        let (base, backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        let err = tasks
            .create(&CreateTaskDto::new("", "server says no"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CreateFailed { .. }));
        assert_eq!(backend.tasks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_sends_partial_body() {
        let (base, _backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        let updated = tasks
            .update(1, &UpdateTaskDto::status(TaskStatus::Completed))
            .await
            .unwrap();

        assert_eq!(updated.status, Some(TaskStatus::Completed));
        assert_eq!(updated.title, "Task 1");
        assert_eq!(updated.priority, TaskPriority::Medium);

        let err = tasks
            .update(999, &UpdateTaskDto::status(TaskStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpdateFailed { task_id: 999, .. }));
    }

    #[tokio::test]
    async fn test_delete_task() {
        let (base, backend) = start_backend().await;
        let (tasks, _) = transport(base, "tok");

        tasks.delete(1).await.unwrap();
        assert_eq!(backend.tasks.lock().unwrap().len(), 1);

        let err = tasks.delete(1).await.unwrap_err();
        assert!(matches!(err, Error::DeleteFailed { task_id: 1, .. }));
        assert_eq!(backend.tasks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_is_session_expired() {
        let (base, _backend) = start_backend().await;
        let (tasks, credentials) = transport(base, "stale");

        let err = tasks.list().await.unwrap_err();

        assert_eq!(err, Error::SessionExpired);
        assert_eq!(credentials.invalidations(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fetch_failed() {
        let (tasks, credentials) = transport("http://127.0.0.1:9".to_string(), "tok");

        let err = tasks.list().await.unwrap_err();

        assert!(matches!(err, Error::FetchFailed { task_id: None, .. }));
        assert_eq!(err.to_string(), "Failed to fetch tasks");
        assert_eq!(credentials.invalidations(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_rejections_expire_session_once() {
        let backend = seeded();
        let router = Router::new()
            .route("/api-token-auth/", post(issue_revoked_token))
            .route("/api/tasks/", get(list_tasks))
            .with_state(backend);
        let base = serve(router).await;

        let session = SessionHandle::new(MemoryTokenStore::new());
        let api = ApiClient::new(base, Arc::new(session.clone()));
        let store = SessionStore::new(session.clone(), Arc::new(HttpAuthApi::new(api.clone())));
        store
            .login(&LoginCredentials::new("alice", "secret123"))
            .await
            .unwrap();
        let mut events = session.subscribe();
        let tasks = HttpTaskTransport::new(api);

        let (first, second) = tokio::join!(tasks.list(), tasks.list());

        assert_eq!(first.unwrap_err(), Error::SessionExpired);
        assert_eq!(second.unwrap_err(), Error::SessionExpired);
        assert_eq!(session.stored_token(), None);
        assert_eq!(session.user().await, None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Expired);
        assert!(events.try_recv().is_err());
    }
}
