//! Application wiring and command dispatch
//!
//! Builds the session handle first, then the API client on top of it, then
//! the auth API and task transport, and finally the session store and task
//! view-model. Commands run under a route; the guard decides whether they
//! may proceed.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};

use tm_client::{ApiClient, HttpAuthApi, HttpTaskTransport};
use tm_core::notify::{Notification, Notifier};
use tm_core::session::{
    FileTokenStore, LoginCredentials, RegisterCredentials, SessionEvent, SessionHandle,
    SessionStore, User,
};
use tm_core::task::{CreateTaskDto, TaskFilter, TaskTransport, TaskViewModel, UpdateTaskDto};

use crate::cli::{Command, TaskCommand};
use crate::config::Config;
use crate::render;
use crate::routes::{GuardState, Navigator, Outcome, Route};

pub struct App {
    config: Config,
    session: SessionStore,
    tasks: TaskViewModel,
    navigator: Navigator,
    guard: GuardState,
    events: broadcast::Receiver<SessionEvent>,
    notes: broadcast::Receiver<Notification>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let handle = SessionHandle::new(FileTokenStore::new(&config.token_file));
        let api = ApiClient::new(config.api_url.clone(), Arc::new(handle.clone()));

        let auth = Arc::new(HttpAuthApi::new(api.clone()));
        let transport: Arc<dyn TaskTransport> = Arc::new(HttpTaskTransport::new(api));

        let notifier = Notifier::new();
        let notes = notifier.subscribe();
        let events = handle.subscribe();

        Self {
            session: SessionStore::new(handle, auth),
            tasks: TaskViewModel::new(transport, notifier),
            navigator: Navigator::new(),
            guard: GuardState::Checking,
            events,
            notes,
            config,
        }
    }

    pub fn guard(&self) -> GuardState {
        self.guard
    }

    pub fn current_route(&self) -> Option<&Route> {
        self.navigator.current()
    }

    /// Resolve the persisted token once, before any navigation decision
    pub async fn start(&mut self) {
        let user = self.session.restore().await;
        self.guard = GuardState::from_user(user.as_ref());
        self.drain_session_events();
        debug!("Startup guard state: {:?}", self.guard);
    }

    /// Run one command and return what it rendered
    pub async fn run(&mut self, command: Command) -> Result<String> {
        if let Some(location) = command.route() {
            let outcome = self.navigator.navigate(location, self.guard);
            if outcome != Outcome::Render(Route::parse(location)) {
                bail!("Not signed in\n{}", render::screen(&Route::Login));
            }
        }

        let result = self.dispatch(command).await;
        self.drain_session_events();
        result
    }

    /// Notifications published since the last call, rendered
    pub fn take_notifications(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match self.notes.try_recv() {
                Ok(note) => lines.push(render::notification(&note)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        lines
    }

    async fn dispatch(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Login { username, password } => {
                let user = self
                    .session
                    .login(&LoginCredentials::new(username, password))
                    .await?;
                self.guard = GuardState::Authenticated;
                self.navigator.navigate("/tasks", self.guard);
                Ok(format!("Signed in as {}", user.username))
            }
            Command::Register {
                username,
                email,
                password,
                password2,
            } => {
                self.session
                    .register(&RegisterCredentials::new(username, email, password, password2))
                    .await?;
                self.navigator.navigate("/login", self.guard);
                Ok("Registration successful. Please sign in.".to_string())
            }
            Command::Logout => {
                self.session.logout().await;
                self.guard = GuardState::Unauthenticated;
                self.navigator.navigate("/login", self.guard);
                Ok("Signed out".to_string())
            }
            Command::Whoami => match self.session.current_user().await {
                Some(user) if self.config.json => self.json(&user),
                Some(user) => Ok(render::user_summary(&user)),
                None => bail!("Not signed in"),
            },
            Command::Open { path } => self.open(&path).await,
            Command::Tasks(command) => self.tasks(command).await,
        }
    }

    async fn open(&mut self, location: &str) -> Result<String> {
        let outcome = self.navigator.navigate(location, self.guard);
        let user = self.session.current_user().await;

        let route = match outcome {
            Outcome::Pending => return Ok(render::LOADING.to_string()),
            Outcome::Render(route) => route,
            Outcome::Redirect { to, .. } => to,
        };
        debug!("Rendering {}", route.path());

        let body = match route {
            Route::Tasks => {
                self.mount_tasks().await?;
                render::task_list(&self.tasks.tasks().await)
            }
            ref other => render::screen(other),
        };

        Ok(with_chrome(&route, user.as_ref(), body))
    }

    async fn tasks(&mut self, command: TaskCommand) -> Result<String> {
        self.mount_tasks().await?;

        match command {
            TaskCommand::List {
                search,
                priority,
                status,
            } => {
                let filter = TaskFilter::new()
                    .with_search(search)
                    .with_priority(priority)
                    .with_status(status);
                let visible = self.tasks.filtered(&filter).await;
                if self.config.json {
                    return self.json(&visible);
                }
                let user = self.session.current_user().await;
                Ok(with_chrome(
                    &Route::Tasks,
                    user.as_ref(),
                    render::task_list(&visible),
                ))
            }
            TaskCommand::Show { id } => match self.tasks.fetch(id).await {
                Ok(task) => self.task_output(&task),
                Err(e) => Err(self.failure(e).await),
            },
            TaskCommand::Create {
                title,
                description,
                priority,
                status,
            } => {
                let mut draft = CreateTaskDto::new(title, description).with_priority(priority);
                draft.status = status;
                match self.tasks.create(draft).await {
                    Ok(task) => self.task_output(&task),
                    Err(e) => Err(self.failure(e).await),
                }
            }
            TaskCommand::Update {
                id,
                title,
                description,
                priority,
                status,
            } => {
                let patch = UpdateTaskDto {
                    title,
                    description,
                    priority,
                    status,
                };
                if patch.is_empty() {
                    bail!("Nothing to update");
                }
                match self.tasks.update(id, patch).await {
                    Ok(task) => self.task_output(&task),
                    Err(e) => Err(self.failure(e).await),
                }
            }
            TaskCommand::Delete { id } => {
                match self.tasks.delete(id).await {
                    Ok(()) => Ok(format!("Deleted task #{}", id)),
                    Err(e) => Err(self.failure(e).await),
                }
            }
            TaskCommand::Status { id, status } => {
                match self.tasks.change_status(id, status).await {
                    Ok(task) => self.task_output(&task),
                    Err(e) => Err(self.failure(e).await),
                }
            }
        }
    }

    /// Mounting the task screen loads the collection
    async fn mount_tasks(&mut self) -> Result<()> {
        if let Err(e) = self.tasks.refresh().await {
            self.drain_session_events();
            return Err(self.failure(e).await);
        }
        Ok(())
    }

    /// Attach the page-level message, when the view-model recorded one
    async fn failure(&self, error: tm_core::Error) -> anyhow::Error {
        match self.tasks.error().await {
            Some(page) => anyhow!(error).context(page),
            None => anyhow!(error),
        }
    }

    fn task_output(&self, task: &tm_core::task::Task) -> Result<String> {
        if self.config.json {
            return self.json(task);
        }
        Ok(render::task_card(task))
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// Apply session events; an expired session forces the login screen
    fn drain_session_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Expired) => {
                    info!("Session expired, returning to login");
                    self.guard = GuardState::Unauthenticated;
                    self.navigator.force_login();
                }
                Ok(SessionEvent::SignedIn(_)) => self.guard = GuardState::Authenticated,
                Ok(SessionEvent::SignedOut) => self.guard = GuardState::Unauthenticated,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}

fn with_chrome(route: &Route, user: Option<&User>, body: String) -> String {
    match render::navbar(route, user) {
        Some(bar) => format!("{}\n\n{}", bar, body),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tm_core::task::{PriorityFilter, StatusFilter, Task, TaskPriority, TaskStatus};
    use tokio::net::TcpListener;

    #[derive(Clone)]
    struct Backend {
        tasks: Arc<Mutex<Vec<Task>>>,
        token: Arc<Mutex<String>>,
    }

    impl Backend {
        fn authorized(&self, headers: &HeaderMap) -> std::result::Result<(), StatusCode> {
            let expected = format!("Token {}", self.token.lock().unwrap());
            match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                Some(value) if value == expected => Ok(()),
                _ => Err(StatusCode::UNAUTHORIZED),
            }
        }
    }

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["username"] == "alice" && body["password"] == "secret123" {
            (
                StatusCode::OK,
                Json(json!({ "id": 1, "username": "alice", "email": "a@x.com", "token": "tok" })),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": ["Unable to log in with provided credentials."] })),
            )
        }
    }

    async fn me(
        State(backend): State<Backend>,
        headers: HeaderMap,
    ) -> std::result::Result<Json<Value>, StatusCode> {
        backend.authorized(&headers)?;
        Ok(Json(json!({ "id": 1, "username": "alice", "email": "a@x.com" })))
    }

    async fn list(
        State(backend): State<Backend>,
        headers: HeaderMap,
    ) -> std::result::Result<Json<Vec<Task>>, StatusCode> {
        backend.authorized(&headers)?;
        Ok(Json(backend.tasks.lock().unwrap().clone()))
    }

    async fn create(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Json(draft): Json<CreateTaskDto>,
    ) -> std::result::Result<(StatusCode, Json<Task>), StatusCode> {
        backend.authorized(&headers)?;
        let mut tasks = backend.tasks.lock().unwrap();
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut task = Task::new(id, draft.title, draft.description).with_priority(draft.priority);
        task.status = draft.status;
        tasks.push(task.clone());
        Ok((StatusCode::CREATED, Json(task)))
    }

    async fn show(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<u64>,
    ) -> std::result::Result<Json<Task>, StatusCode> {
        backend.authorized(&headers)?;
        let tasks = backend.tasks.lock().unwrap();
        let task = tasks.iter().find(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
        Ok(Json(task.clone()))
    }

    async fn patch(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<u64>,
        Json(patch): Json<UpdateTaskDto>,
    ) -> std::result::Result<Json<Task>, StatusCode> {
        backend.authorized(&headers)?;
        let mut tasks = backend.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StatusCode::NOT_FOUND)?;
        if patch.status.is_some() {
            task.status = patch.status;
        }
        Ok(Json(task.clone()))
    }

    async fn start_backend() -> (String, Backend) {
        let backend = Backend {
            tasks: Arc::new(Mutex::new(vec![
                Task::new(1, "Buy milk", "at the store").with_priority(TaskPriority::Low),
                Task::new(2, "Write report", "quarterly numbers")
                    .with_priority(TaskPriority::High)
                    .with_status(TaskStatus::Pending),
            ])),
            token: Arc::new(Mutex::new("tok".to_string())),
        };
        let router = Router::new()
            .route("/api-token-auth/", post(login))
            .route("/api/auth/user/", get(me))
            .route("/api/tasks/", get(list).post(create))
            .route("/api/tasks/{id}/", get(show).patch(patch))
            .with_state(backend.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}", addr), backend)
    }

    async fn app_with(api_url: String, dir: &TempDir, json: bool) -> App {
        let mut app = App::new(Config {
            api_url,
            token_file: dir.path().join("token"),
            json,
        });
        app.start().await;
        app
    }

    fn list_all() -> Command {
        Command::Tasks(TaskCommand::List {
            search: String::new(),
            priority: PriorityFilter::All,
            status: StatusFilter::All,
        })
    }

    async fn sign_in(app: &mut App) {
        app.run(Command::Login {
            username: "alice".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_tasks_require_sign_in() {
        let (base, _backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;

        assert_eq!(app.guard(), GuardState::Unauthenticated);
        let err = app.run(list_all()).await.unwrap_err();

        assert!(err.to_string().starts_with("Not signed in"));
        assert_eq!(app.current_route(), Some(&Route::Login));
    }

    #[tokio::test]
    async fn test_login_persists_token_across_runs() {
        let (base, _backend) = start_backend().await;
        let dir = TempDir::new().unwrap();

        let mut first = app_with(base.clone(), &dir, false).await;
        sign_in(&mut first).await;
        assert_eq!(first.current_route(), Some(&Route::Tasks));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("token")).unwrap(),
            "tok"
        );

        let mut second = app_with(base, &dir, false).await;
        assert_eq!(second.guard(), GuardState::Authenticated);
        let out = second.run(Command::Whoami).await.unwrap();
        assert_eq!(out, "alice <a@x.com> (id 1)");
    }

    #[tokio::test]
    async fn test_list_filters_and_chrome() {
        let (base, _backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;
        sign_in(&mut app).await;

        let out = app
            .run(Command::Tasks(TaskCommand::List {
                search: "MILK".to_string(),
                priority: PriorityFilter::All,
                status: StatusFilter::Unset,
            }))
            .await
            .unwrap();

        assert!(out.starts_with("TaskMaster | Hello, alice"));
        assert!(out.contains("#1 Buy milk"));
        assert!(!out.contains("Write report"));
    }

    #[tokio::test]
    async fn test_create_and_status_change_notify() {
        let (base, backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, true).await;
        sign_in(&mut app).await;

        let out = app
            .run(Command::Tasks(TaskCommand::Create {
                title: "Call mom".to_string(),
                description: "Sunday".to_string(),
                priority: TaskPriority::Medium,
                status: None,
            }))
            .await
            .unwrap();
        let created: Task = serde_json::from_str(&out).unwrap();
        assert_eq!(created.id, 3);

        app.run(Command::Tasks(TaskCommand::Status {
            id: 3,
            status: TaskStatus::Completed,
        }))
        .await
        .unwrap();

        assert_eq!(
            app.take_notifications(),
            vec![
                "[ok] Task created successfully".to_string(),
                "[ok] Task updated successfully".to_string(),
            ]
        );
        assert_eq!(
            backend.tasks.lock().unwrap()[2].status,
            Some(TaskStatus::Completed)
        );
    }

    #[tokio::test]
    async fn test_show_missing_task_notifies() {
        let (base, _backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;
        sign_in(&mut app).await;

        let out = app
            .run(Command::Tasks(TaskCommand::Show { id: 2 }))
            .await
            .unwrap();
        assert!(out.starts_with("#2 Write report"));

        let err = app
            .run(Command::Tasks(TaskCommand::Show { id: 999 }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch task. Please try again.");
        assert_eq!(
            format!("{:#}", err),
            "Failed to fetch task. Please try again.: Failed to fetch task"
        );
        assert_eq!(
            app.take_notifications(),
            vec!["[error] Failed to fetch task".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_server() {
        let (base, backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;
        sign_in(&mut app).await;

        let err = app
            .run(Command::Tasks(TaskCommand::Create {
                title: String::new(),
                description: "no title".to_string(),
                priority: TaskPriority::Low,
                status: None,
            }))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("title"));
        assert_eq!(backend.tasks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_revoked_token_forces_login() {
        let (base, backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;
        sign_in(&mut app).await;

        *backend.token.lock().unwrap() = "rotated".to_string();
        let err = app.run(list_all()).await.unwrap_err();

        assert_eq!(err.to_string(), "Session expired, please sign in again");
        assert_eq!(app.guard(), GuardState::Unauthenticated);
        assert_eq!(app.current_route(), Some(&Route::Login));
        assert!(!dir.path().join("token").exists());
    }

    #[tokio::test]
    async fn test_open_unknown_route() {
        let (base, _backend) = start_backend().await;
        let dir = TempDir::new().unwrap();
        let mut app = app_with(base, &dir, false).await;

        let out = app
            .run(Command::Open {
                path: "/settings".to_string(),
            })
            .await
            .unwrap();

        assert!(out.starts_with("TaskMaster\n\n404"));
        assert!(out.contains("Page not found"));
    }
}
