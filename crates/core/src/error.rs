//! Error types for the core library

use thiserror::Error;

use crate::task::TaskId;
use crate::validation::FieldErrors;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Credentials were rejected
    #[error("{message}")]
    Auth { message: String },

    /// The server rejected the presented token; the session has been torn down
    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Registration failed: {message}")]
    RegistrationFailed { message: String },

    #[error("{}", fetch_message(.task_id))]
    FetchFailed {
        task_id: Option<TaskId>,
        reason: String,
    },

    #[error("Failed to create task")]
    CreateFailed { reason: String },

    #[error("Failed to update task")]
    UpdateFailed { task_id: TaskId, reason: String },

    #[error("Failed to delete task")]
    DeleteFailed { task_id: TaskId, reason: String },

    #[error("Token store error: {0}")]
    TokenStore(String),
}

fn fetch_message(task_id: &Option<TaskId>) -> &'static str {
    match task_id {
        Some(_) => "Failed to fetch task",
        None => "Failed to fetch tasks",
    }
}

impl Error {
    /// Create an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a FetchFailed error for the whole collection or a single task
    pub fn fetch_failed(task_id: Option<TaskId>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            task_id,
            reason: reason.into(),
        }
    }

    /// Create a CreateFailed error
    pub fn create_failed(reason: impl Into<String>) -> Self {
        Self::CreateFailed {
            reason: reason.into(),
        }
    }

    /// Create an UpdateFailed error
    pub fn update_failed(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self::UpdateFailed {
            task_id,
            reason: reason.into(),
        }
    }

    /// Create a DeleteFailed error
    pub fn delete_failed(task_id: TaskId, reason: impl Into<String>) -> Self {
        Self::DeleteFailed {
            task_id,
            reason: reason.into(),
        }
    }

    /// Create a single-field Validation error
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
