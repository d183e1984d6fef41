//! Error types for the HTTP transport

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use tm_core::validation::{FieldErrors, NON_FIELD_ERRORS};

/// Result type alias for raw API calls
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure of a single request, before it is labelled for the caller
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or body decoding failure
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 401; the session has already been invalidated
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-2xx answer
    #[error("Server returned {status}")]
    Status {
        status: StatusCode,
        body: Option<Value>,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
        }
    }

    /// Field-keyed errors from the response body, if it carried any
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::Status {
                body: Some(body), ..
            } => FieldErrors::from_json(body),
            _ => None,
        }
    }

    /// First entry of `non_field_errors`, or a `detail` message
    pub fn server_message(&self) -> Option<String> {
        let fields = self.field_errors()?;
        fields
            .first(NON_FIELD_ERRORS)
            .or_else(|| fields.first("detail"))
            .map(str::to_string)
    }
}
