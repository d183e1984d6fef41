//! Session and credential types

use serde::{Deserialize, Serialize};

/// Server-assigned user identifier
pub type UserId = u64;

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Body of `POST /api-token-auth/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /api/auth/register/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterCredentials {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Password confirmation
    pub password2: String,
}

impl RegisterCredentials {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            password2: password2.into(),
        }
    }
}

/// Successful login response: the user plus an opaque bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
}

impl AuthResponse {
    /// Split into the session user and the token to persist
    pub fn into_parts(self) -> (User, String) {
        (
            User {
                id: self.id,
                username: self.username,
                email: self.email,
            },
            self.token,
        )
    }
}
