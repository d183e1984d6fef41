//! Authentication endpoints

use async_trait::async_trait;
use tracing::{debug, error};

use tm_core::session::{AuthApi, AuthResponse, LoginCredentials, RegisterCredentials, User};
use tm_core::{Error, Result};

use crate::api::ApiClient;
use crate::error::ApiError;

const LOGIN_PATH: &str = "/api-token-auth/";
const REGISTER_PATH: &str = "/api/auth/register/";
const USER_PATH: &str = "/api/auth/user/";

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const REGISTRATION_FAILED: &str = "Something went wrong. Please try again.";

/// [`AuthApi`] over HTTP
#[derive(Clone)]
pub struct HttpAuthApi {
    api: ApiClient,
}

impl HttpAuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        debug!("Logging in as {}", credentials.username);
        self.api
            .post(LOGIN_PATH, credentials)
            .await
            .map_err(|e| match e {
                ApiError::Http(e) => {
                    error!("Login request failed: {}", e);
                    Error::auth(e.to_string())
                }
                other => Error::auth(
                    other
                        .server_message()
                        .unwrap_or_else(|| INVALID_CREDENTIALS.to_string()),
                ),
            })
    }

    async fn register(&self, credentials: &RegisterCredentials) -> Result<()> {
        self.api
            .post_unit(REGISTER_PATH, credentials)
            .await
            .map_err(|e| {
                error!("Registration failed: {}", e);
                match e.field_errors() {
                    Some(fields) if !fields.is_empty() => Error::Validation(fields),
                    _ => Error::RegistrationFailed {
                        message: REGISTRATION_FAILED.to_string(),
                    },
                }
            })
    }

    async fn current_user(&self) -> Result<User> {
        self.api.get(USER_PATH).await.map_err(|e| match e {
            ApiError::Unauthorized => Error::SessionExpired,
            other => Error::auth(other.to_string()),
        })
    }
}
