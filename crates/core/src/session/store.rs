//! Session store: login, registration, logout and startup restore

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::handle::SessionHandle;
use super::model::{AuthResponse, LoginCredentials, RegisterCredentials, User};
use crate::validation::{validate_login, validate_registration};
use crate::Result;

/// Authentication endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api-token-auth/`. Rejections map to `Error::Auth`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse>;

    /// `POST /api/auth/register/`. Field rejections map to `Error::Validation`.
    async fn register(&self, credentials: &RegisterCredentials) -> Result<()>;

    /// `GET /api/auth/user/` with the persisted token
    async fn current_user(&self) -> Result<User>;
}

/// Owns the session lifecycle on top of a [`SessionHandle`]
pub struct SessionStore {
    session: SessionHandle,
    auth: Arc<dyn AuthApi>,
}

impl SessionStore {
    pub fn new(session: SessionHandle, auth: Arc<dyn AuthApi>) -> Self {
        Self { session, auth }
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.session
    }

    /// Currently signed-in user
    pub async fn current_user(&self) -> Option<User> {
        self.session.user().await
    }

    /// Resolve the persisted token to a user. Runs once at startup.
    ///
    /// Any failure clears the token and resolves to no session; nothing is
    /// propagated.
    pub async fn restore(&self) -> Option<User> {
        self.session.stored_token()?;

        match self.auth.current_user().await {
            Ok(user) => {
                self.session.restore(user.clone()).await;
                Some(user)
            }
            Err(e) => {
                debug!("Stored token rejected, dropping it: {}", e);
                self.session.discard_token().await;
                None
            }
        }
    }

    /// Validate, authenticate, persist the token and set the session
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User> {
        validate_login(credentials)?;
        let (user, token) = self.auth.login(credentials).await?.into_parts();
        self.session.establish(user.clone(), &token).await?;
        Ok(user)
    }

    /// Validate and register. The session is left untouched; the caller
    /// navigates to login afterwards.
    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<()> {
        validate_registration(credentials)?;
        self.auth.register(credentials).await?;
        info!("Registered {}", credentials.username);
        Ok(())
    }

    /// Clear token and session. Never fails.
    pub async fn logout(&self) {
        self.session.sign_out().await;
    }
}
