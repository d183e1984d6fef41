//! Shared session handle
//!
//! One handle is created at startup and passed to everything that needs the
//! identity or the token: the session store, the transport (through the
//! [`Credentials`] seam) and the application, which subscribes to
//! [`SessionEvent`]s to drive navigation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use super::model::User;
use super::token_store::TokenStore;
use crate::Result;

const EVENT_CAPACITY: usize = 16;

/// Lifecycle changes of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
    /// The server rejected the token of an authenticated session
    Expired,
}

/// What a transport needs from the session: the token to present, and a
/// way to report that the server rejected it.
#[async_trait]
pub trait Credentials: Send + Sync {
    /// Token for the `Authorization` header, if one is persisted
    async fn token(&self) -> Option<String>;

    /// Called on every authorization failure. Must be idempotent.
    async fn invalidate(&self);
}

struct SessionInner {
    tokens: Box<dyn TokenStore>,
    /// Guards the user and serialises every token write with it
    user: Mutex<Option<User>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Cloneable handle to the current session
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    pub fn new(tokens: impl TokenStore + 'static) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                tokens: Box::new(tokens),
                user: Mutex::new(None),
                events,
            }),
        }
    }

    /// Subscribe to session lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub async fn user(&self) -> Option<User> {
        self.inner.user.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.user.lock().await.is_some()
    }

    /// Persisted token; read errors are logged and treated as no token
    pub fn stored_token(&self) -> Option<String> {
        match self.inner.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read session token: {}", e);
                None
            }
        }
    }

    /// Persist the token and set the user after a successful login
    pub(crate) async fn establish(&self, user: User, token: &str) -> Result<()> {
        let mut current = self.inner.user.lock().await;
        self.inner.tokens.save(token)?;
        *current = Some(user.clone());
        info!("Signed in as {}", user.username);
        self.emit(SessionEvent::SignedIn(user));
        Ok(())
    }

    /// Set the user resolved from a persisted token at startup
    pub(crate) async fn restore(&self, user: User) {
        let mut current = self.inner.user.lock().await;
        *current = Some(user.clone());
        info!("Restored session for {}", user.username);
        self.emit(SessionEvent::SignedIn(user));
    }

    /// Drop a persisted token without touching the user or emitting anything
    pub(crate) async fn discard_token(&self) {
        let _current = self.inner.user.lock().await;
        self.clear_token();
    }

    /// Explicit logout: clears everything unconditionally, never fails
    pub async fn sign_out(&self) {
        let mut current = self.inner.user.lock().await;
        self.clear_token();
        *current = None;
        info!("Signed out");
        self.emit(SessionEvent::SignedOut);
    }

    /// Tear the session down after an authorization failure.
    ///
    /// Clears the token and the user under one lock, so concurrent failures
    /// tear down exactly once. Returns `false` when there was nothing left
    /// to clear. `Expired` is emitted only when a signed-in user was dropped.
    pub async fn teardown(&self) -> bool {
        let mut current = self.inner.user.lock().await;
        let had_token = self.stored_token().is_some();
        let dropped_user = current.take();
        if !had_token && dropped_user.is_none() {
            return false;
        }

        self.clear_token();
        if let Some(user) = dropped_user {
            warn!("Session for {} expired", user.username);
            self.emit(SessionEvent::Expired);
        }
        true
    }

    fn clear_token(&self) {
        if let Err(e) = self.inner.tokens.clear() {
            warn!("Could not clear session token: {}", e);
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.events.send(event);
    }
}

#[async_trait]
impl Credentials for SessionHandle {
    async fn token(&self) -> Option<String> {
        self.stored_token()
    }

    async fn invalidate(&self) {
        self.teardown().await;
    }
}
