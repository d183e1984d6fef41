//! Test stand-ins: a throwaway backend and recording credentials

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use tm_core::session::Credentials;

/// Serve `router` on an ephemeral localhost port and return its base URL
pub(crate) async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Credentials that hold a token and count invalidations
#[derive(Default)]
pub(crate) struct RecordingCredentials {
    token: Mutex<Option<String>>,
    invalidations: AtomicUsize,
}

impl RecordingCredentials {
    pub(crate) fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
            invalidations: AtomicUsize::new(0),
        })
    }

    pub(crate) fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Credentials for RecordingCredentials {
    async fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().take();
    }
}
