//! Transient user-visible notifications
//!
//! The front end subscribes and shows each message once; nothing is kept
//! after delivery.

use serde::Serialize;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Fan-out of notifications to any number of subscribers
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        // No subscribers is fine
        let _ = self.tx.send(Notification { level, message });
    }
}
