/// One-shot, dismissible user notifications.
///
/// The agent runtime pane raises a notification when a run enters the
/// `Error` state or a transcript fails to load. The rendering layer drains
/// or dismisses them.
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Severity levels for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational messages
    Info,
    /// Warning messages
    Warning,
    /// Error messages
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single user-visible notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }
}

/// Sink for user notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// In-memory notification queue
#[derive(Debug, Default)]
pub struct NotificationCenter {
    pending: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications not yet dismissed, oldest first
    pub fn pending(&self) -> Vec<Notification> {
        self.pending.lock().clone()
    }

    /// Dismiss a notification. Returns false if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut pending = self.pending.lock();
        let before = pending.len();
        pending.retain(|n| n.id != id);
        pending.len() != before
    }

    /// Drain all pending notifications
    pub fn take_all(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        self.pending.lock().push(notification);
    }
}
