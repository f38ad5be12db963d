//! One-shot user-visible notifications.

use std::fmt;
use std::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Success => write!(f, "success"),
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }
}

/// Presentation surface for notifications (toasts, console lines)
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that logs every notification and keeps it until drained
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success | Level::Info => info!(message = %notification.message, "notify"),
            Level::Warning => warn!(message = %notification.message, "notify"),
            Level::Error => error!(message = %notification.message, "notify"),
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}
