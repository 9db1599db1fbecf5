//! Notification delivery.
//!
//! Notifications are fire-and-forget: a notifier never reports failure back
//! to the store.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Emits notifications as structured log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Keeps every notification in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    delivered: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.delivered().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.delivered.lock() {
            guard.clear();
        }
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, title: &str, body: &str) {
        match self.delivered.lock() {
            Ok(mut guard) => guard.push(Notification {
                title: title.to_string(),
                body: body.to_string(),
            }),
            Err(_) => warn!(title, "notification dropped: recorder lock poisoned"),
        }
    }
}
