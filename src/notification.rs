use chrono::{DateTime, Utc};
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Oldest entries are dropped past this, expired or not.
const MAX_NOTIFICATIONS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for human-readable status messages. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

struct NotificationStore {
    entries: Mutex<Vec<Notification>>,
    next_id: AtomicU64,
    ttl: Duration,
}

impl NotificationStore {
    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|n| n.id == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }
}

/// In-memory toast list. Each entry removes itself after the configured TTL
/// when shown from within a tokio runtime.
#[derive(Clone)]
pub struct NotificationCenter {
    store: Arc<NotificationStore>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(NotificationStore {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                ttl,
            }),
        }
    }

    /// Append a notification and return its id.
    ///
    /// Expiry needs a tokio runtime; outside one the entry stays until it is
    /// dismissed or pushed out by newer entries.
    pub fn show(&self, message: impl Into<String>, severity: Severity) -> u64 {
        let message = message.into();
        let id = self.store.next_id.fetch_add(1, Ordering::Relaxed);

        match severity {
            Severity::Error => error!("[{:?}] {}", severity, message),
            Severity::Warning => warn!("[{:?}] {}", severity, message),
            Severity::Info | Severity::Success => info!("[{:?}] {}", severity, message),
        }

        {
            let mut entries = self.store.entries.lock();
            entries.push(Notification {
                id,
                message,
                severity,
                created_at: Utc::now(),
            });
            if entries.len() > MAX_NOTIFICATIONS {
                let overflow = entries.len() - MAX_NOTIFICATIONS;
                entries.drain(..overflow);
            }
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let store = self.store.clone();
            handle.spawn(async move {
                tokio::time::sleep(store.ttl).await;
                store.remove(id);
            });
        }

        id
    }

    /// Remove a notification before it expires. Returns false if it is already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        self.store.remove(id)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.store.entries.lock().clone()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000))
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, message: &str, severity: Severity) {
        self.show(message, severity);
    }
}
