//! Transient, auto-expiring notification messages.
//!
//! Toasts carry no pipeline semantics; their lifecycle is independent of
//! the items that produced them. Expiry is evaluated lazily on read, so no
//! background timer is needed.

use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::utils::generate_uuid;

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(4);

/// Kind of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// A terminal success transition.
    Success,
    /// A terminal failure transition.
    Error,
}

/// One transient notification.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Unique id, usable for explicit dismissal.
    pub id: Uuid,
    /// Human-readable message.
    pub message: String,
    /// Notification kind.
    pub kind: ToastKind,
    expires_at: Instant,
}

impl Toast {
    /// Returns true if the toast has outlived its TTL.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Holder of active toasts, pruned on read.
#[derive(Debug)]
pub struct ToastHub {
    ttl: Duration,
    toasts: RwLock<Vec<Toast>>,
}

impl Default for ToastHub {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastHub {
    /// Creates a hub with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: RwLock::new(Vec::new()),
        }
    }

    /// Pushes a new toast and returns its id.
    pub fn push(&self, message: impl Into<String>, kind: ToastKind) -> Uuid {
        let toast = Toast {
            id: generate_uuid(),
            message: message.into(),
            kind,
            expires_at: Instant::now() + self.ttl,
        };
        let id = toast.id;
        self.toasts.write().push(toast);
        id
    }

    /// Returns all unexpired toasts, pruning expired ones.
    #[must_use]
    pub fn active(&self) -> Vec<Toast> {
        let mut toasts = self.toasts.write();
        toasts.retain(|t| !t.is_expired());
        toasts.clone()
    }

    /// Dismisses a toast by id before its TTL elapses.
    pub fn dismiss(&self, id: Uuid) {
        self.toasts.write().retain(|t| t.id != id);
    }

    /// Removes every toast.
    pub fn clear(&self) {
        self.toasts.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_ttl() {
        let hub = ToastHub::default();
        hub.push("slide 1 ready", ToastKind::Success);
        assert_eq!(hub.active().len(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(hub.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_toast_survives_within_ttl() {
        let hub = ToastHub::default();
        hub.push("slide 2 failed", ToastKind::Error);

        tokio::time::advance(Duration::from_secs(3)).await;
        let active = hub.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn test_dismiss() {
        let hub = ToastHub::default();
        let id = hub.push("dismiss me", ToastKind::Success);
        hub.push("keep me", ToastKind::Success);

        hub.dismiss(id);

        let active = hub.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "keep me");
    }
}
