//! Short-lived messages shown over the current screen.

use std::time::{Duration, Instant};

pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    expires_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Visible toasts, oldest first
#[derive(Debug, Clone)]
pub struct Notifications {
    toasts: Vec<Toast>,
    duration: Duration,
}

impl Notifications {
    pub fn new(duration: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            duration,
        }
    }

    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) {
        self.toasts.push(Toast {
            kind,
            message: message.into(),
            expires_at: now + self.duration,
        });
    }

    /// Drop expired toasts; true if anything was removed
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| !t.is_expired(now));
        self.toasts.len() != before
    }

    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(TOAST_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_duration() {
        let mut n = Notifications::default();
        let t0 = Instant::now();
        n.push(ToastKind::Error, "Failed to save result", t0);
        n.push(ToastKind::Info, "later", t0 + Duration::from_secs(1));

        assert!(!n.prune(t0 + Duration::from_millis(2999)));
        assert_eq!(n.visible().len(), 2);

        assert!(n.prune(t0 + Duration::from_secs(3)));
        assert_eq!(n.visible().len(), 1);
        assert_eq!(n.visible()[0].message, "later");

        n.prune(t0 + Duration::from_secs(4));
        assert!(n.is_empty());
    }
}
