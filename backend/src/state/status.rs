//! Single-slot status surface with automatic expiry.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::Severity;

/// A message shown in the status region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
    pub severity: Severity,
}

/// Holds at most one status message, cleared once `ttl` has elapsed.
///
/// Showing a new message replaces the old one and restarts the clock.
#[derive(Debug)]
pub struct StatusBoard {
    ttl: Duration,
    slot: Mutex<Option<(StatusMessage, Instant)>>,
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn show(&self, message: impl Into<String>, severity: Severity) {
        self.show_at(message, severity, Instant::now());
    }

    pub fn show_at(&self, message: impl Into<String>, severity: Severity, now: Instant) {
        let entry = StatusMessage {
            message: message.into(),
            severity,
        };
        *self.lock() = Some((entry, now));
    }

    /// The visible message, if any.
    pub fn current(&self) -> Option<StatusMessage> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<StatusMessage> {
        let mut slot = self.lock();
        let expired = matches!(
            slot.as_ref(),
            Some((_, shown)) if now.saturating_duration_since(*shown) >= self.ttl
        );
        if expired {
            *slot = None;
        }
        slot.as_ref().map(|(entry, _)| entry.clone())
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(StatusMessage, Instant)>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
