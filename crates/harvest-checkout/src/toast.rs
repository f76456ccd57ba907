//! Toast Notifications
//!
//! Transient one-line notices. Only one toast is visible at a time: a new
//! toast replaces the previous one, and each disappears after five seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// How long a toast stays visible
pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// Toast severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        f.write_str(label)
    }
}

/// A single notification
#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    shown_at: Instant,
}

impl Toast {
    /// Whether the toast is still on screen at `now`
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < TOAST_TTL
    }
}

/// Holder for the current toast
#[derive(Debug, Default)]
pub struct ToastCenter {
    current: Option<Toast>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast, replacing whatever was visible
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        tracing::debug!(?severity, %message, "Toast");
        self.current = Some(Toast {
            message,
            severity,
            shown_at: Instant::now(),
        });
    }

    /// The visible toast, if it has not timed out
    pub fn visible(&self) -> Option<&Toast> {
        let now = Instant::now();
        self.current.as_ref().filter(|toast| toast.is_visible_at(now))
    }

    /// The most recent toast, visible or not
    pub fn last(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
