//! User-visible notices: the confirmations and errors a front end shows.

use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

/// Confirmation shown after a successful create.
pub const CREATED: &str = "Laundry entry created successfully!";
/// Confirmation shown after a successful complete.
pub const COMPLETED: &str = "Laundry marked as completed! Email sent to student.";
/// Confirmation shown after a successful pickup.
pub const PICKED_UP: &str = "Marked as picked up!";

/// Shown when a create fails without a backend detail.
pub const CREATE_FAILED: &str = "Failed to create entry";
/// Shown when a complete fails without a backend detail.
pub const COMPLETE_FAILED: &str = "Failed to mark as completed";
/// Shown when a pickup fails without a backend detail.
pub const PICKUP_FAILED: &str = "Failed to mark as picked up";
/// Shown when a fetch fails without a backend detail.
pub const FETCH_FAILED: &str = "Failed to fetch laundry entries";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, NoticeLevel::Error)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for notices; the front end decides how to present them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(message = %notice.message, "Notice"),
            NoticeLevel::Error => error!(message = %notice.message, "Notice"),
        }
    }
}

/// Collects notices in memory. Used by the terminal front end to print
/// them after a command, and by tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of the most recent notice.
    #[must_use]
    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
