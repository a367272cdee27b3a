//! User-facing notification channel.
//!
//! Reconciliation and export report through short-lived, auto-dismissing
//! notices. The embedding decides how they surface; the CLI prints them to
//! stderr, tests capture them in memory.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Default lifetime of an auto-dismissing notice.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub error: bool,
    pub timeout: Duration,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Delivery channel for notices.
pub trait NotificationSink {
    fn notify(&self, notice: Notice);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Prints notices to stderr, keeping stdout free for data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if notice.error {
            eprintln!("error: {}", notice.message);
        } else {
            eprintln!("{}", notice.message);
        }
    }
}

/// Records notices for later inspection.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|n| n.message.clone()).collect()
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_notifier_records_in_order() {
        let notifier = MemoryNotifier::new();
        notifier.notify(Notice::info("first"));
        notifier.notify(Notice::error("second"));

        let notices = notifier.take();
        assert_eq!(notices.len(), 2);
        assert!(!notices[0].error);
        assert!(notices[1].error);
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn timeout_can_be_adjusted() {
        let notice = Notice::info("hello").with_timeout(Duration::from_secs(9));
        assert_eq!(notice.timeout, Duration::from_secs(9));
        assert_eq!(Notice::info("hello").timeout, DEFAULT_TIMEOUT);
    }
}
