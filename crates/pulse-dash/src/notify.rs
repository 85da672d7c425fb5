//! Single-slot transient notifications with a cancellable expiry timer.
//!
//! At most one notice is live. A new `notify` replaces the current notice
//! and restarts the countdown; the replaced notice's timer is aborted
//! exactly once and an epoch check keeps a timer that lost the abort race
//! from clearing its successor. Dropping the scheduler aborts the pending
//! timer so a torn-down view cannot resurrect a dismissed notice.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// How long a notice stays up.
pub const NOTICE_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Default)]
struct Slot {
    epoch: u64,
    current: Option<Notice>,
    timer: Option<JoinHandle<()>>,
}

pub struct NotificationScheduler {
    slot: Arc<Mutex<Slot>>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Show a notice, replacing any live one and restarting the countdown.
    /// Must be called from within a tokio runtime.
    pub fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        let mut s = self.lock();
        s.epoch += 1;
        let epoch = s.epoch;
        if let Some(timer) = s.timer.take() {
            timer.abort();
        }
        s.current = Some(Notice {
            kind,
            message: message.into(),
        });

        let slot = Arc::clone(&self.slot);
        s.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(NOTICE_TTL).await;
            let mut s = slot.lock().unwrap_or_else(|e| e.into_inner());
            // A replacement or dismissal moved the epoch on; this timer's
            // notice is gone and it must not touch the slot.
            if s.epoch == epoch {
                debug!("notice expired");
                s.current = None;
                s.timer = None;
            }
        }));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NoticeKind::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NoticeKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NoticeKind::Error, message);
    }

    /// Clear immediately and cancel the pending timer.
    pub fn dismiss(&self) {
        let mut s = self.lock();
        s.epoch += 1;
        if let Some(timer) = s.timer.take() {
            timer.abort();
        }
        s.current = None;
    }

    pub fn current(&self) -> Option<Notice> {
        self.lock().current.clone()
    }
}

impl Default for NotificationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        let mut s = self.lock();
        if let Some(timer) = s.timer.take() {
            timer.abort();
        }
    }
}
