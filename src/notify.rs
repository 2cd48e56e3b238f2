use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Sink for transient user-facing notifications.
pub trait Notifier {
    fn notify(&mut self, level: Level, message: String);
}

/// Notices shown in the status line until they expire. Everything pushed here
/// is also logged.
#[derive(Debug)]
pub struct ToastQueue {
    duration: Duration,
    entries: VecDeque<(Notice, Instant)>,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        ToastQueue {
            duration,
            entries: VecDeque::new(),
        }
    }

    /// Drop expired notices.
    pub fn prune(&mut self, now: Instant) {
        while let Some((_, shown_at)) = self.entries.front() {
            if now.duration_since(*shown_at) >= self.duration {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.entries.back().map(|(notice, _)| notice)
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.entries.drain(..).map(|(notice, _)| notice).collect()
    }
}

impl Notifier for ToastQueue {
    fn notify(&mut self, level: Level, message: String) {
        match level {
            Level::Error => error!(notice = %message),
            Level::Warning => warn!(notice = %message),
            Level::Info | Level::Success => info!(notice = %message),
        }
        self.entries.push_back((Notice { level, message }, Instant::now()));
    }
}
