//! Expiring status-line feedback shown at the bottom of every frame.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    /// Errors linger long enough to be read; the rest fade quickly.
    fn ttl(self) -> Duration {
        match self {
            StatusLevel::Error => Duration::from_secs(6),
            _ => Duration::from_secs(3),
        }
    }
}

/// At most one message at a time; a new one replaces the old.
pub struct StatusLine {
    message: Option<(String, StatusLevel, Instant)>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self { message: None }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.set(message, StatusLevel::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.set(message, StatusLevel::Success);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.set(message, StatusLevel::Error);
    }

    fn set(&mut self, message: impl Into<String>, level: StatusLevel) {
        self.message = Some((message.into(), level, Instant::now()));
    }

    /// Drop the message once its time is up; called every loop tick.
    pub fn clear_expired(&mut self) {
        if let Some((_, level, at)) = &self.message {
            if at.elapsed() >= level.ttl() {
                self.message = None;
            }
        }
    }

    pub fn current(&self) -> Option<(&str, StatusLevel)> {
        self.message
            .as_ref()
            .map(|(msg, level, _)| (msg.as_str(), *level))
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new()
    }
}
