//! Capped, human-facing message log for a pipeline run.

use std::collections::VecDeque;

use crate::utils::clock_timestamp;

/// Maximum number of retained messages.
pub const MESSAGE_LOG_CAP: usize = 50;

/// One timestamped log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Wall-clock time of the message (`HH:MM:SS`).
    pub timestamp: String,
    /// Message text.
    pub text: String,
}

/// Rolling log of the most recent messages, oldest dropped first.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, dropping the oldest entry beyond the cap.
    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push_back(LogEntry {
            timestamp: clock_timestamp(),
            text: text.into(),
        });
        while self.entries.len() > MESSAGE_LOG_CAP {
            self.entries.pop_front();
        }
    }

    /// Returns the retained entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
