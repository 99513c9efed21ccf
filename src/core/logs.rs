/// Operator-facing status log
///
/// This module provides the log entry types shown on the page view. It
/// records acquisition and dispatch events as they happen; page-specific
/// formatting is handled by the server frontend.
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A log entry with timestamp and message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub level: LogLevel,
    pub metadata: Option<LogMetadata>,
}

/// Log entry severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Additional metadata for structured entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogMetadata {
    /// One acquisition attempt (raw line echo or per-attempt failure)
    Acquisition { attempt: u32 },
    /// One dispatch to the IoT endpoint
    Dispatch {
        endpoint: String,
        status: Option<u16>,
    },
}

impl LogEntry {
    /// Create a new log entry with the current timestamp
    pub fn new(message: String, level: LogLevel) -> Self {
        Self {
            timestamp: Local::now(),
            message,
            level,
            metadata: None,
        }
    }

    /// Create a new log entry with metadata
    pub fn with_metadata(message: String, level: LogLevel, metadata: LogMetadata) -> Self {
        Self {
            timestamp: Local::now(),
            message,
            level,
            metadata: Some(metadata),
        }
    }

    /// Create an info-level log entry
    pub fn info(message: String) -> Self {
        Self::new(message, LogLevel::Info)
    }

    /// Create a warning-level log entry
    pub fn warning(message: String) -> Self {
        Self::new(message, LogLevel::Warning)
    }

    /// Create an error-level log entry
    pub fn error(message: String) -> Self {
        Self::new(message, LogLevel::Error)
    }
}

/// A simple log buffer that stores recent log entries
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    max_entries: usize,
}

impl LogBuffer {
    /// Create a new log buffer with a maximum number of entries
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Add a log entry to the buffer
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);

        // Trim oldest entries if we exceed the max
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }

    /// Get all log entries
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Get the number of log entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all log entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Shared handle to the status log, cloned into the poller and the page
/// server. Entries are mirrored to the process log at the matching level.
#[derive(Clone)]
pub struct StatusLog {
    buffer: Arc<Mutex<LogBuffer>>,
}

impl StatusLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(LogBuffer::new(max_entries))),
        }
    }

    /// Record an entry, mirroring it to the process log
    pub fn push(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => log::info!("{}", entry.message),
            LogLevel::Warning => log::warn!("{}", entry.message),
            LogLevel::Error => log::error!("{}", entry.message),
        }
        self.buffer.lock().unwrap().push(entry);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogEntry::info(message.into()));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(LogEntry::warning(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogEntry::error(message.into()));
    }

    /// Snapshot of the current entries, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.lock().unwrap().entries().to_vec()
    }
}

impl Default for StatusLog {
    fn default() -> Self {
        Self::new(1000)
    }
}
