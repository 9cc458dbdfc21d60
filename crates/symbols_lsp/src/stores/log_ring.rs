//! Log ring (C2)
//!
//! A bounded, FIFO-evicted sequence of server-originated `window/logMessage`
//! / `window/showMessage` notifications, read back by the `logs` tool.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Severity as carried by `window/logMessage`'s `type` field (1=Error,
/// 2=Warning, 3=Info, 4=Log).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Log,
}

impl From<lsp_types::MessageType> for LogLevel {
    fn from(value: lsp_types::MessageType) -> Self {
        match value {
            lsp_types::MessageType::ERROR => LogLevel::Error,
            lsp_types::MessageType::WARNING => LogLevel::Warning,
            lsp_types::MessageType::INFO => LogLevel::Info,
            _ => LogLevel::Log,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Capacity-bounded FIFO log buffer. Default capacity mirrors the
/// ambient minimum of 1000 entries called for in the data model.
pub struct LogRing {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "log ring capacity must be at least 1");
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn append(&self, level: LogLevel, message: impl Into<String>, timestamp: DateTime<Utc>) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            level,
            message: message.into(),
            timestamp,
        });
        symbols_core::telemetry::metrics::LOG_RING_OCCUPANCY.set(entries.len() as u64);
    }

    /// A chronological copy of the current contents.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(1000)
    }
}
