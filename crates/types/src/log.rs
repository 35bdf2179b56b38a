//! Script-originated log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::StepId;

/// Severity a script attached to a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// One log/print call made by script code. The message is kept exactly as the script wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLogEntry {
    /// Timestamp of the call.
    pub timestamp: DateTime<Utc>,
    /// Step whose script produced the entry.
    pub step_id: StepId,
    /// Severity chosen by the script.
    pub level: LogLevel,
    /// Verbatim message text.
    pub message: String,
}

impl ScriptLogEntry {
    pub fn new(step_id: StepId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            step_id,
            level,
            message: message.into(),
        }
    }
}
