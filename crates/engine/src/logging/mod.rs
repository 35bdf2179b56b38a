//! Forwarding of script-originated log calls.
//!
//! Scripts log through a [`Console`](crate::script::Console), which wraps each call in a
//! [`ScriptLogEntry`] and hands it to a [`LogSink`]. Sinks never interpret the message text.

mod ring_buffer;

pub use ring_buffer::LogRingBuffer;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stepwire_types::{LogLevel, ScriptLogEntry, StepId};

/// Receives script log entries.
pub trait LogSink: Send + Sync + std::fmt::Debug {
    fn record(&self, entry: ScriptLogEntry);
}

/// Re-emits script logs as `tracing` events under the `stepwire::script` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, entry: ScriptLogEntry) {
        let step_id = entry.step_id.as_str();
        let message = entry.message.as_str();
        match entry.level {
            LogLevel::Debug => tracing::debug!(target: "stepwire::script", step_id, "{message}"),
            LogLevel::Info => tracing::info!(target: "stepwire::script", step_id, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "stepwire::script", step_id, "{message}"),
            LogLevel::Error => tracing::error!(target: "stepwire::script", step_id, "{message}"),
        }
    }
}

/// Keeps a bounded ring buffer of script logs per step.
#[derive(Debug)]
pub struct BufferedLogSink {
    buffers: Mutex<HashMap<StepId, LogRingBuffer>>,
    max_entries_per_step: usize,
}

impl BufferedLogSink {
    pub fn new(max_entries_per_step: usize) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            max_entries_per_step,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StepId, LogRingBuffer>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All buffered entries for `step_id`, oldest first.
    pub fn logs(&self, step_id: &StepId) -> Vec<ScriptLogEntry> {
        self.lock().get(step_id).map_or_else(Vec::new, LogRingBuffer::all)
    }

    /// Up to `count` newest entries for `step_id`.
    pub fn recent_logs(&self, step_id: &StepId, count: usize) -> Vec<ScriptLogEntry> {
        self.lock()
            .get(step_id)
            .map_or_else(Vec::new, |buffer| buffer.recent(count))
    }

    /// Drops the buffer for `step_id` along with its entries.
    pub fn clear_logs(&self, step_id: &StepId) {
        self.lock().remove(step_id);
    }
}

impl LogSink for BufferedLogSink {
    fn record(&self, entry: ScriptLogEntry) {
        let mut buffers = self.lock();
        buffers
            .entry(entry.step_id.clone())
            .or_insert_with(|| LogRingBuffer::new(self.max_entries_per_step))
            .push(entry);
    }
}

/// Sends every entry to each inner sink in order.
#[derive(Debug, Default)]
pub struct FanoutLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutLogSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for FanoutLogSink {
    fn record(&self, entry: ScriptLogEntry) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.record(entry.clone());
            }
            last.record(entry);
        }
    }
}
