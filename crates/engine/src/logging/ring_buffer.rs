//! Bounded buffer of script log entries.

use std::collections::VecDeque;

use stepwire_types::ScriptLogEntry;

/// Keeps the newest `max_size` entries, evicting the oldest first.
#[derive(Debug)]
pub struct LogRingBuffer {
    buffer: VecDeque<ScriptLogEntry>,
    max_size: usize,
}

impl LogRingBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    pub fn push(&mut self, entry: ScriptLogEntry) {
        if self.max_size == 0 {
            return;
        }
        if self.buffer.len() >= self.max_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(entry);
    }

    /// Up to `count` of the newest entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<ScriptLogEntry> {
        let start = self.buffer.len().saturating_sub(count);
        self.buffer.iter().skip(start).cloned().collect()
    }

    pub fn all(&self) -> Vec<ScriptLogEntry> {
        self.buffer.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
