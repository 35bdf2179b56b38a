//! Run-scoped logical clock shared by every store and the propagation table.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use stepwire_types::LogicalTime;

/// Monotonic counter handing out logical write times. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct LogicalClock {
    counter: Arc<AtomicU64>,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock and returns the new time. The first tick is `1`.
    pub fn tick(&self) -> LogicalTime {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last time handed out, `0` before the first tick.
    pub fn now(&self) -> LogicalTime {
        self.counter.load(Ordering::SeqCst)
    }
}
