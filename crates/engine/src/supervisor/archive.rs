use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use stepwire_types::StepId;

use crate::supervisor::StepRecord;

/// Bounded history of finished steps, oldest evicted first.
#[derive(Debug)]
pub(crate) struct RunArchive {
    records: Mutex<VecDeque<StepRecord>>,
    capacity: usize,
}

impl RunArchive {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StepRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `record` and returns the ids of steps that no longer have any archived record.
    pub(crate) fn push(&self, record: StepRecord) -> Vec<StepId> {
        let mut records = self.lock();
        let mut evicted = Vec::new();
        while records.len() >= self.capacity.max(1) {
            if let Some(oldest) = records.pop_front() {
                evicted.push(oldest.step_id);
            }
        }
        records.push_back(record);
        evicted.retain(|step_id| !records.iter().any(|record| &record.step_id == step_id));
        evicted.dedup();
        evicted
    }

    pub(crate) fn records(&self) -> Vec<StepRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Most recent record for `step_id`.
    pub(crate) fn latest(&self, step_id: &StepId) -> Option<StepRecord> {
        self.lock().iter().rev().find(|record| &record.step_id == step_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stepwire_types::{StepPhase, ValueMap};

    use super::*;

    fn record(step: &str, phase: StepPhase) -> StepRecord {
        StepRecord {
            step_id: StepId::from(step),
            phase,
            inputs: ValueMap::new(),
            state: ValueMap::new(),
            outputs: ValueMap::new(),
            failure: None,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let archive = RunArchive::new(2);
        assert!(archive.push(record("a", StepPhase::Committed)).is_empty());
        assert!(archive.push(record("b", StepPhase::Committed)).is_empty());
        assert_eq!(archive.push(record("c", StepPhase::Failed)), vec![StepId::from("a")]);

        let ids: Vec<_> = archive.records().into_iter().map(|record| record.step_id.to_string()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(archive.latest(&StepId::from("a")).is_none());
    }

    #[test]
    fn latest_prefers_newest_attempt() {
        let archive = RunArchive::new(4);
        archive.push(record("a", StepPhase::Failed));
        archive.push(record("a", StepPhase::Committed));
        assert!(archive.latest(&StepId::from("a")).unwrap().is_committed());
    }

    #[test]
    fn eviction_reports_only_steps_without_a_remaining_record() {
        let archive = RunArchive::new(2);
        archive.push(record("a", StepPhase::Failed));
        archive.push(record("a", StepPhase::Committed));
        assert!(archive.push(record("b", StepPhase::Committed)).is_empty());
        assert_eq!(archive.push(record("c", StepPhase::Committed)), vec![StepId::from("a")]);
    }
}
