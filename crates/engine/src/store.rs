//! Per-step storage behind `set`, `set_output` and `state`.

use indexmap::IndexMap;
use stepwire_types::{CellKind, DataCell, StepId, Value, ValueMap};

use crate::clock::LogicalClock;
use crate::error::BridgeError;

/// Owns the invocation record of one step: resolved inputs, local state and pending outputs.
///
/// A name lives in at most one kind. Within a kind the last write wins and no history is kept.
#[derive(Debug)]
pub struct StepDataStore {
    step_id: StepId,
    inputs: IndexMap<String, DataCell>,
    state: IndexMap<String, DataCell>,
    outputs: IndexMap<String, DataCell>,
    clock: LogicalClock,
}

impl StepDataStore {
    /// Creates a store seeded with already-resolved `Input` cells.
    pub fn new(step_id: StepId, inputs: impl IntoIterator<Item = DataCell>, clock: LogicalClock) -> Self {
        let inputs = inputs
            .into_iter()
            .map(|cell| (cell.name().to_string(), cell))
            .collect();
        Self {
            step_id,
            inputs,
            state: IndexMap::new(),
            outputs: IndexMap::new(),
            clock,
        }
    }

    pub fn step_id(&self) -> &StepId {
        &self.step_id
    }

    /// Writes `value` under `name` as a cell of `kind`.
    ///
    /// Fails with `KindConflict` when the name already holds a cell of the other writable kind,
    /// and with `ReadOnlyInput` when asked to write an input.
    pub fn write(&mut self, name: &str, value: Value, kind: CellKind) -> Result<(), BridgeError> {
        let (target, other, other_kind) = match kind {
            CellKind::State => (&mut self.state, &self.outputs, CellKind::Output),
            CellKind::Output => (&mut self.outputs, &self.state, CellKind::State),
            CellKind::Input => return Err(BridgeError::read_only_input(&self.step_id, name)),
        };

        if other.contains_key(name) {
            return Err(BridgeError::kind_conflict(&self.step_id, name, other_kind, kind));
        }

        let written_at = self.clock.tick();
        match target.get_mut(name) {
            Some(cell) => cell.overwrite(value, written_at),
            None => {
                let cell = DataCell::new(name, value, self.step_id.clone(), kind, written_at);
                target.insert(name.to_string(), cell);
            }
        }
        Ok(())
    }

    /// Name → value copy of every cell of `kind`, in first-write order.
    pub fn read_all(&self, kind: CellKind) -> ValueMap {
        self.cells(kind)
            .values()
            .map(|cell| (cell.name().to_string(), cell.value().clone()))
            .collect()
    }

    /// Cells of `kind` with provenance.
    pub fn cells(&self, kind: CellKind) -> &IndexMap<String, DataCell> {
        match kind {
            CellKind::Input => &self.inputs,
            CellKind::State => &self.state,
            CellKind::Output => &self.outputs,
        }
    }

    /// Kind currently held under `name`, if any.
    pub fn kind_of(&self, name: &str) -> Option<CellKind> {
        [CellKind::State, CellKind::Output, CellKind::Input]
            .into_iter()
            .find(|kind| self.cells(*kind).contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StepDataStore {
        let clock = LogicalClock::new();
        let input = DataCell::new("a", Value::from(10), StepId::from("upstream"), CellKind::Input, clock.tick());
        StepDataStore::new(StepId::from("produce"), [input], clock)
    }

    #[test]
    fn last_write_wins_within_a_kind() {
        let mut store = store();
        store.write("n", Value::from(1), CellKind::State).unwrap();
        store.write("n", Value::from(2), CellKind::State).unwrap();

        assert_eq!(store.read_all(CellKind::State).get("n"), Some(&Value::Int(2)));
        assert_eq!(store.cells(CellKind::State).len(), 1);
    }

    #[test]
    fn overwrite_advances_written_at() {
        let mut store = store();
        store.write("n", Value::from(1), CellKind::Output).unwrap();
        let first = store.cells(CellKind::Output)["n"].written_at();
        store.write("n", Value::from(2), CellKind::Output).unwrap();
        assert!(store.cells(CellKind::Output)["n"].written_at() > first);
    }

    #[test]
    fn state_then_output_conflicts() {
        let mut store = store();
        store.write("n", Value::from(1), CellKind::State).unwrap();
        let error = store.write("n", Value::from(1), CellKind::Output).unwrap_err();

        assert_eq!(
            error,
            BridgeError::kind_conflict(&StepId::from("produce"), "n", CellKind::State, CellKind::Output)
        );
        assert!(store.read_all(CellKind::Output).is_empty());
    }

    #[test]
    fn output_then_state_conflicts() {
        let mut store = store();
        store.write("n", Value::from(1), CellKind::Output).unwrap();
        let error = store.write("n", Value::from(1), CellKind::State).unwrap_err();
        assert!(matches!(error, BridgeError::KindConflict { existing: CellKind::Output, .. }));
    }

    #[test]
    fn inputs_are_read_only() {
        let mut store = store();
        let error = store.write("a", Value::from(1), CellKind::Input).unwrap_err();
        assert!(matches!(error, BridgeError::ReadOnlyInput { .. }));
        assert_eq!(store.read_all(CellKind::Input).get("a"), Some(&Value::Int(10)));
    }

    #[test]
    fn state_may_reuse_an_input_name() {
        let mut store = store();
        store.write("a", Value::from(11), CellKind::State).unwrap();
        assert_eq!(store.read_all(CellKind::Input).get("a"), Some(&Value::Int(10)));
        assert_eq!(store.read_all(CellKind::State).get("a"), Some(&Value::Int(11)));
        assert_eq!(store.kind_of("a"), Some(CellKind::State));
    }

    #[test]
    fn read_all_keeps_first_write_order() {
        let mut store = store();
        store.write("z", Value::from(1), CellKind::State).unwrap();
        store.write("a", Value::from(2), CellKind::State).unwrap();
        store.write("z", Value::from(3), CellKind::State).unwrap();

        let names: Vec<_> = store.read_all(CellKind::State).keys().cloned().collect();
        assert_eq!(names, vec!["z", "a"]);
    }
}
