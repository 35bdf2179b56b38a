//! The binding handed to step scripts and the per-step context that implements it.

use std::sync::Arc;

use stepwire_types::{CellKind, DataCell, LogicalTime, StepId, StepPhase, Value, ValueMap};

use crate::clock::LogicalClock;
use crate::error::BridgeError;
use crate::store::StepDataStore;

/// Data-exchange surface visible to script code. These four calls are the only way a script can
/// read or write workflow data.
pub trait Act {
    /// Snapshot of the inputs resolved when the step began. Identical on every call.
    fn inputs(&self) -> Inputs;

    /// Writes a step-local state value.
    fn set(&mut self, name: &str, value: Value) -> Result<(), BridgeError>;

    /// Writes a value to be published when the step commits.
    fn set_output(&mut self, name: &str, value: Value) -> Result<(), BridgeError>;

    /// State values written so far. Outputs are not included.
    fn state(&self) -> ValueMap;
}

/// Immutable input snapshot. Cloning shares the underlying map.
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    step_id: StepId,
    values: Arc<ValueMap>,
}

impl Inputs {
    pub(crate) fn new(step_id: StepId, values: ValueMap) -> Self {
        Self {
            step_id,
            values: Arc::new(values),
        }
    }

    /// Value under `name`; absent names simply yield `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Value under `name`, or `UnknownInputName` if it was never resolved.
    pub fn require(&self, name: &str) -> Result<&Value, BridgeError> {
        self.values
            .get(name)
            .ok_or_else(|| BridgeError::unknown_input(&self.step_id, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_map(&self) -> ValueMap {
        self.values.as_ref().clone()
    }
}

/// One step invocation: its data store, the frozen input snapshot and its lifecycle phase.
///
/// Created by [`ExecutionSupervisor::begin_step`](crate::ExecutionSupervisor::begin_step) and
/// consumed by `commit_step` or `fail_step`.
#[derive(Debug)]
pub struct StepContext {
    store: StepDataStore,
    inputs: Inputs,
    observed_version: LogicalTime,
    phase: StepPhase,
    fatal: Option<BridgeError>,
}

impl StepContext {
    pub(crate) fn new(
        step_id: StepId,
        input_cells: Vec<DataCell>,
        observed_version: LogicalTime,
        clock: LogicalClock,
    ) -> Self {
        let snapshot = input_cells
            .iter()
            .map(|cell| (cell.name().to_string(), cell.value().clone()))
            .collect();
        Self {
            inputs: Inputs::new(step_id.clone(), snapshot),
            store: StepDataStore::new(step_id, input_cells, clock),
            observed_version,
            phase: StepPhase::Pending,
            fatal: None,
        }
    }

    pub fn step_id(&self) -> &StepId {
        self.store.step_id()
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Propagation table version the inputs were resolved against.
    pub fn observed_version(&self) -> LogicalTime {
        self.observed_version
    }

    /// Outputs pending publication.
    pub fn outputs(&self) -> ValueMap {
        self.store.read_all(CellKind::Output)
    }

    pub fn store(&self) -> &StepDataStore {
        &self.store
    }

    pub(crate) fn mark_running(&mut self) {
        if self.phase == StepPhase::Pending {
            self.phase = StepPhase::Running;
        }
    }

    /// Error that must fail the step even if the script caught it.
    pub fn fatal_error(&self) -> Option<&BridgeError> {
        self.fatal.as_ref()
    }

    pub(crate) fn into_store(self) -> StepDataStore {
        self.store
    }
}

impl Act for StepContext {
    fn inputs(&self) -> Inputs {
        self.inputs.clone()
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), BridgeError> {
        self.mark_running();
        self.store.write(name, value, CellKind::State)
    }

    fn set_output(&mut self, name: &str, value: Value) -> Result<(), BridgeError> {
        self.mark_running();
        // Kind conflicts are reported before the value is inspected.
        if self.store.kind_of(name) == Some(CellKind::State) {
            return self.store.write(name, value, CellKind::Output);
        }
        if let Err(error) = value.to_json() {
            let error = BridgeError::serialization(self.step_id(), name, error);
            self.fatal.get_or_insert_with(|| error.clone());
            return Err(error);
        }
        self.store.write(name, value, CellKind::Output)
    }

    fn state(&self) -> ValueMap {
        self.store.read_all(CellKind::State)
    }
}
