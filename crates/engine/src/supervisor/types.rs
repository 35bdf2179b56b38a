//! Requests, results and archived records exchanged with the scheduler.

use chrono::{DateTime, Utc};
use stepwire_types::{LogicalTime, StepId, StepPhase, Value, ValueMap};

use crate::error::BridgeError;

/// Everything the scheduler supplies to start one step.
#[derive(Debug, Clone)]
pub struct StepRequest {
    /// Identifier of the step being run.
    pub step_id: StepId,
    /// Upstream names this step consumes from the propagation table.
    pub declared_inputs: Vec<String>,
    /// Constant inputs supplied by the scheduler.
    pub constants: ValueMap,
}

impl StepRequest {
    pub fn new(step_id: impl Into<StepId>) -> Self {
        Self {
            step_id: step_id.into(),
            declared_inputs: Vec::new(),
            constants: ValueMap::new(),
        }
    }

    /// Adds names to consume from upstream steps.
    pub fn declare<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_inputs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a scheduler-supplied constant input.
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }
}

/// Outputs merged into the propagation table by a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedOutputs {
    pub step_id: StepId,
    /// Table version after the merge.
    pub table_version: LogicalTime,
    /// Published name → value, in first-write order.
    pub values: ValueMap,
    /// `DuplicateNameAmbiguity` for every name that replaced a concurrent publish. Informational.
    pub ambiguities: Vec<BridgeError>,
}

/// Archived invocation record of a finished step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step_id: StepId,
    /// `Committed` or `Failed`.
    pub phase: StepPhase,
    /// Input snapshot the step ran with.
    pub inputs: ValueMap,
    /// Local state at the end of the step.
    pub state: ValueMap,
    /// Outputs the step wrote. Only merged when `phase` is `Committed`.
    pub outputs: ValueMap,
    pub failure: Option<BridgeError>,
    pub finished_at: DateTime<Utc>,
}

impl StepRecord {
    pub fn is_committed(&self) -> bool {
        self.phase == StepPhase::Committed
    }
}
