//! Step lifecycle phases and the events the supervisor emits while driving them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::{LogicalTime, StepId};

/// Lifecycle of one step invocation: `Pending → Running → {Committed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Inputs resolved, script not yet invoked.
    Pending,
    /// Script body is executing or binding calls have been made.
    Running,
    /// Outputs merged into the propagation table.
    Committed,
    /// Step aborted; nothing was merged.
    Failed,
}

impl StepPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepPhase::Committed | StepPhase::Failed)
    }
}

/// Lifecycle notifications streamed to the embedding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Inputs were resolved and a step context handed out.
    StepBegan {
        step_id: StepId,
        /// Names present in the input snapshot.
        inputs: Vec<String>,
        /// Propagation table version the snapshot was taken from.
        table_version: LogicalTime,
        at: DateTime<Utc>,
    },
    /// Outputs were merged into the propagation table.
    StepCommitted {
        step_id: StepId,
        outputs: Vec<String>,
        table_version: LogicalTime,
        at: DateTime<Utc>,
    },
    /// The step failed; `error` is the rendered failure.
    StepFailed { step_id: StepId, error: String, at: DateTime<Utc> },
    /// A publish replaced a value written by a concurrently running step.
    PublishOverridden {
        name: String,
        step_id: StepId,
        previous_step: StepId,
        at: DateTime<Utc>,
    },
}

impl BridgeEvent {
    /// Step the event refers to.
    pub fn step_id(&self) -> &StepId {
        match self {
            BridgeEvent::StepBegan { step_id, .. }
            | BridgeEvent::StepCommitted { step_id, .. }
            | BridgeEvent::StepFailed { step_id, .. }
            | BridgeEvent::PublishOverridden { step_id, .. } => step_id,
        }
    }
}
