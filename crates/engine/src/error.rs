//! Error types for bridge operations and script execution.

use stepwire_types::{CellKind, StepId, ValueError};
use thiserror::Error;

/// Errors raised by the binding surface and the execution supervisor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("step '{step_id}': '{name}' is already a {existing} cell and cannot be written as {requested}")]
    KindConflict {
        step_id: StepId,
        name: String,
        existing: CellKind,
        requested: CellKind,
    },

    #[error("step '{step_id}': input '{name}' was neither declared, supplied, nor published")]
    UnknownInputName { step_id: StepId, name: String },

    #[error("step '{step_id}': inputs are read-only, '{name}' cannot be written")]
    ReadOnlyInput { step_id: StepId, name: String },

    #[error("'{name}' published by step '{step_id}' overrides a concurrent publish from step '{previous_step}'")]
    DuplicateNameAmbiguity {
        name: String,
        step_id: StepId,
        previous_step: StepId,
    },

    #[error("step '{step_id}': script failed: {message}")]
    ScriptExecutionFailure { step_id: StepId, message: String },

    #[error("step '{step_id}': value '{name}' cannot be serialized: {source}")]
    Serialization {
        step_id: StepId,
        name: String,
        #[source]
        source: ValueError,
    },

    #[error("step '{step_id}' was cancelled")]
    Cancelled { step_id: StepId },
}

impl BridgeError {
    /// Create a kind conflict error.
    pub fn kind_conflict(step_id: &StepId, name: impl Into<String>, existing: CellKind, requested: CellKind) -> Self {
        Self::KindConflict {
            step_id: step_id.clone(),
            name: name.into(),
            existing,
            requested,
        }
    }

    /// Create an unknown input error.
    pub fn unknown_input(step_id: &StepId, name: impl Into<String>) -> Self {
        Self::UnknownInputName {
            step_id: step_id.clone(),
            name: name.into(),
        }
    }

    /// Create a read-only input error.
    pub fn read_only_input(step_id: &StepId, name: impl Into<String>) -> Self {
        Self::ReadOnlyInput {
            step_id: step_id.clone(),
            name: name.into(),
        }
    }

    /// Create a script failure error.
    pub fn script_failure(step_id: &StepId, message: impl Into<String>) -> Self {
        Self::ScriptExecutionFailure {
            step_id: step_id.clone(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(step_id: &StepId, name: impl Into<String>, source: ValueError) -> Self {
        Self::Serialization {
            step_id: step_id.clone(),
            name: name.into(),
            source,
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(step_id: &StepId) -> Self {
        Self::Cancelled { step_id: step_id.clone() }
    }

    /// Step the error is attributed to.
    pub fn step_id(&self) -> &StepId {
        match self {
            Self::KindConflict { step_id, .. }
            | Self::UnknownInputName { step_id, .. }
            | Self::ReadOnlyInput { step_id, .. }
            | Self::DuplicateNameAmbiguity { step_id, .. }
            | Self::ScriptExecutionFailure { step_id, .. }
            | Self::Serialization { step_id, .. }
            | Self::Cancelled { step_id } => step_id,
        }
    }

    /// Whether the error ends the step. Ambiguities are reported but the publish still lands.
    pub fn is_fatal_for_step(&self) -> bool {
        !matches!(self, Self::DuplicateNameAmbiguity { .. })
    }
}

/// What a script body returns when it does not complete normally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    /// A binding call failed and the script propagated it.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The script raised its own error.
    #[error("{message}")]
    Thrown { message: String },
}

impl ScriptError {
    /// Create a script-raised error.
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown { message: message.into() }
    }

    /// Maps the script outcome onto the bridge error reported for `step_id`.
    pub fn into_bridge_error(self, step_id: &StepId) -> BridgeError {
        match self {
            Self::Bridge(error) => error,
            Self::Thrown { message } => BridgeError::script_failure(step_id, message),
        }
    }
}
