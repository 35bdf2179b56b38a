//! Data cells: named value slots that remember which step wrote them and when.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Monotonic logical timestamp assigned by the run's clock.
pub type LogicalTime = u64;

/// Identifier of one step within a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for StepId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Role a cell plays inside one step invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Resolved at step start from published outputs or scheduler constants. Read-only.
    Input,
    /// Step-local scratch value written with `set`.
    State,
    /// Value written with `set_output` and published when the step commits.
    Output,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Input => write!(f, "input"),
            CellKind::State => write!(f, "state"),
            CellKind::Output => write!(f, "output"),
        }
    }
}

/// A named, typed value slot with provenance.
///
/// The kind is fixed at construction; overwriting replaces only the value and the logical
/// write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCell {
    name: String,
    value: Value,
    origin_step: StepId,
    kind: CellKind,
    written_at: LogicalTime,
}

impl DataCell {
    pub fn new(name: impl Into<String>, value: Value, origin_step: StepId, kind: CellKind, written_at: LogicalTime) -> Self {
        Self {
            name: name.into(),
            value,
            origin_step,
            kind,
            written_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Step that wrote the current value.
    pub fn origin_step(&self) -> &StepId {
        &self.origin_step
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn written_at(&self) -> LogicalTime {
        self.written_at
    }

    /// Replaces the value in place, keeping name, kind, and origin.
    pub fn overwrite(&mut self, value: Value, written_at: LogicalTime) {
        self.value = value;
        self.written_at = written_at;
    }

    /// Copy of this cell re-labelled with a different kind, used when a published output is
    /// handed to a consumer as an input.
    pub fn relabel(&self, kind: CellKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}
