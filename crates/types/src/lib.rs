//! Shared data model for the Stepwire step execution bridge.
//!
//! These types cross the boundary between the bridge, the external scheduler, and script
//! hosts, so they carry no runtime behavior beyond conversions and serde support.

pub mod cell;
pub mod event;
pub mod log;
pub mod value;

pub use cell::{CellKind, DataCell, LogicalTime, StepId};
pub use event::{BridgeEvent, StepPhase};
pub use log::{LogLevel, ScriptLogEntry};
pub use value::{Value, ValueError, ValueMap};
