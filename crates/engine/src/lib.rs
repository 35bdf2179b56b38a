//! # Stepwire Engine
//!
//! The step execution bridge between an external workflow scheduler and per-step script code.
//! Each step gets a fresh [`StepContext`] exposing four calls through the [`Act`] trait:
//! `inputs()`, `set()`, `set_output()` and `state()`. Outputs written with `set_output` reach
//! downstream steps only after the [`ExecutionSupervisor`] commits the step.
//!
//! ## Usage
//!
//! ```rust
//! use stepwire_engine::{Act, Console, ExecutionSupervisor, ScriptError, StepRequest};
//! use stepwire_types::Value;
//!
//! let supervisor = ExecutionSupervisor::default();
//!
//! let produce = |act: &mut dyn Act, _: &Console| -> Result<(), ScriptError> {
//!     let a = act.inputs().get("a").and_then(Value::as_i64).unwrap_or_default();
//!     act.set("input", Value::from(a + 100))?;
//!     act.set_output("my_data", Value::from("abc"))?;
//!     Ok(())
//! };
//! supervisor.execute(&StepRequest::new("produce").constant("a", 10), &produce)?;
//!
//! let consume = |act: &mut dyn Act, console: &Console| -> Result<(), ScriptError> {
//!     let inputs = act.inputs();
//!     let data = inputs.require("my_data")?;
//!     console.info(format!("received {data}"));
//!     Ok(())
//! };
//! supervisor.execute(&StepRequest::new("consume").declare(["my_data"]), &consume)?;
//! # Ok::<(), stepwire_engine::BridgeError>(())
//! ```
//!
//! ## Architecture
//!
//! - **`store`**: per-step cells behind `set`, `set_output` and `state`
//! - **`propagation`**: run-scoped table of published outputs
//! - **`context`**: the `Act` binding and the step context implementing it
//! - **`script`**: the `StepScript` seam and the script console
//! - **`supervisor`**: step lifecycle, commit, failure classification and the run archive
//! - **`logging`**: sinks for script-originated log calls
//! - **`config`**: bridge configuration loading

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod propagation;
pub mod script;
pub mod store;
pub mod supervisor;

pub use clock::LogicalClock;
pub use config::{BridgeConfig, ConfigError, default_config_path, load_config, load_config_from_path};
pub use context::{Act, Inputs, StepContext};
pub use error::{BridgeError, ScriptError};
pub use logging::{BufferedLogSink, FanoutLogSink, LogRingBuffer, LogSink, TracingLogSink};
pub use propagation::{PropagationTable, PublishConflict, PublishReport, Resolution};
pub use script::{Console, StepScript};
pub use store::StepDataStore;
pub use supervisor::{ExecutionSupervisor, PublishedOutputs, StepRecord, StepRequest};
