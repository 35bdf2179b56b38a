//! Seam between the bridge and whatever host runs step code.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use stepwire_types::{LogLevel, ScriptLogEntry, StepId};

use crate::context::{Act, StepContext};
use crate::error::{BridgeError, ScriptError};
use crate::logging::LogSink;

/// A step body. Receives the data binding and a console, and nothing else.
pub trait StepScript: Send + Sync {
    fn run(&self, act: &mut dyn Act, console: &Console) -> Result<(), ScriptError>;
}

impl<F> StepScript for F
where
    F: Fn(&mut dyn Act, &Console) -> Result<(), ScriptError> + Send + Sync,
{
    fn run(&self, act: &mut dyn Act, console: &Console) -> Result<(), ScriptError> {
        self(act, console)
    }
}

/// Log surface handed to scripts. Messages are forwarded untouched.
#[derive(Debug, Clone)]
pub struct Console {
    step_id: StepId,
    sink: Arc<dyn LogSink>,
}

impl Console {
    pub fn new(step_id: StepId, sink: Arc<dyn LogSink>) -> Self {
        Self { step_id, sink }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink
            .record(ScriptLogEntry::new(self.step_id.clone(), level, message));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

/// Runs `script` against `context`, turning errors and panics into a `BridgeError`.
pub(crate) fn invoke(script: &dyn StepScript, context: &mut StepContext, console: &Console) -> Result<(), BridgeError> {
    context.mark_running();
    let step_id = context.step_id().clone();
    match catch_unwind(AssertUnwindSafe(|| script.run(context, console))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.into_bridge_error(&step_id)),
        Err(payload) => Err(BridgeError::script_failure(&step_id, panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("script panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("script panicked: {message}")
    } else {
        "script panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use stepwire_types::{CellKind, DataCell, Value};

    use super::*;
    use crate::clock::LogicalClock;
    use crate::logging::BufferedLogSink;

    fn context() -> StepContext {
        let clock = LogicalClock::new();
        let cell = DataCell::new("a", Value::from(10), StepId::from("produce"), CellKind::Input, clock.tick());
        StepContext::new(StepId::from("produce"), vec![cell], 0, clock)
    }

    fn console(sink: Arc<BufferedLogSink>) -> Console {
        Console::new(StepId::from("produce"), sink)
    }

    #[test]
    fn closures_are_scripts() {
        let sink = Arc::new(BufferedLogSink::new(10));
        let mut ctx = context();
        let script = |act: &mut dyn Act, console: &Console| -> Result<(), ScriptError> {
            let a = act.inputs().get("a").and_then(Value::as_i64).unwrap_or_default();
            act.set("input", Value::from(a + 100))?;
            console.info(format!("input is {}", a + 100));
            Ok(())
        };

        invoke(&script, &mut ctx, &console(sink.clone())).unwrap();

        assert_eq!(ctx.state().get("input"), Some(&Value::Int(110)));
        assert_eq!(sink.logs(&StepId::from("produce"))[0].message, "input is 110");
    }

    #[test]
    fn panics_become_execution_failures() {
        let sink = Arc::new(BufferedLogSink::new(10));
        let mut ctx = context();
        let script = |_: &mut dyn Act, _: &Console| -> Result<(), ScriptError> { panic!("kaboom") };

        let error = invoke(&script, &mut ctx, &console(sink)).unwrap_err();
        assert_eq!(
            error,
            BridgeError::script_failure(&StepId::from("produce"), "script panicked: kaboom")
        );
    }

    #[test]
    fn thrown_errors_are_classified() {
        let sink = Arc::new(BufferedLogSink::new(10));
        let mut ctx = context();
        let script = |_: &mut dyn Act, _: &Console| -> Result<(), ScriptError> { Err(ScriptError::thrown("bad input")) };

        let error = invoke(&script, &mut ctx, &console(sink)).unwrap_err();
        assert!(matches!(error, BridgeError::ScriptExecutionFailure { ref message, .. } if message == "bad input"));
        assert_eq!(ctx.phase(), stepwire_types::StepPhase::Running);
    }
}
