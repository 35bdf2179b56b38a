//! Execution supervisor: drives each step from input resolution to commit or failure.
//!
//! The supervisor owns the run's [`PropagationTable`]. A step's outputs reach the table only
//! through [`ExecutionSupervisor::commit_step`], and only when the script returned normally.
//! Failures of any kind archive the step as `Failed` and merge nothing.

mod archive;
mod types;

pub use types::{PublishedOutputs, StepRecord, StepRequest};

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use stepwire_types::{BridgeEvent, CellKind, DataCell, ScriptLogEntry, StepId, StepPhase, ValueMap};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::LogicalClock;
use crate::config::BridgeConfig;
use crate::context::{Act, StepContext};
use crate::error::BridgeError;
use crate::logging::{BufferedLogSink, FanoutLogSink, LogSink, TracingLogSink};
use crate::propagation::PropagationTable;
use crate::script::{Console, StepScript, invoke};

use archive::RunArchive;

/// Runs steps for one workflow run. Shareable across threads; every method takes `&self`.
#[derive(Debug)]
pub struct ExecutionSupervisor {
    table: Arc<PropagationTable>,
    clock: LogicalClock,
    config: BridgeConfig,
    script_logs: Arc<BufferedLogSink>,
    log_sink: Arc<dyn LogSink>,
    event_tx: Option<UnboundedSender<BridgeEvent>>,
    archive: RunArchive,
}

impl Default for ExecutionSupervisor {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl ExecutionSupervisor {
    /// Creates a supervisor with an empty propagation table. Script logs go to `tracing` and to
    /// a per-step buffer.
    pub fn new(config: BridgeConfig) -> Self {
        let script_logs = Arc::new(BufferedLogSink::new(config.script_log_capacity));
        let sinks: Vec<Arc<dyn LogSink>> = vec![Arc::new(TracingLogSink), script_logs.clone()];
        Self {
            table: Arc::new(PropagationTable::new()),
            clock: LogicalClock::new(),
            archive: RunArchive::new(config.archive_capacity),
            log_sink: Arc::new(FanoutLogSink::new(sinks)),
            script_logs,
            event_tx: None,
            config,
        }
    }

    /// Streams lifecycle events to `event_tx`. A closed receiver is ignored.
    pub fn with_event_sender(mut self, event_tx: UnboundedSender<BridgeEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Forwards script logs to `sink` instead of `tracing`. The per-step buffer is kept.
    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        let sinks: Vec<Arc<dyn LogSink>> = vec![self.script_logs.clone(), sink];
        self.log_sink = Arc::new(FanoutLogSink::new(sinks));
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Read access for the scheduler. Scripts never see the table.
    pub fn table(&self) -> &PropagationTable {
        &self.table
    }

    /// Archived records, oldest first.
    pub fn archive(&self) -> Vec<StepRecord> {
        self.archive.records()
    }

    /// Most recent archived record for `step_id`.
    pub fn record(&self, step_id: &StepId) -> Option<StepRecord> {
        self.archive.latest(step_id)
    }

    /// Buffered script log entries for `step_id`.
    pub fn script_logs(&self, step_id: &StepId) -> Vec<ScriptLogEntry> {
        self.script_logs.logs(step_id)
    }

    /// Console bound to `step_id`, for hosts that drive the context themselves.
    pub fn console(&self, step_id: &StepId) -> Console {
        Console::new(step_id.clone(), self.log_sink.clone())
    }

    /// Resolves inputs and hands out a fresh context in the `Pending` phase.
    ///
    /// Published values are looked up for `declared_input_names` only. Constants are merged on
    /// top, or underneath when `constantsOverridePublished` is off. Names that resolve to
    /// nothing are simply absent.
    pub fn begin_step(&self, step_id: &StepId, declared_input_names: &[String], constant_inputs: &ValueMap) -> StepContext {
        let resolution = self.table.resolve(declared_input_names.iter().map(String::as_str));

        let mut cells: IndexMap<String, DataCell> = resolution
            .cells
            .into_iter()
            .map(|cell| (cell.name().to_string(), cell))
            .collect();
        for (name, value) in constant_inputs {
            if cells.contains_key(name) && !self.config.constants_override_published {
                continue;
            }
            let cell = DataCell::new(name.as_str(), value.clone(), step_id.clone(), CellKind::Input, self.clock.tick());
            cells.insert(name.clone(), cell);
        }

        for name in declared_input_names.iter().filter(|name| !cells.contains_key(name.as_str())) {
            debug!(step_id = %step_id, name = %name, "declared input has not been published");
        }

        let input_names: Vec<String> = cells.keys().cloned().collect();
        debug!(
            step_id = %step_id,
            inputs = ?input_names,
            version = resolution.version,
            "step inputs resolved"
        );
        self.emit(BridgeEvent::StepBegan {
            step_id: step_id.clone(),
            inputs: input_names,
            table_version: resolution.version,
            at: Utc::now(),
        });

        StepContext::new(
            step_id.clone(),
            cells.into_values().collect(),
            resolution.version,
            self.clock.clone(),
        )
    }

    /// Publishes the context's outputs and archives it as `Committed`.
    ///
    /// A serialization failure recorded during the step fails it here instead. Publishing over
    /// a value from a step this one never observed is logged and reported in
    /// [`PublishedOutputs::ambiguities`]; the new value wins.
    pub fn commit_step(&self, context: StepContext) -> Result<PublishedOutputs, BridgeError> {
        if let Some(error) = context.fatal_error().cloned() {
            return Err(self.fail_step(context, error));
        }

        let step_id = context.step_id().clone();
        let observed_version = context.observed_version();
        let inputs = context.inputs().to_map();
        let store = context.into_store();
        let state = store.read_all(CellKind::State);
        let values = store.read_all(CellKind::Output);

        let outputs: Vec<DataCell> = store.cells(CellKind::Output).values().cloned().collect();
        let report = self.table.publish(&step_id, outputs, observed_version);

        let mut ambiguities = Vec::with_capacity(report.conflicts.len());
        for conflict in report.conflicts {
            warn!(
                step_id = %step_id,
                name = %conflict.name,
                previous_step = %conflict.previous_step,
                version = report.version,
                "published output overrides a concurrent publish"
            );
            self.emit(BridgeEvent::PublishOverridden {
                name: conflict.name.clone(),
                step_id: step_id.clone(),
                previous_step: conflict.previous_step.clone(),
                at: Utc::now(),
            });
            ambiguities.push(BridgeError::DuplicateNameAmbiguity {
                name: conflict.name,
                step_id: step_id.clone(),
                previous_step: conflict.previous_step,
            });
        }

        info!(
            step_id = %step_id,
            outputs = values.len(),
            version = report.version,
            "step committed"
        );
        self.emit(BridgeEvent::StepCommitted {
            step_id: step_id.clone(),
            outputs: values.keys().cloned().collect(),
            table_version: report.version,
            at: Utc::now(),
        });
        self.archive_record(StepRecord {
            step_id: step_id.clone(),
            phase: StepPhase::Committed,
            inputs,
            state,
            outputs: values.clone(),
            failure: None,
            finished_at: Utc::now(),
        });

        Ok(PublishedOutputs {
            step_id,
            table_version: report.version,
            values,
            ambiguities,
        })
    }

    /// Archives the context as `Failed` without merging anything and returns `error`.
    pub fn fail_step(&self, context: StepContext, error: BridgeError) -> BridgeError {
        let step_id = context.step_id().clone();
        let inputs = context.inputs().to_map();
        let store = context.into_store();
        self.record_failure(
            &step_id,
            inputs,
            store.read_all(CellKind::State),
            store.read_all(CellKind::Output),
            &error,
        );
        error
    }

    /// Runs `script` for `request` on the current thread and commits on success.
    pub fn execute(&self, request: &StepRequest, script: &dyn StepScript) -> Result<PublishedOutputs, BridgeError> {
        let mut context = self.begin_step(&request.step_id, &request.declared_inputs, &request.constants);
        let console = self.console(&request.step_id);
        match invoke(script, &mut context, &console) {
            Ok(()) => self.commit_step(context),
            Err(error) => Err(self.fail_step(context, error)),
        }
    }

    /// Runs `script` on the blocking pool, racing it against `cancel`.
    ///
    /// On cancellation the step fails with `Cancelled` and nothing is merged, even if the
    /// script later returns normally.
    pub async fn execute_async(
        &self,
        request: StepRequest,
        script: Arc<dyn StepScript>,
        cancel: CancellationToken,
    ) -> Result<PublishedOutputs, BridgeError> {
        let step_id = request.step_id.clone();
        let mut context = self.begin_step(&step_id, &request.declared_inputs, &request.constants);
        if cancel.is_cancelled() {
            return Err(self.fail_step(context, BridgeError::cancelled(&step_id)));
        }

        let inputs = context.inputs().to_map();
        let console = self.console(&step_id);
        let task = tokio::task::spawn_blocking(move || {
            let result = invoke(script.as_ref(), &mut context, &console);
            (context, result)
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let error = BridgeError::cancelled(&step_id);
                self.record_failure(&step_id, inputs, ValueMap::new(), ValueMap::new(), &error);
                Err(error)
            }
            joined = task => match joined {
                Ok((context, Ok(()))) => self.commit_step(context),
                Ok((context, Err(error))) => Err(self.fail_step(context, error)),
                Err(join_error) => {
                    let error = BridgeError::script_failure(&step_id, join_error.to_string());
                    self.record_failure(&step_id, inputs, ValueMap::new(), ValueMap::new(), &error);
                    Err(error)
                }
            },
        }
    }

    fn record_failure(&self, step_id: &StepId, inputs: ValueMap, state: ValueMap, outputs: ValueMap, error: &BridgeError) {
        warn!(step_id = %step_id, error = %error, "step failed");
        self.emit(BridgeEvent::StepFailed {
            step_id: step_id.clone(),
            error: error.to_string(),
            at: Utc::now(),
        });
        self.archive_record(StepRecord {
            step_id: step_id.clone(),
            phase: StepPhase::Failed,
            inputs,
            state,
            outputs,
            failure: Some(error.clone()),
            finished_at: Utc::now(),
        });
    }

    /// Archives `record`; buffered logs go with the last record of an evicted step.
    fn archive_record(&self, record: StepRecord) {
        for evicted in self.archive.push(record) {
            debug!(step_id = %evicted, "evicted archived step and its script logs");
            self.script_logs.clear_logs(&evicted);
        }
    }

    fn emit(&self, event: BridgeEvent) {
        if let Some(event_tx) = &self.event_tx {
            let _ = event_tx.send(event);
        }
    }
}
