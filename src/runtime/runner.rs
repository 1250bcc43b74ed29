//! Chain Runner - sequential execution with all-or-nothing rollback
//!
//! Walks `order()`, feeding every task the inputs resolved from the last
//! result entry. When a task fails, every completed task is reverted in
//! reverse order before the error is returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::chain::FrozenChain;
use crate::error::{LinflowError, Result};
use crate::event::{EventKind, EventLog};
use crate::store::{Outputs, ResultLog, ResultSource};

use super::step::Step;

/// What a successful run produced
#[derive(Debug)]
pub struct RunReport {
    /// Outputs of the final task (empty for an empty chain)
    pub final_outputs: Outputs,
    /// Per-task outputs in execution order
    pub results: ResultLog<dyn Step>,
    pub duration: Duration,
}

/// Linear chain runner with event sourcing
pub struct Runner {
    chain: FrozenChain<dyn Step>,
    event_log: EventLog,
}

impl Runner {
    pub fn new(chain: FrozenChain<dyn Step>) -> Self {
        Self {
            chain,
            event_log: EventLog::new(),
        }
    }

    /// Share an existing event log (e.g. one log across several runs)
    pub fn with_event_log(mut self, event_log: EventLog) -> Self {
        self.event_log = event_log;
        self
    }

    pub fn chain(&self) -> &FrozenChain<dyn Step> {
        &self.chain
    }

    /// Get the event log for inspection/export
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Execute every task in order; on failure roll back and return the error
    #[instrument(skip(self), fields(chain = %self.chain.name()))]
    pub fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        let results: ResultLog<dyn Step> = ResultLog::new();

        info!(tasks = self.chain.len(), "chain started");
        self.event_log.emit(EventKind::ChainStarted {
            chain: Arc::from(self.chain.name()),
            task_count: self.chain.len(),
        });

        for task in self.chain.order() {
            let task_id: Arc<str> = Arc::from(task.name());
            let inputs = self.chain.resolve_inputs(task.as_ref(), &results);

            self.event_log.emit(EventKind::TaskStarted {
                task_id: Arc::clone(&task_id),
                inputs: Value::Object(inputs.clone()),
            });

            let task_started = Instant::now();
            match task.execute(&inputs) {
                Ok(outputs) => {
                    self.event_log.emit(EventKind::TaskCompleted {
                        task_id: Arc::clone(&task_id),
                        outputs: Value::Object(outputs.clone()),
                        duration_ms: task_started.elapsed().as_millis() as u64,
                    });
                    results.append(task, outputs);
                }
                Err(err) => {
                    error!(task = %task_id, error = %err, "task failed");
                    self.event_log.emit(EventKind::TaskFailed {
                        task_id: Arc::clone(&task_id),
                        error: err.to_string(),
                        duration_ms: task_started.elapsed().as_millis() as u64,
                    });
                    return Err(self.roll_back(&results, task_id, err));
                }
            }
        }

        let final_outputs = results
            .last_outputs()
            .map(|outputs| outputs.as_ref().clone())
            .unwrap_or_default();
        let duration = started.elapsed();

        self.event_log.emit(EventKind::ChainCompleted {
            final_outputs: Value::Object(final_outputs.clone()),
            total_duration_ms: duration.as_millis() as u64,
        });
        info!(duration_ms = duration.as_millis() as u64, "chain completed");

        Ok(RunReport {
            final_outputs,
            results,
            duration,
        })
    }

    /// Revert completed tasks newest-first
    ///
    /// Keeps going past a failed revert; the first such failure is reported
    /// wrapped around the original error.
    fn roll_back(
        &self,
        results: &ResultLog<dyn Step>,
        failed_task: Arc<str>,
        cause: LinflowError,
    ) -> LinflowError {
        let mut reverted = 0;
        let mut revert_error: Option<(String, String)> = None;

        for entry in results.entries().iter().rev() {
            let task_id: Arc<str> = Arc::from(entry.task.name());
            match entry.task.revert(&entry.outputs) {
                Ok(()) => {
                    reverted += 1;
                    self.event_log.emit(EventKind::TaskReverted { task_id });
                }
                Err(err) => {
                    warn!(task = %task_id, error = %err, "revert failed");
                    self.event_log.emit(EventKind::RevertFailed {
                        task_id: Arc::clone(&task_id),
                        error: err.to_string(),
                    });
                    revert_error.get_or_insert_with(|| (task_id.to_string(), err.to_string()));
                }
            }
        }

        self.event_log.emit(EventKind::ChainRolledBack {
            failed_task,
            reverted,
        });

        match revert_error {
            Some((task_id, reason)) => LinflowError::RevertFailed {
                task_id,
                reason,
                cause: Box::new(cause),
            },
            None => cause,
        }
    }
}
