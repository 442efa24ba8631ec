//! The fixed, ordered postprocessing pipeline.

use std::sync::Arc;
use std::time::Instant;

use contracts::{EngineConfig, SystemId, TelemetryError};
use datastore::HierarchyStore;
use observability::{record_pass, LogChannel};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::pass::{PassContext, PassOutcome, PostprocessPass};
use crate::passes::{
    Flightbook, GlidePositionBased, GlideVelocityBased, PowerStatistics, TimingRepair,
};

/// How one pass ended, as seen by the caller of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    Completed { outputs: usize },
    Degraded { outputs: usize, missing: Vec<String> },
    /// Nothing to do, or a required input is absent
    Skipped { reason: String },
    /// Inputs present but inconsistent; outputs left untouched
    Aborted { reason: String },
    Failed { error: String },
}

impl PassStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PassStatus::Completed { .. } => "completed",
            PassStatus::Degraded { .. } => "degraded",
            PassStatus::Skipped { .. } => "skipped",
            PassStatus::Aborted { .. } => "aborted",
            PassStatus::Failed { .. } => "failed",
        }
    }

    /// True if the pass wrote any output.
    pub fn produced_output(&self) -> bool {
        matches!(
            self,
            PassStatus::Completed { outputs, .. } | PassStatus::Degraded { outputs, .. } if *outputs > 0
        )
    }
}

impl From<PassOutcome> for PassStatus {
    fn from(outcome: PassOutcome) -> Self {
        match outcome {
            PassOutcome::Completed { outputs } => PassStatus::Completed { outputs },
            PassOutcome::Degraded { outputs, missing } => PassStatus::Degraded { outputs, missing },
            PassOutcome::Skipped { reason } => PassStatus::Skipped { reason },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub name: &'static str,
    #[serde(flatten)]
    pub status: PassStatus,
    pub duration_ms: f64,
}

/// Per-pass results of one pipeline run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub entries: Vec<PassReport>,
}

impl PipelineReport {
    pub fn get(&self, name: &str) -> Option<&PassReport> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn count(&self, label: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status.label() == label)
            .count()
    }
}

/// Ordered list of passes. Later passes may read what earlier ones wrote.
#[derive(Debug, Clone)]
pub struct Pipeline {
    passes: Vec<Arc<dyn PostprocessPass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// timing repair → flight-book → power → glide (position) → glide (velocity)
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Arc::new(TimingRepair),
                Arc::new(Flightbook),
                Arc::new(PowerStatistics),
                Arc::new(GlidePositionBased),
                Arc::new(GlideVelocityBased),
            ],
        }
    }

    pub fn with_passes(passes: Vec<Arc<dyn PostprocessPass>>) -> Self {
        Self { passes }
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass in order. A failing pass never stops the ones after it.
    #[instrument(name = "pipeline_run", skip_all, fields(system_id = system_id))]
    pub fn run(
        &self,
        system_id: SystemId,
        store: &mut HierarchyStore,
        config: &EngineConfig,
        log: &LogChannel,
    ) -> PipelineReport {
        let mut report = PipelineReport::default();

        for pass in &self.passes {
            let started = Instant::now();
            let result = {
                let mut ctx = PassContext::new(system_id, store, config, log);
                pass.run(&mut ctx)
            };
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            let status = match result {
                Ok(outcome) => PassStatus::from(outcome),
                Err(e @ TelemetryError::MissingPrerequisite { .. }) => {
                    log.info(format_args!("{}: skipped ({e})", pass.name()));
                    PassStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e @ TelemetryError::UnsyncedBaselines { .. }) => {
                    log.warn(format_args!("{}: aborted ({e})", pass.name()));
                    PassStatus::Aborted {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    log.error(format_args!("{}: failed ({e})", pass.name()));
                    PassStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            debug!(pass = pass.name(), status = status.label(), duration_ms, "pass finished");
            record_pass(pass.name(), status.label(), duration_ms);
            report.entries.push(PassReport {
                name: pass.name(),
                status,
                duration_ms,
            });
        }

        report
    }
}
