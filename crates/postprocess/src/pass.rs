//! 后处理步骤 trait

use std::fmt;

use contracts::{DataPath, EngineConfig, SystemId, TelemetryError};
use datastore::{DataUnit, HierarchyStore, Timeseries, UnitVariant};
use observability::LogChannel;
use regex::Regex;
use serde::Serialize;

/// Everything a pass may touch while it runs.
pub struct PassContext<'a> {
    pub system_id: SystemId,
    pub store: &'a mut HierarchyStore,
    pub config: &'a EngineConfig,
    pub log: &'a LogChannel,
}

impl fmt::Debug for PassContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassContext")
            .field("system_id", &self.system_id)
            .field("store", &self.store)
            .finish()
    }
}

impl<'a> PassContext<'a> {
    pub fn new(
        system_id: SystemId,
        store: &'a mut HierarchyStore,
        config: &'a EngineConfig,
        log: &'a LogChannel,
    ) -> Self {
        Self {
            system_id,
            store,
            config,
            log,
        }
    }

    /// Float series at an exact path, or `MissingPrerequisite`.
    pub fn require_series(
        &self,
        pass: &str,
        path: &str,
    ) -> Result<&Timeseries<f32>, TelemetryError> {
        self.store
            .typed::<Timeseries<f32>>(path)
            .ok_or_else(|| TelemetryError::missing_prerequisite(pass, path))
    }

    /// First raw float series whose path matches `pattern`, sorted-path order.
    ///
    /// Derived units are never candidates, so a pass cannot feed on its own
    /// outputs from an earlier run.
    pub fn find_raw_series(&self, pattern: &Regex) -> Option<(&DataPath, &Timeseries<f32>)> {
        self.store
            .find_matching(pattern, |unit| {
                unit.is_raw() && Timeseries::<f32>::from_unit(unit).is_some()
            })
            .and_then(|(path, unit)| Timeseries::<f32>::from_unit(unit).map(|ts| (path, ts)))
    }

    /// Store a derived unit at `path`, replacing whatever was there.
    pub fn publish(&mut self, path: &str, unit: impl Into<DataUnit>) -> Result<(), TelemetryError> {
        let path = DataPath::parse(path)?;
        let mut unit = unit.into();
        unit.meta_mut().class = datastore::DataClass::Derived;
        self.store.register(path, unit);
        Ok(())
    }
}

/// Compile a built-in search pattern.
pub fn pattern(source: &str) -> Result<Regex, TelemetryError> {
    Regex::new(source).map_err(|e| TelemetryError::invalid_pattern(source, e.to_string()))
}

/// What a pass achieved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every output was produced
    Completed { outputs: usize },
    /// Some optional inputs were absent; a subset of outputs was produced
    Degraded { outputs: usize, missing: Vec<String> },
    /// Nothing to do
    Skipped { reason: String },
}

impl PassOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PassOutcome::Completed { .. } => "completed",
            PassOutcome::Degraded { .. } => "degraded",
            PassOutcome::Skipped { .. } => "skipped",
        }
    }
}

/// 后处理步骤 trait
///
/// Each pass:
/// 1. looks up its inputs (exact path or name pattern)
/// 2. recomputes its outputs from scratch
/// 3. replaces its previous outputs in the store
///
/// A pass must be idempotent: running it twice on unchanged raw data yields
/// identical outputs.
pub trait PostprocessPass: Send + Sync + fmt::Debug {
    /// Human-readable pass name
    fn name(&self) -> &'static str;

    /// Run the pass. `MissingPrerequisite` and `UnsyncedBaselines` errors are
    /// expected conditions the pipeline reports rather than propagates.
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError>;
}
