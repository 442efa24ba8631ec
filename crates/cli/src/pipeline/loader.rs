//! Concurrent loading of inputs into one merged scenario.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use contracts::{EngineConfig, SystemId};
use ingestion::{load_path, StatsSnapshot};
use postprocess::PipelineReport;
use time_sync::{format_epoch_us, starttime_from_filename};
use tracing::{debug, info, instrument, warn};
use vehicle::Scenario;

use crate::error::{CliError, Result};
use crate::pipeline::RunStats;

/// What to load and how to combine it.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub inputs: Vec<PathBuf>,
    pub config: EngineConfig,
    /// Delay applied to every input after the first (seconds)
    pub shift_s: f64,
    pub calculate_time_offset: bool,
    pub strict: bool,
}

/// The merged scenario plus everything learned while building it.
#[derive(Debug)]
pub struct Loaded {
    pub scenario: Scenario,
    /// Reports of the final pipeline run on the merged scenario
    pub reports: BTreeMap<SystemId, PipelineReport>,
    pub stats: RunStats,
}

impl LoadPlan {
    /// Parse every input on a blocking task, process each on its own, then
    /// merge the rest into the first and process the result.
    #[instrument(name = "load_plan", skip(self), fields(inputs = self.inputs.len()))]
    pub async fn execute(self) -> Result<Loaded> {
        let started = Instant::now();
        for path in &self.inputs {
            if !path.exists() {
                return Err(CliError::input_not_found(path));
            }
        }

        let handles: Vec<_> = self
            .inputs
            .iter()
            .cloned()
            .map(|path| {
                let config = self.config.clone();
                let strict = self.strict;
                tokio::task::spawn_blocking(move || {
                    load_path(&path, config, strict).map_err(|e| CliError::ingestion(&path, e))
                })
            })
            .collect();

        let mut stats = RunStats::new(self.inputs.len());
        let mut loaded = Vec::with_capacity(handles.len());
        // awaited in input order so the first input stays the merge base
        for (path, handle) in self.inputs.iter().zip(handles) {
            let (mut scenario, snapshot) = handle.await??;
            self.prepare(path, &mut scenario, &snapshot);
            stats.record_reports(&scenario.process(self.calculate_time_offset));
            stats.absorb_ingest(&snapshot);
            loaded.push(scenario);
        }

        let mut inputs = loaded.into_iter();
        let mut merged = inputs.next().unwrap_or_default();
        for mut other in inputs {
            other.shift_time(self.shift_s);
            if !merged.merge_in(&other) {
                warn!("merge skipped units; see earlier diagnostics");
                stats.merge_conflicts += 1;
            }
        }

        let reports = merged.process(self.calculate_time_offset);
        stats.record_reports(&reports);
        stats.finish(&merged, started.elapsed());
        info!(
            systems = merged.len(),
            messages = merged.messages(),
            "scenario ready"
        );

        Ok(Loaded {
            scenario: merged,
            reports,
            stats,
        })
    }

    fn prepare(&self, path: &Path, scenario: &mut Scenario, snapshot: &StatsSnapshot) {
        if let Some(guess) = starttime_from_filename(path) {
            debug!(path = %path.display(), guess = %format_epoch_us(guess), "start time from file name");
            scenario.set_starttime_guess(guess);
        }
        info!(
            path = %path.display(),
            systems = scenario.len(),
            events = snapshot.events,
            parse_errors = snapshot.parse_errors,
            "input loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn input(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn plan(inputs: Vec<PathBuf>) -> LoadPlan {
        LoadPlan {
            inputs,
            config: EngineConfig::default(),
            shift_s: 0.0,
            calculate_time_offset: true,
            strict: false,
        }
    }

    #[tokio::test]
    async fn test_missing_input() {
        let err = plan(vec![PathBuf::from("/nonexistent/a.jsonl")])
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_merges_inputs() {
        let a = input(&[
            r#"{"event": "time", "relative_us": 0}"#,
            r#"{"event": "track", "record": {"kind": "sys_perf", "load_percent": 20.0, "voltage_v": 12.0, "current_a": 1.5}}"#,
        ]);
        let b = input(&[
            r#"{"system": 2, "event": "time", "relative_us": 0}"#,
            r#"{"system": 2, "event": "track", "record": {"kind": "velocity", "vx": 1.0, "vy": 0.0, "vz": 0.0}}"#,
        ]);
        let loaded = plan(vec![a.path().to_path_buf(), b.path().to_path_buf()])
            .execute()
            .await
            .unwrap();
        assert_eq!(loaded.scenario.len(), 2);
        assert_eq!(loaded.scenario.messages(), 4);
        assert_eq!(loaded.stats.ingest.events, 4);
        assert_eq!(loaded.reports.len(), 2);
        assert_eq!(loaded.stats.merge_conflicts, 0);
    }

    #[tokio::test]
    async fn test_strict_reports_path() {
        let bad = input(&["not json"]);
        let mut plan = plan(vec![bad.path().to_path_buf()]);
        plan.strict = true;
        let err = plan.execute().await.unwrap_err();
        assert!(matches!(err, CliError::Ingestion { .. }));
    }
}
