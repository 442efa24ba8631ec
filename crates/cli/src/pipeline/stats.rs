//! Run statistics and their text summary.

use std::collections::BTreeMap;
use std::time::Duration;

use contracts::SystemId;
use ingestion::StatsSnapshot;
use observability::{record_unit_count, PassMetricsAggregator};
use postprocess::PipelineReport;
use serde::Serialize;
use vehicle::Scenario;

/// Statistics from one `run`
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Number of input files
    pub inputs: usize,

    /// Ingestion counters summed over every input
    pub ingest: StatsSnapshot,

    /// Inputs whose merge skipped at least one unit
    pub merge_conflicts: usize,

    /// Systems in the merged scenario
    pub systems: usize,

    /// Data units in the merged scenario
    pub units: usize,

    /// Wall time for loading, merging and processing
    pub duration: Duration,

    /// Per-pass outcomes and durations over every pipeline run
    pub passes: PassMetricsAggregator,
}

/// Serializable per-pass line of the summary
#[derive(Debug, Clone, Serialize)]
pub struct PassLine {
    pub pass: String,
    pub outcomes: BTreeMap<String, u64>,
    pub runs: u64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

impl RunStats {
    pub fn new(inputs: usize) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    pub fn absorb_ingest(&mut self, snapshot: &StatsSnapshot) {
        self.ingest.absorb(snapshot);
    }

    pub fn record_reports(&mut self, reports: &BTreeMap<SystemId, PipelineReport>) {
        for report in reports.values() {
            for entry in &report.entries {
                self.passes
                    .update(entry.name, entry.status.label(), entry.duration_ms);
            }
        }
    }

    pub fn finish(&mut self, scenario: &Scenario, duration: Duration) {
        self.systems = scenario.len();
        self.units = 0;
        for system in scenario.systems() {
            let units = system.store().len();
            record_unit_count(system.id(), units);
            self.units += units;
        }
        self.duration = duration;
    }

    pub fn pass_lines(&self) -> Vec<PassLine> {
        self.passes
            .summary()
            .into_iter()
            .map(|s| PassLine {
                pass: s.pass,
                outcomes: s.outcomes,
                runs: s.duration_ms.count,
                mean_ms: s.duration_ms.mean,
                max_ms: s.duration_ms.max,
            })
            .collect()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\nRun statistics:");
        println!(" - inputs: {}", self.inputs);
        println!(" - duration: {:.2}s", self.duration.as_secs_f64());
        println!(" - events: {}", self.ingest.events);
        println!(" - tracked records: {}", self.ingest.tracked);
        println!(" - rejected time updates: {}", self.ingest.rejected_time_updates);
        println!(" - parse errors: {}", self.ingest.parse_errors);
        println!(" - systems: {} ({} units)", self.systems, self.units);
        if self.merge_conflicts > 0 {
            println!(" - merges with skipped units: {}", self.merge_conflicts);
        }

        let summary = self.passes.summary();
        if !summary.is_empty() {
            println!("\nPostprocessing:");
            for pass in &summary {
                println!(" - {pass}");
            }
        }
    }
}
