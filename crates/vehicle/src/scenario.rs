//! Multi-vehicle container keyed by system id.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use contracts::{secs_to_micros, EngineConfig, SystemId};
use postprocess::PipelineReport;
use tracing::{error, info, instrument};

use crate::System;

/// Every system seen in one or more telemetry sources.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    systems: BTreeMap<SystemId, System>,
    /// Epoch µs handed to systems without a time reference
    starttime_guess_us: i64,
    messages: u64,
    config: EngineConfig,
}

impl Scenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The system with `id`, created with the scenario config on first sight.
    pub fn system_or_insert(&mut self, id: SystemId) -> &mut System {
        let config = &self.config;
        self.systems.entry(id).or_insert_with(|| {
            info!(system_id = id, "new system");
            System::with_config(id, config.clone())
        })
    }

    pub fn system(&self, id: SystemId) -> Option<&System> {
        self.systems.get(&id)
    }

    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut System> {
        self.systems.get_mut(&id)
    }

    pub fn systems(&self) -> impl Iterator<Item = &System> {
        self.systems.values()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Count one ingested message for the overview.
    pub fn note_message(&mut self) {
        self.messages += 1;
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Copy systems we have not seen, merge the ones we have.
    ///
    /// Returns false if any merged system skipped a unit.
    #[instrument(name = "scenario_merge", skip_all, fields(systems = other.systems.len()))]
    pub fn merge_in(&mut self, other: &Scenario) -> bool {
        let mut clean = true;
        for (id, theirs) in &other.systems {
            match self.systems.get_mut(id) {
                None => {
                    self.systems.insert(*id, theirs.clone());
                }
                Some(ours) => {
                    let report = ours.merge_in(theirs);
                    if !report.skipped.is_empty() {
                        error!(system_id = id, skipped = report.skipped.len(), "merge skipped units");
                        clean = false;
                    }
                }
            }
        }
        self.messages += other.messages;
        if self.starttime_guess_us == 0 {
            self.starttime_guess_us = other.starttime_guess_us;
        }
        clean
    }

    /// Delay every system and the start-time guess by `delay_s`.
    pub fn shift_time(&mut self, delay_s: f64) {
        if delay_s == 0.0 {
            return;
        }
        for system in self.systems.values_mut() {
            system.shift_time(delay_s);
        }
        if self.starttime_guess_us != 0 {
            self.starttime_guess_us += secs_to_micros(delay_s);
        }
    }

    pub fn set_starttime_guess(&mut self, epoch_us: i64) {
        self.starttime_guess_us = epoch_us;
    }

    pub fn starttime_guess_us(&self) -> i64 {
        self.starttime_guess_us
    }

    /// Run every system's pipeline; with `calculate_time_offset`, seed the
    /// guess first and fix absolute time afterwards.
    ///
    /// A zero guess leaves each system's own guess in place.
    #[instrument(name = "scenario_process", skip(self), fields(systems = self.systems.len()))]
    pub fn process(&mut self, calculate_time_offset: bool) -> BTreeMap<SystemId, PipelineReport> {
        let mut reports = BTreeMap::new();
        for (id, system) in &mut self.systems {
            if calculate_time_offset {
                system.update_time_offset_guess(0, self.starttime_guess_us);
            }
            reports.insert(*id, system.postprocess());
            if calculate_time_offset {
                system.determine_absolute_time();
            }
        }
        reports
    }

    /// Earliest non-zero active begin across systems, in epoch µs; 0 if none.
    pub fn start_time_us(&self) -> i64 {
        self.systems
            .values()
            .map(|s| secs_to_micros(s.time_active_begin()))
            .filter(|&t| t > 0)
            .min()
            .unwrap_or(0)
    }

    pub fn overview(&self) -> String {
        let mut out = format!("SUMMARY:\nNumber of systems: {}\n\n", self.systems.len());
        for system in self.systems.values() {
            let _ = writeln!(out, "{}", system.summary_view());
        }
        let _ = writeln!(out, "Processed {} messages.", self.messages);
        out
    }
}
