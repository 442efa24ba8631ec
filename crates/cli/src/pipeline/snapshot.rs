//! Read-only JSON view of a processed scenario.

use contracts::{LinkSummary, SystemId};
use datastore::{DataClass, UnitKind};
use ingestion::StatsSnapshot;
use serde::Serialize;
use vehicle::{Scenario, System};

use crate::pipeline::stats::{PassLine, RunStats};

#[derive(Debug, Serialize)]
pub struct UnitEntry {
    pub path: String,
    pub kind: UnitKind,
    pub class: DataClass,
    pub units: String,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_s: Option<(f64, f64)>,
}

#[derive(Debug, Serialize)]
pub struct SystemSnapshot {
    pub id: SystemId,
    pub vehicle_type: String,
    pub autopilot: String,
    pub has_been_armed: bool,
    pub time_offset_us: i64,
    pub active_begin_s: f64,
    pub active_end_s: f64,
    pub link: LinkSummary,
    pub units: Vec<UnitEntry>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioSnapshot {
    pub start_time_us: i64,
    pub messages: u64,
    pub systems: Vec<SystemSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest: Option<StatsSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub passes: Vec<PassLine>,
}

impl UnitEntry {
    pub fn list(system: &System) -> Vec<UnitEntry> {
        system
            .store()
            .iter()
            .map(|(path, unit)| UnitEntry {
                path: path.to_string(),
                kind: unit.kind(),
                class: unit.class(),
                units: unit.meta().units.clone(),
                samples: unit.len(),
                span_s: unit.time_span(),
            })
            .collect()
    }
}

impl SystemSnapshot {
    pub fn of(system: &System) -> Self {
        Self {
            id: system.id(),
            vehicle_type: system.vehicle_type().to_string(),
            autopilot: system.autopilot().to_string(),
            has_been_armed: system.has_been_armed(),
            time_offset_us: system.time_offset_us(),
            active_begin_s: system.time_active_begin(),
            active_end_s: system.time_active_end(),
            link: system.link_stats(),
            units: UnitEntry::list(system),
        }
    }
}

impl ScenarioSnapshot {
    pub fn of(scenario: &Scenario) -> Self {
        Self {
            start_time_us: scenario.start_time_us(),
            messages: scenario.messages(),
            systems: scenario.systems().map(SystemSnapshot::of).collect(),
            ingest: None,
            passes: Vec::new(),
        }
    }

    pub fn with_stats(mut self, stats: &RunStats) -> Self {
        self.ingest = Some(stats.ingest);
        self.passes = stats.pass_lines();
        self
    }
}
