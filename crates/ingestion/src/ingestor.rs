//! Applies ingest events to a [`Scenario`].

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use contracts::{secs_to_micros, EngineConfig, IngestEvent, IngestPayload};
use tracing::{debug, instrument, warn};
use vehicle::Scenario;

use crate::error::Result;
use crate::reader::RecordReader;
use crate::stats::{IngestionStats, StatsSnapshot};

/// Feeds decoded events into one scenario.
///
/// Malformed lines are counted and skipped unless the ingestor is strict.
#[derive(Debug)]
pub struct Ingestor {
    scenario: Scenario,
    stats: Arc<IngestionStats>,
    strict: bool,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scenario: Scenario::with_config(config),
            stats: Arc::new(IngestionStats::new()),
            strict: false,
        }
    }

    /// Fail on the first malformed line instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Shared counters, readable while ingestion runs.
    pub fn stats(&self) -> Arc<IngestionStats> {
        Arc::clone(&self.stats)
    }

    pub fn finish(self) -> (Scenario, StatsSnapshot) {
        let snapshot = self.stats.snapshot();
        (self.scenario, snapshot)
    }

    /// Apply one event to the system it addresses.
    pub fn apply(&mut self, event: &IngestEvent) {
        self.stats.record_event();
        metrics::counter!("telemetry_ingest_events_total", "event" => event.payload.name())
            .increment(1);
        self.scenario.note_message();

        let stats = &self.stats;
        let system = self.scenario.system_or_insert(event.system);
        match &event.payload {
            IngestPayload::Time {
                relative_us,
                allow_jumps,
            } => {
                if !system.update_time(*relative_us, *allow_jumps).is_accepted() {
                    stats.record_rejected_time();
                }
            }
            IngestPayload::Reference {
                relative_us,
                absolute_us,
            } => {
                stats.record_reference();
                if !system
                    .update_time_offset(*relative_us, *absolute_us, false)
                    .is_accepted()
                {
                    stats.record_rejected_time();
                }
            }
            IngestPayload::Guess {
                relative_us,
                epoch_us,
            } => system.update_time_offset_guess(*relative_us, *epoch_us),
            IngestPayload::Stamp { timestamp_us } => {
                if system.is_absolute_time(*timestamp_us) {
                    let now_us = secs_to_micros(system.time_s());
                    stats.record_reference();
                    system.update_time_offset(now_us, *timestamp_us, false);
                } else {
                    system.update_time(*timestamp_us, true);
                }
            }
            IngestPayload::Link {
                bytes,
                msgid,
                outcome,
            } => system.track_link(*bytes, *msgid, *outcome),
            IngestPayload::Track { record } => {
                stats.record_tracked();
                system.track(record);
            }
        }
    }

    /// Apply every event from a line reader.
    pub fn ingest<R: BufRead>(&mut self, reader: RecordReader<R>) -> Result<()> {
        for item in reader {
            match item {
                Ok(event) => self.apply(&event),
                Err(e) if e.is_parse() && !self.strict => {
                    self.stats.record_parse_error();
                    warn!(error = %e, "skipping malformed line");
                }
                Err(e) => {
                    if e.is_parse() {
                        self.stats.record_parse_error();
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    #[instrument(name = "ingest_path", skip(self), fields(path = %path.display()))]
    pub fn ingest_path(&mut self, path: &Path) -> Result<()> {
        let reader = RecordReader::open(path)?;
        self.ingest(reader)?;
        let snapshot = self.stats.snapshot();
        debug!(
            events = snapshot.events,
            parse_errors = snapshot.parse_errors,
            systems = self.scenario.len(),
            "input loaded"
        );
        Ok(())
    }
}

/// Load one input file into a fresh scenario.
pub fn load_path(
    path: &Path,
    config: EngineConfig,
    strict: bool,
) -> Result<(Scenario, StatsSnapshot)> {
    let mut ingestor = Ingestor::new(config).strict(strict);
    ingestor.ingest_path(path)?;
    Ok(ingestor.finish())
}
