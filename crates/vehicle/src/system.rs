//! One tracked vehicle: its data, clock, offsets and link counters.

use contracts::{
    micros_to_secs, AutopilotType, EngineConfig, LinkSummary, OffsetEstimate, SystemId,
    TimeJump, VehicleType,
};
use datastore::{DataUnit, HierarchyStore};
use observability::{record_merge, record_time_jump, record_unit_count, LogChannel};
use postprocess::{Pipeline, PipelineReport};
use serde::Serialize;
use time_sync::{format_epoch_us, ClockTracker, JumpThresholds, OffsetEstimator};
use tracing::instrument;

/// What `merge_in` did, unit by unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Units unioned into an existing non-empty unit
    pub merged: usize,
    /// Units absent here and copied over
    pub copied: usize,
    /// Empty placeholders replaced by the incoming unit
    pub replaced: usize,
    /// Units skipped because the representations differ
    pub skipped: Vec<String>,
    /// Pipeline results, present when anything changed
    pub pipeline: Option<PipelineReport>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        self.merged + self.copied + self.replaced > 0
    }
}

/// Complete telemetry state of one vehicle.
///
/// A `System` is owned by one thread at a time; nothing in it is shared.
#[derive(Debug)]
pub struct System {
    pub(crate) id: SystemId,
    pub(crate) vehicle_code: Option<u8>,
    pub(crate) autopilot_code: Option<u8>,
    pub(crate) has_been_armed: bool,
    pub(crate) clock: ClockTracker,
    pub(crate) offsets: OffsetEstimator,
    pub(crate) offset_us: i64,
    pub(crate) link: LinkSummary,
    pub(crate) store: HierarchyStore,
    pub(crate) config: EngineConfig,
    pub(crate) pipeline: Pipeline,
    pub(crate) log: LogChannel,
}

impl Clone for System {
    /// Deep copy with a fresh log channel.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            vehicle_code: self.vehicle_code,
            autopilot_code: self.autopilot_code,
            has_been_armed: self.has_been_armed,
            clock: self.clock.clone(),
            offsets: self.offsets.clone(),
            offset_us: self.offset_us,
            link: self.link.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            pipeline: self.pipeline.clone(),
            log: LogChannel::for_system(self.id),
        }
    }
}

impl System {
    pub fn new(id: SystemId) -> Self {
        Self::with_config(id, EngineConfig::default())
    }

    pub fn with_config(id: SystemId, config: EngineConfig) -> Self {
        Self::with_log(id, config, LogChannel::for_system(id))
    }

    /// Construct with an injected log channel.
    pub fn with_log(id: SystemId, config: EngineConfig, log: LogChannel) -> Self {
        Self {
            id,
            vehicle_code: None,
            autopilot_code: None,
            has_been_armed: false,
            clock: ClockTracker::new(JumpThresholds::from(config.time)),
            offsets: OffsetEstimator::new(),
            offset_us: 0,
            link: LinkSummary::default(),
            store: HierarchyStore::new(),
            config,
            pipeline: Pipeline::standard(),
            log,
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_code
            .map_or(VehicleType::Unknown, VehicleType::from_code)
    }

    pub fn autopilot(&self) -> AutopilotType {
        self.autopilot_code
            .map_or(AutopilotType::Unknown, AutopilotType::from_code)
    }

    pub fn has_been_armed(&self) -> bool {
        self.has_been_armed
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &ClockTracker {
        &self.clock
    }

    pub fn log(&self) -> &LogChannel {
        &self.log
    }

    /// Current relative time (s).
    pub fn time_s(&self) -> f64 {
        self.clock.time_s()
    }

    /// Offset applied by the last `determine_absolute_time`.
    pub fn time_offset_us(&self) -> i64 {
        self.offset_us
    }

    /// Exact or pattern lookup; an invalid pattern finds nothing.
    pub fn find(&self, query: &str, is_pattern: bool) -> Option<&DataUnit> {
        match self.store.find(query, is_pattern) {
            Ok(found) => found.map(|(_, unit)| unit),
            Err(e) => {
                self.log.warn(e);
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // time
    // ------------------------------------------------------------------

    /// Advance the relative clock. Rejected jumps change nothing.
    pub fn update_time(&mut self, relative_us: i64, allow_jumps: bool) -> TimeJump {
        let jump = self.clock.update(relative_us, allow_jumps);
        match jump {
            TimeJump::Accepted => {}
            TimeJump::Backward { diff_s } => {
                self.log.warn(format_args!(
                    "#{} ignoring timestamp that is too old: {diff_s:.3} s",
                    self.id
                ));
                record_time_jump(self.id, jump.as_str());
            }
            TimeJump::Forward { diff_s } => {
                self.log.warn(format_args!(
                    "#{} ignoring timestamp that fast-forwarded by {diff_s:.3} s",
                    self.id
                ));
                record_time_jump(self.id, jump.as_str());
            }
        }
        jump
    }

    /// Advance the clock and record a reference pair if `absolute_us > 0`.
    pub fn update_time_offset(
        &mut self,
        relative_us: i64,
        absolute_us: i64,
        allow_jumps: bool,
    ) -> TimeJump {
        let jump = self.update_time(relative_us, allow_jumps);
        self.offsets.add_reference(relative_us, absolute_us);
        jump
    }

    pub fn update_time_offset_guess(&mut self, relative_us: i64, epoch_us: i64) {
        self.offsets.update_guess(relative_us, epoch_us);
    }

    pub fn is_absolute_time(&self, timestamp_us: i64) -> bool {
        time_sync::is_absolute_time(timestamp_us)
    }

    pub fn set_max_time_jumps(&mut self, forward_s: f64, backward_s: f64) {
        self.clock.set_thresholds(JumpThresholds {
            forward_s,
            backward_s,
        });
    }

    /// Move every reference pair and the guess by `delay_s`.
    pub fn shift_time(&mut self, delay_s: f64) {
        self.offsets.shift(delay_s);
    }

    /// Fix the absolute offset and apply it to every unit.
    pub fn determine_absolute_time(&mut self) -> OffsetEstimate {
        let estimate = self.offsets.determine();
        if estimate.is_speculative() {
            self.log.warn(format_args!(
                "(#{}): no time reference in the data; making a guess: {}",
                self.id,
                format_epoch_us(estimate.offset_us)
            ));
        }
        self.offset_us = estimate.offset_us;
        for unit in self.store.units_mut() {
            unit.meta_mut().epoch_us = estimate.offset_us;
        }
        estimate
    }

    /// Earliest data in epoch seconds.
    pub fn time_active_begin(&self) -> f64 {
        self.data_span()
            .map(|(begin, _)| begin)
            .unwrap_or_else(|| self.clock.min_s() + micros_to_secs(self.offset_us))
    }

    /// Latest data in epoch seconds.
    pub fn time_active_end(&self) -> f64 {
        self.data_span()
            .map(|(_, end)| end)
            .unwrap_or_else(|| self.clock.max_s() + micros_to_secs(self.offset_us))
    }

    fn data_span(&self) -> Option<(f64, f64)> {
        self.store
            .iter()
            .filter_map(|(_, unit)| {
                let (first, last) = unit.time_span()?;
                let epoch_s = micros_to_secs(unit.meta().epoch_us);
                Some((epoch_s + first, epoch_s + last))
            })
            .reduce(|(b0, e0), (b1, e1)| (b0.min(b1), e0.max(e1)))
    }

    // ------------------------------------------------------------------
    // analysis and merge
    // ------------------------------------------------------------------

    /// Run the pipeline on this system's data.
    #[instrument(name = "system_postprocess", skip(self), fields(system_id = self.id))]
    pub fn postprocess(&mut self) -> PipelineReport {
        let report = self
            .pipeline
            .run(self.id, &mut self.store, &self.config, &self.log);
        record_unit_count(self.id, self.store.len());
        report
    }

    /// Union `other` into `self`, then recompute derived data and time.
    #[instrument(name = "system_merge", skip_all, fields(system_id = self.id, other = other.id))]
    pub fn merge_in(&mut self, other: &System) -> MergeReport {
        let mut report = MergeReport::default();

        for (path, incoming) in other.store.iter() {
            match self.store.get_mut(path) {
                None => {
                    self.store.register(path.clone(), incoming.clone());
                    report.copied += 1;
                }
                Some(existing) if existing.is_empty() => {
                    self.store.register(path.clone(), incoming.clone());
                    report.replaced += 1;
                }
                Some(existing) => match existing.merge_in(incoming) {
                    Ok(()) => report.merged += 1,
                    Err(e) => {
                        self.log.warn(format_args!(
                            "skipped data {path} because it could not be merged: {e}"
                        ));
                        report.skipped.push(path.to_string());
                    }
                },
            }
        }

        self.clock.extend_span(&other.clock);
        self.offsets.absorb(&other.offsets);
        self.link.absorb(&other.link);
        self.has_been_armed |= other.has_been_armed;
        if self.vehicle_code.is_none() {
            self.vehicle_code = other.vehicle_code;
            self.autopilot_code = other.autopilot_code;
        }

        record_merge(
            report.merged,
            report.copied,
            report.replaced,
            report.skipped.len(),
        );
        if report.changed() {
            report.pipeline = Some(self.postprocess());
            self.determine_absolute_time();
        }
        report
    }

    /// Snapshot of the link counters.
    pub fn link_stats(&self) -> LinkSummary {
        self.link.clone()
    }
}
