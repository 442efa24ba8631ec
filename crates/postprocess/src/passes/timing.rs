//! Timing repair: respace periodic series with irregular timestamps.

use contracts::TelemetryError;
use datastore::DataClass;
use tracing::instrument;

use crate::pass::{PassContext, PassOutcome, PostprocessPass};

/// Suffix of the untouched copy kept for traceability.
pub const ORIGINAL_SUFFIX: &str = "_orig";

#[derive(Debug, Default, Clone, Copy)]
pub struct TimingRepair;

impl PostprocessPass for TimingRepair {
    fn name(&self) -> &'static str {
        "timing repair"
    }

    #[instrument(name = "pass_timing_repair", skip_all, fields(system_id = ctx.system_id))]
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError> {
        let min_samples = ctx.config.timing.min_samples;
        let max_deviation = ctx.config.timing.max_interval_deviation;

        // Decide on a snapshot of the index; the store grows while we repair.
        let candidates: Vec<_> = ctx
            .store
            .iter()
            .filter(|(_, unit)| unit.is_raw())
            .filter(|(_, unit)| {
                unit.as_timed()
                    .is_some_and(|t| t.has_bad_timestamps(min_samples, max_deviation))
            })
            .map(|(path, _)| path.clone())
            .collect();

        if candidates.is_empty() {
            return Ok(PassOutcome::Skipped {
                reason: "no series with bad timestamps".to_string(),
            });
        }

        let mut repaired = 0;
        for path in candidates {
            let Some(unit) = ctx.store.get(&path) else {
                continue;
            };
            let mut backup = unit.clone();
            backup.meta_mut().class = DataClass::Derived;
            if let Some(timed) = backup.as_timed_mut() {
                timed.set_expect_periodic(false);
            }
            let backup_path = path.with_basename(&format!("{}{ORIGINAL_SUFFIX}", path.basename()))?;
            ctx.store.register(backup_path, backup);

            if let Some(timed) = ctx.store.get_mut(&path).and_then(|u| u.as_timed_mut()) {
                timed.make_periodic();
                repaired += 1;
                ctx.log.info(format_args!("fixed timing of {path} (made periodic)"));
            }
        }

        Ok(PassOutcome::Completed { outputs: repaired })
    }
}
