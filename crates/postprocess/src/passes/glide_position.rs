//! Glide performance from local position: horizontal distance travelled.

use contracts::TelemetryError;
use datastore::Timeseries;
use nalgebra::Vector2;
use tracing::instrument;

use crate::pass::{pattern, PassContext, PassOutcome, PostprocessPass};
use crate::paths::{self, patterns};

#[derive(Debug, Default, Clone, Copy)]
pub struct GlidePositionBased;

/// Cumulative horizontal distance along north/east position.
///
/// Steps follow the north samples; east is interpolated at the same times.
pub fn horizontal_distance(north: &Timeseries<f32>, east: &Timeseries<f32>) -> Timeseries<f32> {
    let mut out = Timeseries::derived("cum. horz. dist.", "m");
    let mut travelled = 0.0;
    let mut previous: Option<Vector2<f64>> = None;
    for sample in north.samples() {
        let Some(e) = east.data_at_time(sample.time) else {
            continue;
        };
        let here = Vector2::new(f64::from(sample.value), f64::from(e));
        if let Some(before) = previous {
            travelled += (here - before).norm();
            out.add_elem(travelled as f32, sample.time);
        }
        previous = Some(here);
    }
    out
}

impl PostprocessPass for GlidePositionBased {
    fn name(&self) -> &'static str {
        "glide performance (position)"
    }

    #[instrument(name = "pass_glide_position", skip_all, fields(system_id = ctx.system_id))]
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError> {
        let north_re = pattern(patterns::POSITION_NORTH)?;
        let east_re = pattern(patterns::POSITION_EAST)?;
        let down_re = pattern(patterns::POSITION_DOWN)?;

        let distance = {
            let north = ctx.find_raw_series(&north_re);
            let east = ctx.find_raw_series(&east_re);
            let down = ctx.find_raw_series(&down_re);
            let (Some((_, north)), Some((_, east)), Some(_)) = (north, east, down) else {
                return Err(TelemetryError::missing_prerequisite(
                    self.name(),
                    "position north/east/down",
                ));
            };
            let mut distance = horizontal_distance(north, east);
            distance.meta_mut().epoch_us = north.meta().epoch_us;
            distance
        };

        let total = distance.last().map_or(0.0, |s| s.value);
        ctx.publish(paths::CUM_HORIZONTAL_DISTANCE, distance)?;
        ctx.log.info(format_args!("horizontal distance travelled: {total:.0} m"));
        Ok(PassOutcome::Completed { outputs: 1 })
    }
}
