//! Power statistics: electric power, charge and energy drawn from the battery.

use contracts::TelemetryError;
use datastore::Timeseries;
use tracing::instrument;

use crate::pass::{PassContext, PassOutcome, PostprocessPass};
use crate::paths;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct PowerStatistics;

/// Trapezoidal integration between consecutive samples.
///
/// Returns `(time, step area, running total / divisor)` per input sample; the
/// first sample integrates to zero.
pub fn integrate(series: &Timeseries<f32>, divisor: f64) -> Vec<(f64, f64, f64)> {
    let mut out = Vec::with_capacity(series.len());
    let mut total = 0.0;
    let mut previous: Option<(f64, f64)> = None;
    for sample in series.samples() {
        let value = f64::from(sample.value);
        let step = match previous {
            Some((t0, v0)) => (value + v0) / 2.0 * (sample.time - t0),
            None => 0.0,
        };
        total += step / divisor;
        out.push((sample.time, step, total));
        previous = Some((sample.time, value));
    }
    out
}

fn series_from(name: &str, units: &str, points: impl Iterator<Item = (f64, f64)>) -> Timeseries<f32> {
    let mut ts = Timeseries::derived(name, units);
    for (time, value) in points {
        ts.add_elem(value as f32, time);
    }
    ts
}

impl PostprocessPass for PowerStatistics {
    fn name(&self) -> &'static str {
        "power statistics"
    }

    #[instrument(name = "pass_power", skip_all, fields(system_id = ctx.system_id))]
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError> {
        let (mut power, mut inst_charge, mut cum_charge, epoch_us) = {
            let voltage = ctx.require_series(self.name(), paths::BATTERY_VOLTAGE)?;
            let current = ctx.require_series(self.name(), paths::BATTERY_CURRENT)?;
            if voltage.meta().epoch_us != current.meta().epoch_us {
                return Err(TelemetryError::unsynced_baselines(
                    self.name(),
                    paths::BATTERY_VOLTAGE,
                    paths::BATTERY_CURRENT,
                ));
            }

            let power = series_from(
                "power",
                "W",
                voltage.samples().iter().filter_map(|v| {
                    current
                        .data_at_time(v.time)
                        .map(|i| (v.time, f64::from(v.value) * f64::from(i)))
                }),
            );

            let charge = integrate(current, SECONDS_PER_HOUR);
            let inst_charge = series_from(
                "inst. charge",
                "As",
                charge.iter().map(|(t, step, _)| (*t, *step)),
            );
            let cum_charge = series_from(
                "cum. charge",
                "Ah",
                charge.iter().map(|(t, _, total)| (*t, *total)),
            );
            (power, inst_charge, cum_charge, voltage.meta().epoch_us)
        };

        let energy = integrate(&power, SECONDS_PER_HOUR);
        let mut inst_consumption = series_from(
            "inst. consumption",
            "Ws",
            energy.iter().map(|(t, step, _)| (*t, *step)),
        );
        let mut cum_consumption = series_from(
            "cum. consumption",
            "Wh",
            energy.iter().map(|(t, _, total)| (*t, *total)),
        );

        for meta in [
            power.meta_mut(),
            inst_charge.meta_mut(),
            cum_charge.meta_mut(),
            inst_consumption.meta_mut(),
            cum_consumption.meta_mut(),
        ] {
            meta.epoch_us = epoch_us;
        }

        let total_wh = energy.last().map_or(0.0, |(_, _, total)| *total);
        let total_ah = cum_charge.last().map_or(0.0, |s| f64::from(s.value));

        ctx.publish(paths::POWER, power)?;
        ctx.publish(paths::INST_CHARGE, inst_charge)?;
        ctx.publish(paths::CUM_CHARGE, cum_charge)?;
        ctx.publish(paths::INST_CONSUMPTION, inst_consumption)?;
        ctx.publish(paths::CUM_CONSUMPTION, cum_consumption)?;

        ctx.log.info(format_args!(
            "power statistics done: {total_ah:.3} Ah, {total_wh:.3} Wh"
        ));
        Ok(PassOutcome::Completed { outputs: 5 })
    }
}
