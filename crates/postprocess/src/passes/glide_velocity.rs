//! Glide performance from velocities: wind reconstruction and glide ratio.
//!
//! Inputs are located by name pattern so that differently named sources
//! (onboard logs, telemetry) feed the same computation. Every input is
//! optional on its own; the pass computes whatever its inputs allow and
//! reports the rest as missing.

use contracts::{GlideConfig, TelemetryError};
use datastore::Timeseries;
use nalgebra::Vector2;
use tracing::instrument;

use crate::pass::{pattern, PassContext, PassOutcome, PostprocessPass};
use crate::paths::{self, patterns};

#[derive(Debug, Default, Clone, Copy)]
pub struct GlideVelocityBased;

/// Bounds a sample must satisfy to count as quasi-steady flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyFlightFilter {
    pub speed_min: f64,
    pub pitch_max_deg: f64,
    pub roll_max_deg: f64,
    pub accx_max: f64,
}

impl From<&GlideConfig> for SteadyFlightFilter {
    fn from(config: &GlideConfig) -> Self {
        Self {
            speed_min: config.speed_min,
            pitch_max_deg: config.pitch_max_deg,
            roll_max_deg: config.roll_max_deg,
            accx_max: config.accx_max,
        }
    }
}

impl SteadyFlightFilter {
    pub fn admits(&self, airspeed: f64, pitch_deg: f64, roll_deg: f64, accx: f64) -> bool {
        airspeed > self.speed_min
            && pitch_deg.abs() < self.pitch_max_deg
            && roll_deg.abs() < self.roll_max_deg
            && accx.abs() < self.accx_max
    }
}

/// Glide ratio corrected for bank angle.
pub fn glide_ratio(airspeed: f64, sink: f64, roll_deg: f64) -> f64 {
    (airspeed / sink) / roll_deg.abs().to_radians().cos()
}

fn angle360(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn unit_heading(rad: f64) -> Vector2<f64> {
    Vector2::new(rad.cos(), rad.sin())
}

/// Wind quantities derived at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    /// Direction the wind blows from, degrees in [0, 360)
    pub direction_deg: f64,
    pub speed: f64,
    /// Angle between heading and the wind origin, degrees in [0, 180]
    pub relative_deg: f64,
    /// Positive when the wind slows the vehicle down
    pub head_wind: f64,
}

/// Reconstruct wind from its east/north components and the vehicle yaw (deg).
pub fn wind_at(wind_east: f64, wind_north: f64, yaw_deg: f64) -> WindSample {
    let velocity = Vector2::new(wind_east, wind_north);
    let direction_deg = angle360((-wind_east).atan2(-wind_north).to_degrees());
    let speed = velocity.norm();

    let yaw = angle360(yaw_deg).to_radians();
    let towards = angle360(direction_deg - 180.0).to_radians();
    let relative = unit_heading(towards).angle(&unit_heading(yaw));

    WindSample {
        direction_deg,
        speed,
        relative_deg: relative.to_degrees(),
        head_wind: -relative.cos() * speed,
    }
}

type Found = Option<(String, Timeseries<f32>)>;

fn find_first(ctx: &PassContext<'_>, sources: &[&str]) -> Result<Found, TelemetryError> {
    for source in sources {
        let re = pattern(source)?;
        if let Some((path, series)) = ctx.find_raw_series(&re) {
            return Ok(Some((path.to_string(), series.clone())));
        }
    }
    Ok(None)
}

fn varies_more_than(series: &Timeseries<f32>, spread: f64) -> bool {
    match (series.min(), series.max()) {
        (Some(lo), Some(hi)) => f64::from(hi) - f64::from(lo) > spread,
        _ => false,
    }
}

/// Ground speed magnitude from east/north velocity, on the east time axis.
fn fuse_groundspeed(east: &Timeseries<f32>, north: &Timeseries<f32>) -> Timeseries<f32> {
    let mut out = Timeseries::derived("groundspeed", "m/s");
    for sample in east.samples() {
        if let Some(n) = north.data_at_time(sample.time) {
            let speed = Vector2::new(f64::from(sample.value), f64::from(n)).norm();
            out.add_elem(speed as f32, sample.time);
        }
    }
    out.meta_mut().epoch_us = east.meta().epoch_us;
    out
}

struct Inputs {
    roll: Found,
    pitch: Found,
    accx: Found,
    sink: Found,
    airspeed: Found,
    groundspeed: Option<Timeseries<f32>>,
    fused_groundspeed: bool,
    wind: Option<(Timeseries<f32>, Timeseries<f32>, Timeseries<f32>)>,
}

struct WindSeries {
    direction: Timeseries<f32>,
    speed: Timeseries<f32>,
    relative: Timeseries<f32>,
    head_wind: Timeseries<f32>,
    airspeed_estimate: Option<Timeseries<f32>>,
}

fn wind_series(
    east: &Timeseries<f32>,
    north: &Timeseries<f32>,
    yaw: &Timeseries<f32>,
    groundspeed: Option<&Timeseries<f32>>,
) -> WindSeries {
    let mut out = WindSeries {
        direction: Timeseries::derived("wind direction", "deg"),
        speed: Timeseries::derived("wind speed", "m/s"),
        relative: Timeseries::derived("relative wind angle", "deg"),
        head_wind: Timeseries::derived("head wind", "m/s"),
        airspeed_estimate: groundspeed.map(|_| Timeseries::derived("airspeed estimate", "m/s")),
    };
    for sample in east.samples() {
        let t = sample.time;
        let (Some(wn), Some(yaw_deg)) = (north.data_at_time(t), yaw.data_at_time(t)) else {
            continue;
        };
        let wind = wind_at(f64::from(sample.value), f64::from(wn), f64::from(yaw_deg));
        out.direction.add_elem(wind.direction_deg as f32, t);
        out.speed.add_elem(wind.speed as f32, t);
        out.relative.add_elem(wind.relative_deg as f32, t);
        out.head_wind.add_elem(wind.head_wind as f32, t);
        if let (Some(estimate), Some(gs)) = (out.airspeed_estimate.as_mut(), groundspeed) {
            if let Some(ground) = gs.data_at_time(t) {
                estimate.add_elem((f64::from(ground) + wind.head_wind) as f32, t);
            }
        }
    }

    let epoch_us = east.meta().epoch_us;
    for series in [
        &mut out.direction,
        &mut out.speed,
        &mut out.relative,
        &mut out.head_wind,
    ] {
        series.meta_mut().epoch_us = epoch_us;
    }
    if let Some(estimate) = out.airspeed_estimate.as_mut() {
        estimate.meta_mut().epoch_us = epoch_us;
    }
    out
}

impl GlideVelocityBased {
    fn collect_inputs(&self, ctx: &PassContext<'_>) -> Result<Inputs, TelemetryError> {
        let speed_min = ctx.config.glide.speed_min;

        let wind = match (
            find_first(ctx, &[patterns::WIND_EAST])?,
            find_first(ctx, &[patterns::WIND_NORTH])?,
            find_first(ctx, &[patterns::YAW])?,
        ) {
            (Some((_, e)), Some((_, n)), Some((_, y))) => Some((e, n, y)),
            _ => None,
        };

        let mut airspeed = find_first(ctx, &[patterns::TRUE_AIRSPEED, patterns::AIRSPEED_FALLBACK])?;
        if let Some((path, series)) = &airspeed {
            if !varies_more_than(series, speed_min) {
                ctx.log.warn(format_args!(
                    "airspeed {path} found but does not vary; not using it"
                ));
                airspeed = None;
            }
        }

        let velocity = (
            find_first(ctx, &[patterns::VELOCITY_EAST])?,
            find_first(ctx, &[patterns::VELOCITY_NORTH])?,
        );
        let (groundspeed, fused_groundspeed) = match velocity {
            (Some((_, east)), Some((_, north))) => (Some(fuse_groundspeed(&east, &north)), true),
            _ => {
                let mut found =
                    find_first(ctx, &[patterns::GPS_SPEED, patterns::GROUNDSPEED_FALLBACK])?;
                if let Some((path, series)) = &found {
                    if !varies_more_than(series, speed_min) {
                        ctx.log.warn(format_args!(
                            "groundspeed {path} found but does not vary; not using it"
                        ));
                        found = None;
                    }
                }
                (found.map(|(_, series)| series), false)
            }
        };

        Ok(Inputs {
            roll: find_first(ctx, &[patterns::ROLL])?,
            pitch: find_first(ctx, &[patterns::PITCH])?,
            accx: find_first(ctx, &[patterns::ACC_X])?,
            sink: find_first(ctx, &[patterns::SINK_RATE, patterns::SINK_RATE_FALLBACK])?,
            airspeed,
            groundspeed,
            fused_groundspeed,
            wind,
        })
    }
}

impl PostprocessPass for GlideVelocityBased {
    fn name(&self) -> &'static str {
        "glide performance (velocity)"
    }

    #[instrument(name = "pass_glide_velocity", skip_all, fields(system_id = ctx.system_id))]
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError> {
        let inputs = self.collect_inputs(ctx)?;
        let mut missing = Vec::new();
        let mut outputs = 0;

        for (label, found) in [
            ("roll", &inputs.roll),
            ("pitch", &inputs.pitch),
            ("accx", &inputs.accx),
            ("sink rate", &inputs.sink),
            ("airspeed", &inputs.airspeed),
        ] {
            match found {
                Some((path, _)) => ctx.log.info(format_args!("using {label} from {path}")),
                None => missing.push(label.to_string()),
            }
        }
        if inputs.groundspeed.is_none() {
            missing.push("groundspeed".to_string());
        }
        if inputs.wind.is_none() {
            ctx.log.info("no wind estimate available");
            missing.push("wind".to_string());
        }

        let wind = inputs.wind.as_ref().map(|(east, north, yaw)| {
            wind_series(east, north, yaw, inputs.groundspeed.as_ref())
        });

        if inputs.fused_groundspeed {
            if let Some(groundspeed) = inputs.groundspeed.clone() {
                ctx.publish(paths::FUSED_GROUNDSPEED, groundspeed)?;
                outputs += 1;
            }
        }

        let airspeed_source = inputs
            .airspeed
            .as_ref()
            .map(|(_, series)| series)
            .or_else(|| wind.as_ref().and_then(|w| w.airspeed_estimate.as_ref()))
            .or(inputs.groundspeed.as_ref());

        let ratio = match (
            airspeed_source,
            &inputs.pitch,
            &inputs.roll,
            &inputs.sink,
            &inputs.accx,
        ) {
            (Some(speed), Some((_, pitch)), Some((_, roll)), Some((_, sink)), Some((_, accx))) => {
                let filter = SteadyFlightFilter::from(&ctx.config.glide);
                let mut ratio = Timeseries::derived("glide ratio", "");
                let mut best: Option<(f64, f64)> = None;
                for sample in sink.samples() {
                    let t = sample.time;
                    let sink_rate = f64::from(sample.value);
                    if sink_rate <= 0.0 {
                        continue;
                    }
                    let (Some(v), Some(p), Some(r), Some(a)) = (
                        speed.data_at_time(t),
                        pitch.data_at_time(t),
                        roll.data_at_time(t),
                        accx.data_at_time(t),
                    ) else {
                        continue;
                    };
                    let (v, p, r, a) = (f64::from(v), f64::from(p), f64::from(r), f64::from(a));
                    if !filter.admits(v, p, r, a) {
                        continue;
                    }
                    let value = glide_ratio(v, sink_rate, r);
                    ratio.add_elem(value as f32, t);
                    if best.map_or(true, |(max, _)| value > max) {
                        best = Some((value, v));
                    }
                }
                ratio.meta_mut().epoch_us = sink.meta().epoch_us;

                let mut smoothed = Timeseries::derived("glide ratio 5sec avg", "");
                ratio.moving_average(&mut smoothed, ctx.config.glide.smoothing_window_s);
                smoothed.meta_mut().epoch_us = ratio.meta().epoch_us;

                match best {
                    Some((max, at_speed)) => ctx.log.info(format_args!(
                        "max glide ratio {max:.1} at {at_speed:.1} m/s"
                    )),
                    None => ctx.log.info("no quasi-steady samples for glide ratio"),
                }
                Some((ratio, smoothed))
            }
            _ => {
                ctx.log.warn("glide ratio not computed: missing inputs");
                None
            }
        };

        if let Some(wind) = wind {
            ctx.publish(paths::WIND_DIRECTION, wind.direction)?;
            ctx.publish(paths::WIND_SPEED, wind.speed)?;
            ctx.publish(paths::RELATIVE_WIND_ANGLE, wind.relative)?;
            ctx.publish(paths::HEAD_WIND, wind.head_wind)?;
            outputs += 4;
            if let Some(estimate) = wind.airspeed_estimate {
                ctx.publish(paths::AIRSPEED_ESTIMATE, estimate)?;
                outputs += 1;
            }
        }
        let have_ratio = ratio.is_some();
        if let Some((ratio, smoothed)) = ratio {
            ctx.publish(paths::GLIDE_RATIO, ratio)?;
            ctx.publish(paths::GLIDE_RATIO_SMOOTHED, smoothed)?;
            outputs += 2;
        }

        if outputs == 0 {
            return Err(TelemetryError::missing_prerequisite(
                self.name(),
                missing.join(", "),
            ));
        }
        if !have_ratio {
            ctx.log.error(format_args!(
                "glide performance incomplete, missing: {}",
                missing.join(", ")
            ));
        }
        if missing.is_empty() {
            Ok(PassOutcome::Completed { outputs })
        } else {
            Ok(PassOutcome::Degraded { outputs, missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DataPath, EngineConfig};
    use datastore::HierarchyStore;
    use observability::LogChannel;

    fn constant(value: f32, times: &[f64]) -> Timeseries<f32> {
        let mut ts = Timeseries::new("x", "");
        for t in times {
            ts.add_elem(value, *t);
        }
        ts
    }

    fn put(store: &mut HierarchyStore, path: &str, series: Timeseries<f32>) {
        store.register(DataPath::parse(path).unwrap(), series.into());
    }

    fn glide_store(roll_deg: f32) -> HierarchyStore {
        let times = [0.0, 1.0, 2.0];
        let mut store = HierarchyStore::new();
        let mut airspeed = constant(10.0, &times);
        airspeed.add_elem(20.0, 3.0);
        put(&mut store, "onboard log/ARSP/TrueSpeed", airspeed);
        put(&mut store, "onboard log/ATT/Roll", constant(roll_deg, &times));
        put(&mut store, "onboard log/ATT/Pitch", constant(0.0, &times));
        put(&mut store, "onboard log/IMU/AccX", constant(0.1, &times));
        put(&mut store, "onboard log/NKF1/VD", constant(1.0, &times));
        store
    }

    #[test]
    fn test_wind_from_north() {
        // wind blowing towards the south comes from the north
        let wind = wind_at(0.0, -5.0, 0.0);
        assert!(wind.direction_deg.abs() < 1e-9);
        assert!((wind.speed - 5.0).abs() < 1e-9);
        // heading north into it
        assert!((wind.relative_deg - 180.0).abs() < 1e-9);
        assert!((wind.head_wind - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_tail_wind_is_negative() {
        let wind = wind_at(0.0, 5.0, 0.0);
        assert!((wind.direction_deg - 180.0).abs() < 1e-9);
        assert!((wind.head_wind + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_bounds() {
        let filter = SteadyFlightFilter::from(&GlideConfig::default());
        assert!(filter.admits(10.0, 5.0, 30.0, 0.5));
        assert!(!filter.admits(4.0, 5.0, 30.0, 0.5));
        assert!(!filter.admits(10.0, 25.0, 30.0, 0.5));
        assert!(!filter.admits(10.0, 5.0, -60.0, 0.5));
        assert!(!filter.admits(10.0, 5.0, 30.0, 2.5));
    }

    #[test]
    fn test_ratio_corrects_for_bank() {
        assert!((glide_ratio(10.0, 1.0, 0.0) - 10.0).abs() < 1e-12);
        assert!((glide_ratio(10.0, 1.0, 60.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_glide_ratio() {
        let mut store = glide_store(0.0);
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let outcome = GlideVelocityBased
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap();
        assert_eq!(outcome.label(), "degraded");

        let ratio = store.typed::<Timeseries<f32>>(paths::GLIDE_RATIO).unwrap();
        assert_eq!(ratio.len(), 3);
        assert!((ratio.samples()[0].value - 10.0).abs() < 1e-5);
        assert!(store.contains(paths::GLIDE_RATIO_SMOOTHED));
        assert!(!store.contains(paths::WIND_DIRECTION));
    }

    #[test]
    fn test_steep_bank_never_contributes() {
        let mut store = glide_store(60.0);
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        GlideVelocityBased
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap();
        let ratio = store.typed::<Timeseries<f32>>(paths::GLIDE_RATIO).unwrap();
        assert!(ratio.is_empty());
    }

    #[test]
    fn test_wind_without_glide_inputs() {
        let times = [0.0, 1.0];
        let mut store = HierarchyStore::new();
        put(&mut store, "onboard log/NKF2/VWE", constant(0.0, &times));
        put(&mut store, "onboard log/NKF2/VWN", constant(-5.0, &times));
        put(&mut store, "onboard log/ATT/Yaw", constant(0.0, &times));
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let outcome = GlideVelocityBased
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap();
        match outcome {
            PassOutcome::Degraded { outputs, missing } => {
                assert_eq!(outputs, 4);
                assert!(missing.contains(&"sink rate".to_string()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(store.contains(paths::HEAD_WIND));
        assert!(!store.contains(paths::AIRSPEED_ESTIMATE));
    }

    #[test]
    fn test_nothing_found_skips() {
        let mut store = HierarchyStore::new();
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let err = GlideVelocityBased
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn test_groundspeed_fused_from_velocities() {
        let times = [0.0, 1.0];
        let mut store = HierarchyStore::new();
        put(&mut store, "onboard log/NKF1/VE", constant(3.0, &times));
        put(&mut store, "onboard log/NKF1/VN", constant(4.0, &times));
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        GlideVelocityBased
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap();
        let fused = store
            .typed::<Timeseries<f32>>(paths::FUSED_GROUNDSPEED)
            .unwrap();
        assert!((fused.samples()[0].value - 5.0).abs() < 1e-6);
    }
}
