//! Flight-book extraction: takeoffs, landings, flight count and time.

use contracts::TelemetryError;
use datastore::{Event, Parameter, Timeseries};
use tracing::instrument;

use crate::pass::{PassContext, PassOutcome, PostprocessPass};
use crate::paths;

pub const TAKEOFF: &str = "takeoff";
pub const LANDING: &str = "landing";

#[derive(Debug, Default, Clone, Copy)]
pub struct Flightbook;

/// Result of walking one altitude series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightLog {
    /// (time, "takeoff" | "landing")
    pub transitions: Vec<(f64, &'static str)>,
    pub flights: u32,
    /// Summed duration of completed flights (s)
    pub flight_time_s: f64,
    pub first_takeoff_s: f64,
    pub last_landing_s: f64,
}

/// Walk altitude in time order, interpolating throttle at each altitude sample.
///
/// Flying means altitude above `min_altitude` and throttle above `min_throttle`.
pub fn extract_flights(
    altitude: &Timeseries<f32>,
    throttle: &Timeseries<f32>,
    min_altitude: f64,
    min_throttle: f64,
) -> FlightLog {
    let mut log = FlightLog::default();
    let mut flying = false;
    let mut takeoff_at = 0.0;

    for sample in altitude.samples() {
        let Some(throttle_now) = throttle.data_at_time(sample.time) else {
            continue;
        };
        let seems_flying = f64::from(sample.value) > min_altitude && f64::from(throttle_now) > min_throttle;

        if seems_flying && !flying {
            flying = true;
            log.transitions.push((sample.time, TAKEOFF));
            log.flights += 1;
            if log.flights == 1 {
                log.first_takeoff_s = sample.time;
            }
            takeoff_at = sample.time;
        } else if !seems_flying && flying {
            flying = false;
            log.transitions.push((sample.time, LANDING));
            log.last_landing_s = sample.time;
            log.flight_time_s += sample.time - takeoff_at;
        }
    }
    log
}

impl PostprocessPass for Flightbook {
    fn name(&self) -> &'static str {
        "flight-book"
    }

    #[instrument(name = "pass_flightbook", skip_all, fields(system_id = ctx.system_id))]
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<PassOutcome, TelemetryError> {
        let (log, epoch_us) = {
            let altitude = ctx.require_series(self.name(), paths::ALTITUDE)?;
            let throttle = ctx.require_series(self.name(), paths::THROTTLE)?;
            if altitude.meta().epoch_us != throttle.meta().epoch_us {
                return Err(TelemetryError::unsynced_baselines(
                    self.name(),
                    paths::ALTITUDE,
                    paths::THROTTLE,
                ));
            }
            let config = &ctx.config.flightbook;
            (
                extract_flights(
                    altitude,
                    throttle,
                    config.min_altitude_m,
                    config.min_throttle_percent,
                ),
                altitude.meta().epoch_us,
            )
        };

        let mut events = Event::<String>::derived("takeoff_landing", "");
        for (time, what) in &log.transitions {
            events.add_elem(what.to_string(), *time);
        }
        let mut flights = Parameter::<u32>::derived("number flights", "");
        flights.set(log.flights);
        let mut flight_time = Parameter::<f64>::derived("total flight time", "s");
        flight_time.set(log.flight_time_s);
        let mut first_takeoff = Parameter::<f64>::derived("first takeoff", "s");
        first_takeoff.set(log.first_takeoff_s);
        let mut last_landing = Parameter::<f64>::derived("last landing", "s");
        last_landing.set(log.last_landing_s);

        events.meta_mut().epoch_us = epoch_us;
        flights.meta_mut().epoch_us = epoch_us;
        flight_time.meta_mut().epoch_us = epoch_us;
        first_takeoff.meta_mut().epoch_us = epoch_us;
        last_landing.meta_mut().epoch_us = epoch_us;

        ctx.publish(paths::TAKEOFF_LANDING, events)?;
        ctx.publish(paths::NUMBER_FLIGHTS, flights)?;
        ctx.publish(paths::TOTAL_FLIGHT_TIME, flight_time)?;
        ctx.publish(paths::FIRST_TAKEOFF, first_takeoff)?;
        ctx.publish(paths::LAST_LANDING, last_landing)?;

        ctx.log.info(format_args!(
            "flight-book: {} flight(s), {:.1} s in the air",
            log.flights, log.flight_time_s
        ));
        Ok(PassOutcome::Completed { outputs: 5 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DataPath, EngineConfig};
    use datastore::HierarchyStore;
    use observability::LogChannel;

    fn series(values: &[f32]) -> Timeseries<f32> {
        let mut ts = Timeseries::new("x", "");
        for (i, v) in values.iter().enumerate() {
            ts.add_elem(*v, i as f64);
        }
        ts
    }

    #[test]
    fn test_single_flight() {
        let alt = series(&[0.0, 0.0, 5.0, 5.0, 0.0, 0.0]);
        let thr = series(&[0.0, 0.0, 50.0, 50.0, 0.0, 0.0]);
        let log = extract_flights(&alt, &thr, 1.0, 20.0);
        assert_eq!(log.flights, 1);
        assert_eq!(log.transitions, vec![(2.0, TAKEOFF), (4.0, LANDING)]);
        assert!((log.flight_time_s - 2.0).abs() < 1e-12);
        assert_eq!(log.first_takeoff_s, 2.0);
        assert_eq!(log.last_landing_s, 4.0);
    }

    #[test]
    fn test_high_altitude_without_throttle_is_not_flying() {
        let alt = series(&[0.0, 50.0, 50.0, 0.0]);
        let thr = series(&[0.0, 10.0, 10.0, 0.0]);
        let log = extract_flights(&alt, &thr, 1.0, 20.0);
        assert_eq!(log.flights, 0);
        assert!(log.transitions.is_empty());
    }

    #[test]
    fn test_pass_writes_outputs() {
        let mut store = HierarchyStore::new();
        store.register(
            DataPath::parse(paths::ALTITUDE).unwrap(),
            series(&[0.0, 0.0, 5.0, 5.0, 0.0, 0.0]).into(),
        );
        store.register(
            DataPath::parse(paths::THROTTLE).unwrap(),
            series(&[0.0, 0.0, 50.0, 50.0, 0.0, 0.0]).into(),
        );
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let outcome = Flightbook
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap();
        assert_eq!(outcome.label(), "completed");

        let flights = store.typed::<Parameter<u32>>(paths::NUMBER_FLIGHTS).unwrap();
        assert_eq!(flights.value(), Some(&1));
        let events = store.typed::<Event<String>>(paths::TAKEOFF_LANDING).unwrap();
        assert_eq!(events.len(), 2);
        assert!(!store.get(paths::TAKEOFF_LANDING).unwrap().is_raw());
    }

    #[test]
    fn test_unsynced_baselines_abort() {
        let mut store = HierarchyStore::new();
        let alt = series(&[0.0, 5.0]);
        let mut thr = series(&[0.0, 50.0]);
        thr.meta_mut().epoch_us = 42;
        store.register(DataPath::parse(paths::ALTITUDE).unwrap(), alt.into());
        store.register(DataPath::parse(paths::THROTTLE).unwrap(), thr.into());
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let err = Flightbook
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap_err();
        assert!(matches!(err, TelemetryError::UnsyncedBaselines { .. }));
        assert!(store.get(paths::NUMBER_FLIGHTS).is_none());
    }

    #[test]
    fn test_missing_throttle_skips() {
        let mut store = HierarchyStore::new();
        store.register(
            DataPath::parse(paths::ALTITUDE).unwrap(),
            series(&[0.0]).into(),
        );
        let config = EngineConfig::default();
        let log = LogChannel::disabled("test");
        let err = Flightbook
            .run(&mut PassContext::new(1, &mut store, &config, &log))
            .unwrap_err();
        assert!(err.is_skip());
    }
}
