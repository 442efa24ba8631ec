//! Human-readable multi-section summary of one system.

use std::fmt;

use contracts::secs_to_micros;
use datastore::{Interpolate, Parameter, Timeseries};
use postprocess::paths;
use time_sync::format_epoch_us;

use crate::System;

/// `3725.0` → `1h 02m 05s`; shorter spans drop the leading fields.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Borrowed view that renders [`System::summary`].
pub struct Summary<'a>(&'a System);

impl System {
    pub fn summary(&self) -> String {
        Summary(self).to_string()
    }

    pub fn summary_view(&self) -> Summary<'_> {
        Summary(self)
    }
}

impl Summary<'_> {
    fn series<T>(&self, path: &str) -> Option<&Timeseries<T>>
    where
        T: Interpolate,
        Timeseries<T>: datastore::UnitVariant,
    {
        self.0.store().typed::<Timeseries<T>>(path).filter(|s| !s.is_empty())
    }

    /// `min ... max units`, or nothing when the series is absent.
    fn range(&self, f: &mut fmt::Formatter<'_>, label: &str, path: &str, descending: bool) -> fmt::Result {
        let Some(series) = self.series::<f32>(path) else {
            return Ok(());
        };
        let (Some(lo), Some(hi)) = (series.min(), series.max()) else {
            return Ok(());
        };
        let (a, b) = if descending { (hi, lo) } else { (lo, hi) };
        let units = &series.meta().units;
        writeln!(f, " - {label}: {a:.2} {units} ... {b:.2} {units}")
    }

    /// Absolute time of a flight-book parameter stored in relative seconds.
    fn param_time(&self, path: &str) -> Option<String> {
        let param = self.0.store().typed::<Parameter<f64>>(path)?;
        let relative = *param.value()?;
        Some(format_epoch_us(
            param.meta().epoch_us + secs_to_micros(relative),
        ))
    }

    fn general(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sys = self.0;
        writeln!(f, "General:")?;
        writeln!(f, " - id: {}", sys.id())?;
        writeln!(f, " - type: {}", sys.vehicle_type())?;
        writeln!(f, " - autopilot: {}", sys.autopilot())?;
        writeln!(
            f,
            " - has been armed: {}",
            if sys.has_been_armed() { "yes" } else { "no" }
        )?;
        let begin = sys.time_active_begin();
        let end = sys.time_active_end();
        writeln!(
            f,
            " - active for {} between {} and {}",
            format_duration(end - begin),
            format_epoch_us(secs_to_micros(begin)),
            format_epoch_us(secs_to_micros(end))
        )
    }

    fn power(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nPower:")?;
        self.range(f, "battery voltage", paths::BATTERY_VOLTAGE, true)?;
        self.range(f, "battery current", paths::BATTERY_CURRENT, false)?;
        let store = self.0.store();
        if let Some(charge) = store.typed::<Timeseries<f32>>(paths::CUM_CHARGE).and_then(|s| s.last()) {
            writeln!(f, " - charge used: {:.3} Ah", charge.value)?;
        }
        if let Some(energy) = store
            .typed::<Timeseries<f32>>(paths::CUM_CONSUMPTION)
            .and_then(|s| s.last())
        {
            writeln!(f, " - energy used: {:.3} Wh", energy.value)?;
        }
        Ok(())
    }

    fn flightbook(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.0.store();
        let Some(flights) = store
            .typed::<Parameter<u32>>(paths::NUMBER_FLIGHTS)
            .and_then(|p| p.value().copied())
        else {
            return Ok(());
        };
        writeln!(f, "\nFlight Book:")?;
        if let Some(takeoff) = self.param_time(paths::FIRST_TAKEOFF) {
            writeln!(f, " - first takeoff: {takeoff}")?;
        }
        if let Some(landing) = self.param_time(paths::LAST_LANDING) {
            writeln!(f, " - last landing: {landing}")?;
        }
        writeln!(f, " - number of flights: {flights}")?;
        if let Some(total) = store
            .typed::<Parameter<f64>>(paths::TOTAL_FLIGHT_TIME)
            .and_then(|p| p.value().copied())
        {
            writeln!(f, " - total flight time: {}", format_duration(total))?;
        }
        Ok(())
    }

    fn performance(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nFlight performance:")?;
        self.range(f, "airspeed", "airstate/airspeed", false)?;
        self.range(f, "alt. MSL", "airstate/alt MSL", false)?;
        self.range(f, "climb rate", "airstate/climb", false)?;
        self.range(f, "throttle", paths::THROTTLE, false)
    }

    fn last_position(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.series::<f64>("airstate/lat").and_then(|s| s.last());
        let lon = self.series::<f64>("airstate/lon").and_then(|s| s.last());
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Ok(());
        };
        writeln!(f, "\nLast Position:")?;
        writeln!(f, " - lat: {:.6} deg", lat.value)?;
        writeln!(f, " - lon: {:.6} deg", lon.value)?;
        if let Some(alt) = self.series::<f32>(paths::ALTITUDE).and_then(|s| s.last()) {
            writeln!(f, " - re. alt: {:.1} m", alt.value)?;
        }
        Ok(())
    }

    fn computer(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(load) = self
            .series::<f32>("computer/autopilot_load")
            .and_then(Timeseries::max)
        {
            writeln!(f, "\nComputer:")?;
            writeln!(f, " - max. autopilot load: {load:.1} %")?;
        }
        Ok(())
    }

    fn link(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = &self.0.link;
        let ids = |set: &std::collections::BTreeSet<u32>| {
            set.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
        };
        writeln!(f, "\nMavLink:")?;
        writeln!(
            f,
            " - sent total: {} (IDs: {})",
            link.received,
            ids(&link.interpreted_ids)
        )?;
        if link.uninterpreted > 0 {
            writeln!(
                f,
                " - uninterpreted: {} (IDs: {})",
                link.uninterpreted,
                ids(&link.uninterpreted_ids)
            )?;
        }
        writeln!(
            f,
            " - errors: {} ({:.1} %)",
            link.errors,
            link.error_rate()
        )
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.general(f)?;
        self.power(f)?;
        self.flightbook(f)?;
        self.performance(f)?;
        self.last_position(f)?;
        self.computer(f)?;
        self.link(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EngineConfig, LinkOutcome};
    use observability::LogChannel;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(59.4), "59s");
        assert_eq!(format_duration(125.0), "2m 05s");
        assert_eq!(format_duration(3725.0), "1h 02m 05s");
        assert_eq!(format_duration(-3.0), "0s");
    }

    #[test]
    fn test_empty_system_summary() {
        let sys = System::new(7);
        let text = sys.summary();
        assert!(text.starts_with("General:\n - id: 7\n"));
        assert!(text.contains(" - type: unknown"));
        assert!(text.contains(" - has been armed: no"));
        assert!(text.contains("MavLink:\n - sent total: 0 (IDs: )"));
        assert!(!text.contains("Flight Book:"));
        assert!(!text.contains("Last Position:"));
    }

    #[test]
    fn test_summary_sections() {
        let mut sys = System::with_log(1, EngineConfig::default(), LogChannel::disabled("test"));
        sys.track_system(1, 3, contracts::mode_flags::ARMED, 0, 4);
        for k in 0..6i64 {
            sys.update_time(k * 1_000_000, false);
            let flying = (2..4).contains(&k);
            sys.track_sysperf(30.0 + k as f32, 12.6 - 0.1 * k as f32, 2.0);
            sys.track_flightperf(15.0, 14.0, 0.5, if flying { 50.0 } else { 0.0 });
            sys.track_position(47.0, 11.0, if flying { 5.0 } else { 0.0 }, 600.0, 90.0);
            sys.track_link(32, 0, LinkOutcome::Interpreted);
        }
        sys.track_link(8, 77, LinkOutcome::Uninterpreted);
        sys.postprocess();

        let text = sys.summary();
        assert!(text.contains(" - has been armed: yes"));
        assert!(text.contains(" - battery voltage: 12.60 V ... 12.10 V"));
        assert!(text.contains(" - number of flights: 1"));
        assert!(text.contains(" - total flight time: 2s"));
        assert!(text.contains(" - lat: 47.000000 deg"));
        assert!(text.contains(" - re. alt: 0.0 m"));
        assert!(text.contains(" - max. autopilot load: 35.0 %"));
        assert!(text.contains(" - sent total: 7 (IDs: 0)"));
        assert!(text.contains(" - uninterpreted: 1 (IDs: 77)"));
    }
}
