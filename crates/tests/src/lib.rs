//! # Integration Tests
//!
//! 跨 crate 的集成测试。
//!
//! 负责：
//! - 时间同步性质（跳变拒绝、偏移估计、活动区间）
//! - 后处理场景（飞行记录、功率积分、滑翔过滤、时序修复）
//! - 合并与克隆的往返性质
//! - JSON lines 输入的端到端加载

#[cfg(test)]
mod support {
    use contracts::EngineConfig;
    use observability::LogChannel;
    use vehicle::System;

    pub fn quiet_system(id: u32) -> System {
        System::with_log(id, EngineConfig::default(), LogChannel::disabled("test"))
    }

    pub fn at(sys: &mut System, t_s: f64) {
        sys.update_time((t_s * 1e6).round() as i64, false);
    }
}

#[cfg(test)]
mod time_tests {
    use super::support::{at, quiet_system};

    #[test]
    fn test_backward_jump_rejected_unless_allowed() {
        let mut sys = quiet_system(1);
        sys.update_time(100_000_000, false);
        assert_eq!(sys.time_s(), 100.0);

        assert!(!sys.update_time(50_000_000, false).is_accepted());
        assert_eq!(sys.time_s(), 100.0);

        assert!(sys.update_time(50_000_000, true).is_accepted());
        assert_eq!(sys.time_s(), 50.0);
    }

    #[test]
    fn test_offset_is_mean_of_reference_pairs() {
        let mut sys = quiet_system(1);
        sys.update_time_offset(0, 1000, false);
        sys.update_time_offset(10_000_000, 1_011_000_000, false);
        let estimate = sys.determine_absolute_time();
        assert_eq!(estimate.offset_us, 500_500_500);
        assert_eq!(sys.time_offset_us(), 500_500_500);
    }

    #[test]
    fn test_offset_applies_to_every_unit() {
        let mut sys = quiet_system(1);
        at(&mut sys, 0.0);
        sys.track_sysperf(10.0, 12.0, 1.0);
        sys.track_velocity(1.0, 0.0, 0.0);
        sys.update_time_offset(0, 1_600_000_000_000_000, false);
        sys.determine_absolute_time();
        for (path, unit) in sys.store().iter() {
            assert_eq!(unit.meta().epoch_us, 1_600_000_000_000_000, "{path}");
        }
    }

    #[test]
    fn test_active_span_ordered_and_growing() {
        let mut sys = quiet_system(1);
        let mut last = (f64::MIN, f64::MIN);
        for k in 0..10 {
            at(&mut sys, k as f64 * 0.5);
            sys.track_sysperf(10.0, 12.0, 1.0);
            let (begin, end) = (sys.time_active_begin(), sys.time_active_end());
            assert!(begin <= end);
            assert!(begin >= last.0);
            assert!(end >= last.1);
            last = (begin, end);
        }
        assert_eq!(sys.time_active_end() - sys.time_active_begin(), 4.5);
    }
}

#[cfg(test)]
mod postprocess_tests {
    use datastore::{Parameter, Timeseries};
    use postprocess::paths;

    use super::support::{at, quiet_system};

    #[test]
    fn test_flightbook_single_flight() {
        let mut sys = quiet_system(1);
        let altitude = [0.0, 0.0, 5.0, 5.0, 0.0, 0.0];
        let throttle = [0.0, 0.0, 50.0, 50.0, 0.0, 0.0];
        for (k, (alt, thr)) in altitude.iter().zip(throttle).enumerate() {
            at(&mut sys, k as f64);
            sys.track_position(47.0, 11.0, *alt, 500.0 + alt, 0.0);
            sys.track_flightperf(0.0, 0.0, 0.0, thr);
        }
        sys.postprocess();

        let store = sys.store();
        let flights = store.typed::<Parameter<u32>>(paths::NUMBER_FLIGHTS).unwrap();
        assert_eq!(flights.value(), Some(&1));
        let takeoff = store.typed::<Parameter<f64>>(paths::FIRST_TAKEOFF).unwrap();
        assert_eq!(takeoff.value(), Some(&2.0));
        let landing = store.typed::<Parameter<f64>>(paths::LAST_LANDING).unwrap();
        assert_eq!(landing.value(), Some(&4.0));
        let total = store.typed::<Parameter<f64>>(paths::TOTAL_FLIGHT_TIME).unwrap();
        assert!((total.value().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_integration_is_exact_on_constant_segment() {
        let mut sys = quiet_system(1);
        at(&mut sys, 0.0);
        sys.track_sysperf(10.0, 12.0, 2.0);
        at(&mut sys, 10.0);
        sys.track_sysperf(10.0, 12.0, 2.0);
        sys.postprocess();

        let store = sys.store();
        let charge = store.typed::<Timeseries<f32>>(paths::CUM_CHARGE).unwrap();
        let energy = store.typed::<Timeseries<f32>>(paths::CUM_CONSUMPTION).unwrap();
        let expected_ah = 2.0 * 10.0 / 3600.0;
        let expected_wh = 24.0 * 10.0 / 3600.0;
        assert!((f64::from(charge.last().unwrap().value) - expected_ah).abs() < 1e-6);
        assert!((f64::from(energy.last().unwrap().value) - expected_wh).abs() < 1e-5);
    }

    fn glide_inputs(roll_deg: f64) -> vehicle::System {
        let mut sys = quiet_system(1);
        for k in 0..4 {
            at(&mut sys, k as f64);
            let airspeed = if k == 3 { 20.0 } else { 10.0 };
            sys.track_generic("ARSP", "TrueSpeed", airspeed, false);
            sys.track_generic("ATT", "Roll", roll_deg, false);
            sys.track_generic("ATT", "Pitch", 0.0, false);
            sys.track_generic("IMU", "AccX", 0.1, false);
            sys.track_generic("NKF1", "VD", 1.0, false);
        }
        sys
    }

    #[test]
    fn test_glide_ratio_level_flight() {
        let mut sys = glide_inputs(0.0);
        sys.postprocess();
        let ratio = sys
            .store()
            .typed::<Timeseries<f32>>(paths::GLIDE_RATIO)
            .unwrap();
        assert!(!ratio.is_empty());
        assert!((ratio.samples()[0].value - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_glide_ratio_excludes_steep_bank() {
        let mut sys = glide_inputs(60.0);
        sys.postprocess();
        let ratio = sys
            .store()
            .typed::<Timeseries<f32>>(paths::GLIDE_RATIO)
            .unwrap();
        assert!(ratio.is_empty());
    }

    #[test]
    fn test_timing_repair_on_periodic_log_field() {
        let mut sys = quiet_system(1);
        for (k, t) in [0.0, 0.1, 0.2, 0.9, 1.0].into_iter().enumerate() {
            at(&mut sys, t);
            sys.track_generic("GPS", "Spd", k as f64, true);
        }
        sys.postprocess();

        let store = sys.store();
        let fixed = store
            .typed::<Timeseries<f32>>("onboard log/GPS/Spd")
            .unwrap();
        assert!((fixed.samples()[1].time - 0.25).abs() < 1e-9);
        let original = store
            .typed::<Timeseries<f32>>("onboard log/GPS/Spd_orig")
            .unwrap();
        assert!((original.samples()[1].time - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let mut sys = quiet_system(1);
        for k in 0..6 {
            at(&mut sys, k as f64);
            sys.track_sysperf(20.0, 12.0 - 0.1 * k as f32, 2.0);
            sys.track_position(47.0, 11.0, if k % 5 == 0 { 0.0 } else { 10.0 }, 600.0, 0.0);
            sys.track_flightperf(12.0, 11.0, 0.0, 40.0);
        }
        sys.postprocess();
        let first = sys.store().clone();
        sys.postprocess();
        assert_eq!(
            sys.store().iter().collect::<Vec<_>>(),
            first.iter().collect::<Vec<_>>()
        );
    }
}

#[cfg(test)]
mod store_tests {
    use contracts::DataPath;
    use datastore::{HierarchyStore, Timeseries};

    fn series(values: &[f32]) -> Timeseries<f32> {
        let mut ts = Timeseries::new("x", "");
        for (i, v) in values.iter().enumerate() {
            ts.add_elem(*v, i as f64);
        }
        ts
    }

    #[test]
    fn test_tree_and_index_stay_consistent() {
        let mut store = HierarchyStore::new();
        let paths = [
            "airstate/lat",
            "airstate/lon",
            "airstate/angles/roll",
            "airstate/angles/pitch",
            "power/battery_voltage",
            "onboard log/GPS/Spd",
        ];
        for path in paths {
            store.register(DataPath::parse(path).unwrap(), series(&[1.0]).into());
            store.check_consistency().unwrap();
        }
        assert_eq!(store.len(), paths.len());

        store.unregister("airstate/angles/roll");
        store.unregister("airstate/angles/pitch");
        store.unregister("onboard log/GPS/Spd");
        store.check_consistency().unwrap();
        assert!(store.group("airstate/angles").is_none());
        assert!(store.group("onboard log").is_none());
        assert!(store.group("airstate").is_some());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut store = HierarchyStore::new();
        let path = DataPath::parse("power/power").unwrap();
        store.register(path.clone(), series(&[1.0]).into());
        let previous = store.register(path, series(&[1.0, 2.0]).into());
        assert!(previous.is_some());
        assert_eq!(store.get("power/power").unwrap().len(), 2);
        store.check_consistency().unwrap();
    }
}

#[cfg(test)]
mod merge_tests {
    use std::collections::BTreeMap;

    use datastore::DataUnit;
    use vehicle::Scenario;

    use super::support::{at, quiet_system};

    fn raw_units(sys: &vehicle::System) -> BTreeMap<String, DataUnit> {
        sys.store()
            .iter()
            .filter(|(_, unit)| unit.is_raw())
            .map(|(path, unit)| (path.to_string(), unit.clone()))
            .collect()
    }

    #[test]
    fn test_merging_a_clone_is_noop() {
        let mut sys = quiet_system(1);
        for k in 0..5 {
            at(&mut sys, k as f64);
            sys.track_sysperf(20.0, 12.0, 1.5);
            sys.track_velocity(k as f32, 0.0, 0.0);
            sys.track_statustext(6, "ok");
        }
        sys.postprocess();
        let before = raw_units(&sys);

        let copy = sys.clone();
        let report = sys.merge_in(&copy);
        assert!(report.skipped.is_empty());
        assert_eq!(raw_units(&sys), before);
    }

    #[test]
    fn test_scenario_shift_then_merge() {
        let mut first = Scenario::new();
        let sys = first.system_or_insert(1);
        sys.update_time_offset(0, 1_000_000_000, false);
        sys.track_velocity(1.0, 0.0, 0.0);

        let mut second = Scenario::new();
        let sys = second.system_or_insert(1);
        sys.update_time_offset(1_000_000, 1_001_000_000, false);
        sys.track_velocity(2.0, 0.0, 0.0);
        second.system_or_insert(9);
        second.shift_time(5.0);

        assert!(first.merge_in(&second));
        assert_eq!(first.len(), 2);
        let merged = first.system(1).unwrap();
        // pairs (0, 1e9) and (1e6 - 5e6, 1.001e9)
        assert_eq!(merged.time_offset_us(), 1_002_500_000);
        let vx = merged
            .store()
            .typed::<datastore::Timeseries<f32>>("airstate/speed/vx")
            .unwrap();
        assert_eq!(vx.len(), 2);
        assert_eq!(vx.last().unwrap().value, 2.0);
    }
}

#[cfg(test)]
mod ingestion_tests {
    use std::io::Write;

    use contracts::EngineConfig;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_jsonl_flight_to_overview() {
        let mut lines = vec![
            r#"{"event": "track", "record": {"kind": "heartbeat", "vehicle_type": 1, "autopilot": 3, "base_mode": 128, "custom_mode": 0, "system_status": 4}}"#.to_string(),
            r#"{"event": "reference", "relative_us": 0, "absolute_us": 1397144486000000}"#.to_string(),
        ];
        for (k, (alt, thr)) in [(0.0, 0.0), (0.0, 0.0), (5.0, 50.0), (5.0, 50.0), (0.0, 0.0), (0.0, 0.0)]
            .into_iter()
            .enumerate()
        {
            lines.push(format!(
                r#"{{"event": "time", "relative_us": {}}}"#,
                k as i64 * 1_000_000
            ));
            lines.push(format!(
                r#"{{"event": "track", "record": {{"kind": "position", "lat": 47.0, "lon": 11.0, "alt_gnd": {alt}, "alt_msl": 600.0, "heading_deg": 90.0}}}}"#
            ));
            lines.push(format!(
                r#"{{"event": "track", "record": {{"kind": "flight_perf", "airspeed": 12.0, "groundspeed": 11.0, "climb": 0.0, "throttle": {thr}}}}}"#
            ));
            lines.push(r#"{"event": "link", "bytes": 40, "msgid": 33, "outcome": "interpreted"}"#.to_string());
        }
        lines.push("# trailing comment".to_string());
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let file = write_lines(&refs);

        let (mut scenario, stats) =
            ingestion::load_path(file.path(), EngineConfig::default(), true).unwrap();
        assert_eq!(stats.parse_errors, 0);
        assert_eq!(stats.events as usize, refs.len() - 1);

        scenario.process(true);
        let sys = scenario.system(1).unwrap();
        assert_eq!(sys.time_offset_us(), 1_397_144_486_000_000);
        assert!(sys.has_been_armed());

        let text = scenario.overview();
        assert!(text.contains("Number of systems: 1"));
        assert!(text.contains(" - type: fixed wing"));
        assert!(text.contains(" - number of flights: 1"));
        assert!(text.contains(" - sent total: 6 (IDs: 33)"));
        assert!(text.contains("2014-04-10"));
    }

    #[test]
    fn test_lenient_load_counts_bad_lines() {
        let file = write_lines(&[
            r#"{"event": "time", "relative_us": 0}"#,
            r#"{"event": "teleport"}"#,
            r#"{"event": "time", "relative_us": 1000000}"#,
        ]);
        let (_, stats) = ingestion::load_path(file.path(), EngineConfig::default(), false).unwrap();
        assert_eq!(stats.events, 2);
        assert_eq!(stats.parse_errors, 1);
    }

    #[test]
    fn test_config_file_drives_jump_threshold() {
        let mut config_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(config_file, "[time]\nmax_forward_jump_s = 1.0").unwrap();
        let config = config_loader::ConfigLoader::load_from_path(config_file.path()).unwrap();

        let input = write_lines(&[
            r#"{"event": "time", "relative_us": 0}"#,
            r#"{"event": "time", "relative_us": 5000000}"#,
        ]);
        let (_, stats) = ingestion::load_path(input.path(), config, true).unwrap();
        assert_eq!(stats.rejected_time_updates, 1);
    }
}
