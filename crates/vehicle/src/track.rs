//! Typed track operations: decoded telemetry appended at the current time.
//!
//! Every operation writes to fixed paths. A path held by a unit of another
//! representation is reported on the log channel and the sample is skipped.

use contracts::{
    mode_flags, system_state_name, DataPath, LinkOutcome, TelemetryError, TelemetryRecord,
};
use datastore::{Event, Interpolate, TimedUnit, Timeseries, UnitVariant};
use observability::{record_link_message, record_tracked};
use postprocess::paths;

use crate::System;

const MILLI: f32 = 1000.0;

impl System {
    fn series_mut<T>(&mut self, path: &str, units: &str) -> Option<&mut Timeseries<T>>
    where
        T: Interpolate,
        Timeseries<T>: UnitVariant,
    {
        let result = DataPath::parse(path)
            .and_then(|path| self.store.get_or_create::<Timeseries<T>>(&path, units));
        match result {
            Ok(series) => Some(series),
            Err(e) => {
                // only `store` is borrowed here
                self.log.error(format_args!("#{}: {e}", self.id));
                None
            }
        }
    }

    fn push<T>(&mut self, path: &str, units: &str, value: T)
    where
        T: Interpolate,
        Timeseries<T>: UnitVariant,
    {
        let time = self.clock.time_s();
        if let Some(series) = self.series_mut(path, units) {
            series.add_elem(value, time);
        }
    }

    fn events_mut(&mut self, path: &str, units: &str) -> Option<&mut Event<String>> {
        let result = DataPath::parse(path)
            .and_then(|path| self.store.get_or_create::<Event<String>>(&path, units));
        match result {
            Ok(events) => Some(events),
            Err(e) => {
                self.log.error(format_args!("#{}: {e}", self.id));
                None
            }
        }
    }

    /// Append `value` only if it differs from the latest entry.
    fn push_if_changed(&mut self, path: &str, value: &str) {
        let time = self.clock.time_s();
        if let Some(events) = self.events_mut(path, "") {
            events.add_if_changed(value.to_string(), time);
        }
    }

    /// Heartbeat: mode, state and arming.
    pub fn track_system(
        &mut self,
        vehicle_type: u8,
        autopilot: u8,
        base_mode: u8,
        custom_mode: u32,
        system_status: u8,
    ) {
        self.push("system/custom_mode", "autopilot-specific mode", custom_mode);
        self.push_if_changed("system/status", system_state_name(system_status));

        let flag = |mask: u8| base_mode & mask != 0;
        let armed = flag(mode_flags::ARMED);
        self.push_if_changed("mission/armed", if armed { "armed" } else { "disarmed" });
        self.push_if_changed(
            "mission/stabilized",
            if flag(mode_flags::STABILIZE) { "stabilized on" } else { "stabilized off" },
        );
        self.push_if_changed(
            "mission/guided",
            if flag(mode_flags::GUIDED) { "guided on" } else { "guided off" },
        );
        self.push_if_changed(
            "mission/manual",
            if flag(mode_flags::MANUAL) { "manual on" } else { "manual off" },
        );
        if armed {
            self.has_been_armed = true;
        }

        if self.vehicle_code.is_some_and(|code| code != vehicle_type) {
            self.log.warn(format_args!(
                "#{} changes type from {} to {}",
                self.id,
                self.vehicle_type(),
                contracts::VehicleType::from_code(vehicle_type)
            ));
        }
        if self.autopilot_code.is_some_and(|code| code != autopilot) {
            self.log.warn(format_args!(
                "#{} changes autopilot from {} to {}",
                self.id,
                self.autopilot(),
                contracts::AutopilotType::from_code(autopilot)
            ));
        }
        self.vehicle_code = Some(vehicle_type);
        self.autopilot_code = Some(autopilot);
    }

    /// Computer load and battery; battery values only when positive.
    pub fn track_sysperf(&mut self, load_percent: f32, voltage_v: f32, current_a: f32) {
        self.push("computer/autopilot_load", "%", load_percent);
        let time = self.clock.time_s();
        if let Some(voltage) = self.series_mut::<f32>(paths::BATTERY_VOLTAGE, "V") {
            if voltage_v > 0.0 {
                voltage.add_elem(voltage_v, time);
            }
        }
        if let Some(current) = self.series_mut::<f32>(paths::BATTERY_CURRENT, "A") {
            if current_a > 0.0 {
                current.add_elem(current_a, time);
            }
        }
    }

    pub fn track_ambient(&mut self, temperature_c: f32, static_pressure_hpa: f32) {
        self.push("environment/temperature", "deg C", temperature_c);
        self.push("environment/static pressure", "hPa", static_pressure_hpa);
    }

    pub fn track_flightperf(&mut self, airspeed: f32, groundspeed: f32, climb: f32, throttle: f32) {
        self.push("airstate/airspeed", "m/s", airspeed);
        self.push("airstate/groundspeed", "m/s", groundspeed);
        self.push("airstate/climb", "m/s", climb);
        self.push(paths::THROTTLE, "%", throttle);
    }

    /// Global position; headings outside [0, 360] are dropped.
    pub fn track_position(&mut self, lat: f64, lon: f64, alt_gnd: f32, alt_msl: f32, heading_deg: f32) {
        self.push("airstate/lat", "deg", lat);
        self.push("airstate/lon", "deg", lon);
        self.push(paths::ALTITUDE, "m", alt_gnd);
        self.push("airstate/alt MSL", "m", alt_msl);
        if (0.0..=360.0).contains(&heading_deg) {
            self.push("airstate/heading", "deg", heading_deg);
        } else {
            let e = TelemetryError::malformed_sample("airstate/heading", format!("{heading_deg} deg"));
            self.log.debug(e);
        }
    }

    /// Attitude and body rates in rad, stored in degrees.
    pub fn track_attitude(&mut self, rpy: [f32; 3], rates: [f32; 3]) {
        let [roll, pitch, yaw] = rpy;
        self.push("airstate/angles/roll", "deg", roll.to_degrees());
        self.push("airstate/angles/pitch", "deg", pitch.to_degrees());
        self.push("airstate/angles/yaw", "deg", yaw.to_degrees());
        let [p, q, r] = rates;
        self.push("airstate/rate/roll rate", "deg/s", p.to_degrees());
        self.push("airstate/rate/pitch rate", "deg/s", q.to_degrees());
        self.push("airstate/rate/yaw rate", "deg/s", r.to_degrees());
    }

    pub fn track_velocity(&mut self, vx: f32, vy: f32, vz: f32) {
        self.push("airstate/speed/vx", "m/s", vx);
        self.push("airstate/speed/vy", "m/s", vy);
        self.push("airstate/speed/vz", "m/s", vz);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn track_gps(
        &mut self,
        lat: f64,
        lon: f64,
        alt_wgs84: f32,
        hdop: f32,
        vdop: f32,
        ground_speed: f32,
        ground_course_deg: f32,
    ) {
        self.push("GPS/lat", "deg", lat);
        self.push("GPS/lon", "deg", lon);
        self.push("GPS/alt WGS84", "m", alt_wgs84);
        self.push("GPS/hdop", "m", hdop);
        self.push("GPS/vdop", "m", vdop);
        self.push("GPS/ground speed", "m/s", ground_speed);
        self.push("GPS/ground course", "deg", ground_course_deg);
    }

    /// Satellite count and fix; fix type 255 means unknown and is dropped.
    pub fn track_gps_status(&mut self, satellites: u32, fix_type: u8) {
        self.push("GPS/num sat", "", satellites);
        let time = self.clock.time_s();
        if let Some(fix) = self.series_mut::<u32>("GPS/fix type", "") {
            if fix_type < u8::MAX {
                fix.add_elem(u32::from(fix_type), time);
            }
        }
    }

    /// Scaled IMU: milli-g, mrad/s and mT converted to g, rad/s and T.
    pub fn track_imu(&mut self, index: u8, acc_mg: [f32; 3], gyro_mrad_s: [f32; 3], mag_mt: [f32; 3]) {
        let group = format!("IMU{index}");
        for (axis, k) in ["x", "y", "z"].iter().zip(0..3) {
            self.push(&format!("{group}/acc/acc {axis}"), "g", acc_mg[k] / MILLI);
            self.push(&format!("{group}/gyro/omg {axis}"), "rad/s", gyro_mrad_s[k] / MILLI);
            self.push(&format!("{group}/magnetic/mag {axis}"), "T", mag_mt[k] / MILLI);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn track_imu_highres(
        &mut self,
        acc: [f32; 3],
        gyro: [f32; 3],
        mag: [f32; 3],
        temperature_c: f32,
        abs_pressure_hpa: f32,
        diff_pressure_hpa: f32,
        pressure_alt: f32,
    ) {
        for (axis, k) in ["x", "y", "z"].iter().zip(0..3) {
            self.push(&format!("IMU-highres/acc/acc {axis}"), "m/s/s", acc[k]);
            self.push(&format!("IMU-highres/gyro/omg {axis}"), "rad/s", gyro[k]);
            self.push(&format!("IMU-highres/mag/field {axis}"), "G", mag[k]);
        }
        self.push("IMU-highres/temperature", "deg C", temperature_c);
        self.push("IMU-highres/pressure abs", "mbar", abs_pressure_hpa);
        self.push("IMU-highres/pressure diff", "mbar", diff_pressure_hpa);
        self.push("IMU-highres/pressure altitude", "m", pressure_alt);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn track_radio(
        &mut self,
        rssi: u8,
        remote_rssi: u8,
        noise: u8,
        remote_noise: u8,
        txbuf: u8,
        rx_errors: u32,
        fixed: u32,
    ) {
        self.push("radio/RSSI", "", u32::from(rssi));
        self.push("radio/remote RSSI", "", u32::from(remote_rssi));
        self.push("radio/noise", "", u32::from(noise));
        self.push("radio/remote noise", "", u32::from(remote_noise));
        self.push("radio/tx buffer", "%", u32::from(txbuf));
        self.push("radio/rx errors", "", rx_errors);
        self.push("radio/fixed rx errors", "", fixed);
    }

    pub fn track_radio_rssi(&mut self, rssi: u8) {
        self.push("radio/RSSI", "", u32::from(rssi));
    }

    pub fn track_radio_droprate(&mut self, drop_rate_percent: f32) {
        self.push("radio/overall drop rate", "%", drop_rate_percent);
    }

    pub fn track_power_rails(&mut self, vcc_v: f32, vservo_v: f32, flags: u32) {
        self.push("power/Vcc", "V", vcc_v);
        self.push("power/Vservo", "V", vservo_v);
        self.push("power/flags", "MAV_POWER_STATUS", flags);
    }

    pub fn track_rc(&mut self, channels: [u16; 8]) {
        for (k, value) in channels.iter().enumerate() {
            self.push(&format!("rc/channel_{}", k + 1), "us", u32::from(*value));
        }
    }

    pub fn track_actuators(&mut self, servos: [u16; 8]) {
        for (k, value) in servos.iter().enumerate() {
            self.push(&format!("actuators/servo_{}", k + 1), "us", u32::from(*value));
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn track_nav(
        &mut self,
        nav_roll: f32,
        nav_pitch: f32,
        nav_bearing: f32,
        target_bearing: f32,
        wp_dist: f32,
        alt_error: f32,
        aspd_error: f32,
        xtrack_error: f32,
    ) {
        self.push("navigation/nav roll", "deg", nav_roll);
        self.push("navigation/nav pitch", "deg", nav_pitch);
        self.push("navigation/nav bearing", "deg", nav_bearing);
        self.push("navigation/target bearing", "deg", target_bearing);
        self.push("navigation/dist waypoint", "m", wp_dist);
        self.push("navigation/error altitude", "m", alt_error);
        self.push("navigation/error airspeed", "m/s", aspd_error);
        self.push("navigation/error x-track", "m", xtrack_error);
    }

    pub fn track_mission_current(&mut self, seq: u32) {
        self.push("mission/current seq", "item id", seq);
    }

    pub fn track_mission_item(&mut self, seq: u32, command: u32, lat: f64, lon: f64, alt: f32) {
        self.push("mission/seq", "item id", seq);
        self.push("mission/command", "MAV_CMD", command);
        self.push("mission/x", "deg", lat);
        self.push("mission/y", "deg", lon);
        self.push("mission/z", "m", alt);
    }

    pub fn track_statustext(&mut self, severity: u8, text: &str) {
        let time = self.clock.time_s();
        if let Some(events) = self.events_mut("system/statustext", "string") {
            events.add_elem(text.to_string(), time);
        }
        self.push("system/statustext_severity", "", u32::from(severity));
    }

    pub fn track_system_sensors(&mut self, present: u32, enabled: u32, health: u32) {
        self.push("system/sensors present", "MAV_SYS_STATUS_SENSOR", present);
        self.push("system/sensors enabled", "MAV_SYS_STATUS_SENSOR", enabled);
        self.push("system/sensors health", "MAV_SYS_STATUS_SENSOR", health);
    }

    pub fn track_system_errors(&mut self, errors: [u32; 4]) {
        for (k, count) in errors.iter().enumerate() {
            self.push(&format!("system/error count #{}", k + 1), "", *count);
        }
    }

    /// Onboard-log field at `onboard log/<message>/<field>`.
    ///
    /// `periodic` marks the series as expected to be evenly spaced.
    pub fn track_generic(&mut self, message: &str, field: &str, value: f64, periodic: bool) {
        let path = format!("onboard log/{message}/{field}");
        let time = self.clock.time_s();
        if let Some(series) = self.series_mut::<f32>(&path, "") {
            series.add_elem(value as f32, time);
            if periodic {
                series.set_expect_periodic(true);
            }
        }
    }

    /// Count one received protocol message.
    ///
    /// Once the clock has seen an update, the bytes accumulated since the
    /// previous sample are appended to `radio/throughput`.
    pub fn track_link(&mut self, bytes: u64, msgid: u32, outcome: LinkOutcome) {
        self.link.record(bytes, msgid, outcome);
        record_link_message(outcome.as_str(), bytes);
        if self.clock.have_time_update() {
            let pending = self.link.take_pending();
            self.push("radio/throughput", "kbps", pending as f32 / 128.0);
        }
    }

    /// Dispatch a decoded record to its track operation.
    pub fn track(&mut self, record: &TelemetryRecord) {
        record_tracked(record.kind());
        match record {
            TelemetryRecord::Heartbeat {
                vehicle_type,
                autopilot,
                base_mode,
                custom_mode,
                system_status,
            } => self.track_system(*vehicle_type, *autopilot, *base_mode, *custom_mode, *system_status),
            TelemetryRecord::SysPerf {
                load_percent,
                voltage_v,
                current_a,
            } => self.track_sysperf(*load_percent, *voltage_v, *current_a),
            TelemetryRecord::Ambient {
                temperature_c,
                static_pressure_hpa,
            } => self.track_ambient(*temperature_c, *static_pressure_hpa),
            TelemetryRecord::FlightPerf {
                airspeed,
                groundspeed,
                climb,
                throttle,
            } => self.track_flightperf(*airspeed, *groundspeed, *climb, *throttle),
            TelemetryRecord::Position {
                lat,
                lon,
                alt_gnd,
                alt_msl,
                heading_deg,
            } => self.track_position(*lat, *lon, *alt_gnd, *alt_msl, *heading_deg),
            TelemetryRecord::Attitude {
                roll,
                pitch,
                yaw,
                roll_rate,
                pitch_rate,
                yaw_rate,
            } => self.track_attitude([*roll, *pitch, *yaw], [*roll_rate, *pitch_rate, *yaw_rate]),
            TelemetryRecord::Velocity { vx, vy, vz } => self.track_velocity(*vx, *vy, *vz),
            TelemetryRecord::Gps {
                lat,
                lon,
                alt_wgs84,
                hdop,
                vdop,
                ground_speed,
                ground_course_deg,
            } => self.track_gps(
                *lat,
                *lon,
                *alt_wgs84,
                *hdop,
                *vdop,
                *ground_speed,
                *ground_course_deg,
            ),
            TelemetryRecord::GpsStatus {
                satellites,
                fix_type,
            } => self.track_gps_status(*satellites, *fix_type),
            TelemetryRecord::Imu {
                index,
                acc_mg,
                gyro_mrad_s,
                mag_mt,
            } => self.track_imu(*index, *acc_mg, *gyro_mrad_s, *mag_mt),
            TelemetryRecord::ImuHighres {
                acc,
                gyro,
                mag,
                temperature_c,
                abs_pressure_hpa,
                diff_pressure_hpa,
                pressure_alt,
            } => self.track_imu_highres(
                *acc,
                *gyro,
                *mag,
                *temperature_c,
                *abs_pressure_hpa,
                *diff_pressure_hpa,
                *pressure_alt,
            ),
            TelemetryRecord::Radio {
                rssi,
                remote_rssi,
                noise,
                remote_noise,
                txbuf,
                rx_errors,
                fixed,
            } => self.track_radio(
                *rssi,
                *remote_rssi,
                *noise,
                *remote_noise,
                *txbuf,
                *rx_errors,
                *fixed,
            ),
            TelemetryRecord::RadioRssi { rssi } => self.track_radio_rssi(*rssi),
            TelemetryRecord::RadioDroprate { drop_rate_percent } => {
                self.track_radio_droprate(*drop_rate_percent)
            }
            TelemetryRecord::PowerRails {
                vcc_v,
                vservo_v,
                flags,
            } => self.track_power_rails(*vcc_v, *vservo_v, *flags),
            TelemetryRecord::Rc { channels } => self.track_rc(*channels),
            TelemetryRecord::Actuators { servos } => self.track_actuators(*servos),
            TelemetryRecord::Nav {
                nav_roll,
                nav_pitch,
                nav_bearing,
                target_bearing,
                wp_dist,
                alt_error,
                aspd_error,
                xtrack_error,
            } => self.track_nav(
                *nav_roll,
                *nav_pitch,
                *nav_bearing,
                *target_bearing,
                *wp_dist,
                *alt_error,
                *aspd_error,
                *xtrack_error,
            ),
            TelemetryRecord::MissionCurrent { seq } => self.track_mission_current(*seq),
            TelemetryRecord::MissionItem {
                seq,
                command,
                lat,
                lon,
                alt,
            } => self.track_mission_item(*seq, *command, *lat, *lon, *alt),
            TelemetryRecord::StatusText { severity, text } => self.track_statustext(*severity, text),
            TelemetryRecord::SystemSensors {
                present,
                enabled,
                health,
            } => self.track_system_sensors(*present, *enabled, *health),
            TelemetryRecord::SystemErrors { errors } => self.track_system_errors(*errors),
            TelemetryRecord::Generic {
                message,
                field,
                value,
                periodic,
            } => self.track_generic(message, field, *value, *periodic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::EngineConfig;
    use datastore::Parameter;
    use observability::LogChannel;

    fn system() -> System {
        System::with_log(1, EngineConfig::default(), LogChannel::disabled("test"))
    }

    #[test]
    fn test_heartbeat_edge_triggered() {
        let mut sys = system();
        sys.update_time(0, false);
        sys.track_system(1, 3, mode_flags::ARMED, 0, 4);
        sys.update_time(1_000_000, false);
        sys.track_system(1, 3, mode_flags::ARMED, 0, 4);
        sys.update_time(2_000_000, false);
        sys.track_system(1, 3, 0, 0, 4);

        let armed = sys.store().typed::<Event<String>>("mission/armed").unwrap();
        assert_eq!(armed.len(), 2);
        assert_eq!(armed.latest().map(String::as_str), Some("disarmed"));
        assert_eq!(
            sys.store().typed::<Timeseries<u32>>("system/custom_mode").unwrap().len(),
            3
        );
        assert!(sys.has_been_armed());
        assert_eq!(sys.vehicle_type().as_str(), "fixed wing");
        assert_eq!(sys.autopilot().as_str(), "ArduPilotMega");
    }

    #[test]
    fn test_type_change_warns() {
        let mut sys = system();
        sys.track_system(1, 3, 0, 0, 0);
        sys.track_system(2, 3, 0, 0, 0);
        assert_eq!(sys.log().warnings(), 1);
    }

    #[test]
    fn test_battery_only_when_positive() {
        let mut sys = system();
        sys.update_time(0, false);
        sys.track_sysperf(50.0, 0.0, -1.0);
        assert!(sys.store().get(paths::BATTERY_VOLTAGE).unwrap().is_empty());
        assert!(sys.store().get(paths::BATTERY_CURRENT).unwrap().is_empty());
        sys.track_sysperf(50.0, 12.0, 1.0);
        assert_eq!(sys.store().get(paths::BATTERY_VOLTAGE).unwrap().len(), 1);
    }

    #[test]
    fn test_heading_out_of_range_dropped() {
        let mut sys = system();
        sys.track_position(47.0, 11.0, 10.0, 600.0, 400.0);
        assert!(!sys.store().contains("airstate/heading"));
        sys.track_position(47.0, 11.0, 10.0, 600.0, 90.0);
        assert_eq!(sys.store().get("airstate/heading").unwrap().len(), 1);
        assert_eq!(sys.store().get("airstate/lat").unwrap().kind().as_str(), "timeseries<f64>");
    }

    #[test]
    fn test_attitude_in_degrees() {
        let mut sys = system();
        sys.track_attitude([std::f32::consts::FRAC_PI_2, 0.0, 0.0], [0.0; 3]);
        let roll = sys
            .store()
            .typed::<Timeseries<f32>>("airstate/angles/roll")
            .unwrap();
        assert!((roll.samples()[0].value - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_imu_scaling() {
        let mut sys = system();
        sys.track_imu(2, [1000.0, 0.0, -500.0], [0.0; 3], [0.0; 3]);
        let z = sys.store().typed::<Timeseries<f32>>("IMU2/acc/acc z").unwrap();
        assert!((z.samples()[0].value + 0.5).abs() < 1e-6);
        assert!(sys.store().contains("IMU2/magnetic/mag x"));
    }

    #[test]
    fn test_path_conflict_skips_sample() {
        let mut sys = system();
        sys.store.register(
            DataPath::parse("airstate/climb").unwrap(),
            Parameter::<u32>::new("climb", "").into(),
        );
        sys.track_flightperf(10.0, 11.0, 1.0, 50.0);
        assert_eq!(sys.log().errors(), 1);
        assert_eq!(sys.store().get("airstate/airspeed").unwrap().len(), 1);
        assert!(sys.store().get("airstate/climb").unwrap().is_empty());
    }

    #[test]
    fn test_generic_marks_periodic() {
        let mut sys = system();
        let record = TelemetryRecord::Generic {
            message: "NKF1".to_string(),
            field: "PN".to_string(),
            value: 1.5,
            periodic: true,
        };
        sys.track(&record);
        let series = sys
            .store()
            .typed::<Timeseries<f32>>("onboard log/NKF1/PN")
            .unwrap();
        assert!(series.expects_periodic());
    }

    #[test]
    fn test_link_throughput_needs_time() {
        let mut sys = system();
        sys.track_link(256, 0, LinkOutcome::Interpreted);
        assert!(!sys.store().contains("radio/throughput"));
        sys.update_time(0, false);
        sys.track_link(256, 1, LinkOutcome::Uninterpreted);
        sys.track_link(10, 0, LinkOutcome::Error);

        let throughput = sys
            .store()
            .typed::<Timeseries<f32>>("radio/throughput")
            .unwrap();
        assert_eq!(throughput.samples()[0].value, 4.0);
        let stats = sys.link_stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.bytes_total, 522);
        assert!(stats.uninterpreted_ids.contains(&1));
    }

    #[test]
    fn test_rc_channels() {
        let mut sys = system();
        sys.track(&TelemetryRecord::Rc {
            channels: [1000, 1100, 1200, 1300, 1400, 1500, 1600, 1700],
        });
        let ch8 = sys.store().typed::<Timeseries<u32>>("rc/channel_8").unwrap();
        assert_eq!(ch8.samples()[0].value, 1700);
    }
}
