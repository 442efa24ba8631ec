//! Decoded telemetry records and ingest events.
//!
//! These are the inbound contract: a decoder upstream turns wire bytes or
//! onboard-log rows into these values; the engine never parses raw formats.
//! Angles are radians, as decoded, unless a field name says otherwise.

use serde::{Deserialize, Serialize};

use crate::{LinkOutcome, SystemId};

/// One already-decoded telemetry message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryRecord {
    /// System state and mode flags
    Heartbeat {
        vehicle_type: u8,
        autopilot: u8,
        base_mode: u8,
        custom_mode: u32,
        system_status: u8,
    },
    /// Onboard computer load and battery
    SysPerf {
        load_percent: f32,
        voltage_v: f32,
        current_a: f32,
    },
    Ambient {
        temperature_c: f32,
        static_pressure_hpa: f32,
    },
    FlightPerf {
        airspeed: f32,
        groundspeed: f32,
        climb: f32,
        throttle: f32,
    },
    Position {
        lat: f64,
        lon: f64,
        alt_gnd: f32,
        alt_msl: f32,
        heading_deg: f32,
    },
    Attitude {
        roll: f32,
        pitch: f32,
        yaw: f32,
        roll_rate: f32,
        pitch_rate: f32,
        yaw_rate: f32,
    },
    Velocity { vx: f32, vy: f32, vz: f32 },
    Gps {
        lat: f64,
        lon: f64,
        alt_wgs84: f32,
        hdop: f32,
        vdop: f32,
        ground_speed: f32,
        ground_course_deg: f32,
    },
    GpsStatus { satellites: u32, fix_type: u8 },
    /// Raw IMU in milli-units: mg, mrad/s, mT
    Imu {
        index: u8,
        acc_mg: [f32; 3],
        gyro_mrad_s: [f32; 3],
        mag_mt: [f32; 3],
    },
    ImuHighres {
        acc: [f32; 3],
        gyro: [f32; 3],
        mag: [f32; 3],
        temperature_c: f32,
        abs_pressure_hpa: f32,
        diff_pressure_hpa: f32,
        pressure_alt: f32,
    },
    Radio {
        rssi: u8,
        remote_rssi: u8,
        noise: u8,
        remote_noise: u8,
        txbuf: u8,
        rx_errors: u32,
        fixed: u32,
    },
    RadioRssi { rssi: u8 },
    RadioDroprate { drop_rate_percent: f32 },
    PowerRails { vcc_v: f32, vservo_v: f32, flags: u32 },
    Rc { channels: [u16; 8] },
    Actuators { servos: [u16; 8] },
    Nav {
        nav_roll: f32,
        nav_pitch: f32,
        nav_bearing: f32,
        target_bearing: f32,
        wp_dist: f32,
        alt_error: f32,
        aspd_error: f32,
        xtrack_error: f32,
    },
    MissionCurrent { seq: u32 },
    MissionItem {
        seq: u32,
        command: u32,
        lat: f64,
        lon: f64,
        alt: f32,
    },
    StatusText { severity: u8, text: String },
    SystemSensors {
        present: u32,
        enabled: u32,
        health: u32,
    },
    SystemErrors { errors: [u32; 4] },
    /// Onboard-log field without a dedicated tracker
    Generic {
        message: String,
        field: String,
        value: f64,
        #[serde(default)]
        periodic: bool,
    },
}

impl TelemetryRecord {
    /// Stable record name used in diagnostics and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryRecord::Heartbeat { .. } => "heartbeat",
            TelemetryRecord::SysPerf { .. } => "sys_perf",
            TelemetryRecord::Ambient { .. } => "ambient",
            TelemetryRecord::FlightPerf { .. } => "flight_perf",
            TelemetryRecord::Position { .. } => "position",
            TelemetryRecord::Attitude { .. } => "attitude",
            TelemetryRecord::Velocity { .. } => "velocity",
            TelemetryRecord::Gps { .. } => "gps",
            TelemetryRecord::GpsStatus { .. } => "gps_status",
            TelemetryRecord::Imu { .. } => "imu",
            TelemetryRecord::ImuHighres { .. } => "imu_highres",
            TelemetryRecord::Radio { .. } => "radio",
            TelemetryRecord::RadioRssi { .. } => "radio_rssi",
            TelemetryRecord::RadioDroprate { .. } => "radio_droprate",
            TelemetryRecord::PowerRails { .. } => "power_rails",
            TelemetryRecord::Rc { .. } => "rc",
            TelemetryRecord::Actuators { .. } => "actuators",
            TelemetryRecord::Nav { .. } => "nav",
            TelemetryRecord::MissionCurrent { .. } => "mission_current",
            TelemetryRecord::MissionItem { .. } => "mission_item",
            TelemetryRecord::StatusText { .. } => "status_text",
            TelemetryRecord::SystemSensors { .. } => "system_sensors",
            TelemetryRecord::SystemErrors { .. } => "system_errors",
            TelemetryRecord::Generic { .. } => "generic",
        }
    }
}

fn default_system() -> SystemId {
    1
}

/// One line of an ingest stream: a payload addressed to a system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestEvent {
    #[serde(default = "default_system")]
    pub system: SystemId,
    #[serde(flatten)]
    pub payload: IngestPayload,
}

/// What an ingest event does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestPayload {
    /// Advance the relative clock
    Time {
        relative_us: i64,
        #[serde(default)]
        allow_jumps: bool,
    },
    /// Correlated relative/absolute pair
    Reference { relative_us: i64, absolute_us: i64 },
    /// Fallback offset hint
    Guess { relative_us: i64, epoch_us: i64 },
    /// Raw timestamp of unknown kind (relative or absolute µs)
    Stamp { timestamp_us: i64 },
    /// Link accounting fact
    Link {
        bytes: u64,
        msgid: u32,
        outcome: LinkOutcome,
    },
    /// Decoded record at the current relative time
    Track { record: TelemetryRecord },
}

impl IngestPayload {
    pub fn name(&self) -> &'static str {
        match self {
            IngestPayload::Time { .. } => "time",
            IngestPayload::Reference { .. } => "reference",
            IngestPayload::Guess { .. } => "guess",
            IngestPayload::Stamp { .. } => "stamp",
            IngestPayload::Link { .. } => "link",
            IngestPayload::Track { .. } => "track",
        }
    }
}
