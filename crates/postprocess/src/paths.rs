//! Input and output paths of the standard passes.

// Flight-book
pub const ALTITUDE: &str = "airstate/alt GND";
pub const THROTTLE: &str = "airstate/throttle";
pub const TAKEOFF_LANDING: &str = "flightbook/takeoff_landing";
pub const NUMBER_FLIGHTS: &str = "flightbook/number flights";
pub const TOTAL_FLIGHT_TIME: &str = "flightbook/total flight time";
pub const FIRST_TAKEOFF: &str = "flightbook/first takeoff";
pub const LAST_LANDING: &str = "flightbook/last landing";

// Power
pub const BATTERY_VOLTAGE: &str = "power/battery_voltage";
pub const BATTERY_CURRENT: &str = "power/battery_current";
pub const POWER: &str = "power/power";
pub const INST_CONSUMPTION: &str = "power/inst. consumption";
pub const INST_CHARGE: &str = "power/inst. charge";
pub const CUM_CONSUMPTION: &str = "power/cum. consumption";
pub const CUM_CHARGE: &str = "power/cum. charge";

// Glide performance
pub const CUM_HORIZONTAL_DISTANCE: &str = "glideperf/cum. horz. dist.";
pub const FUSED_GROUNDSPEED: &str = "glideperf/groundspeed";
pub const WIND_DIRECTION: &str = "glideperf/wind direction";
pub const WIND_SPEED: &str = "glideperf/wind speed";
pub const RELATIVE_WIND_ANGLE: &str = "glideperf/relative wind angle";
pub const HEAD_WIND: &str = "glideperf/head wind";
pub const AIRSPEED_ESTIMATE: &str = "glideperf/airspeed estimate";
pub const GLIDE_RATIO: &str = "glideperf/glide ratio";
pub const GLIDE_RATIO_SMOOTHED: &str = "glideperf/glide ratio 5sec avg";

/// Search patterns over full paths, matched in sorted-path order.
pub mod patterns {
    pub const POSITION_NORTH: &str = r"\bPN\b";
    pub const POSITION_EAST: &str = r"\bPE\b";
    pub const POSITION_DOWN: &str = r"\bPD\b";

    pub const ROLL: &str = r"\b[rR]oll\b";
    pub const PITCH: &str = r"\b[pP]itch\b";
    pub const ACC_X: &str = r"\bAccX\b";
    pub const WIND_EAST: &str = r"\bVWE\b";
    pub const WIND_NORTH: &str = r"\bVWN\b";
    pub const YAW: &str = r"\bYaw\b";
    pub const TRUE_AIRSPEED: &str = r"\bTrueSpeed\b";
    pub const AIRSPEED_FALLBACK: &str = r"^airstate/airspeed$";
    pub const VELOCITY_EAST: &str = r"NKF1/VE";
    pub const VELOCITY_NORTH: &str = r"NKF1/VN";
    pub const GPS_SPEED: &str = r"GPS/Spd";
    pub const GROUNDSPEED_FALLBACK: &str = r"^GPS/ground speed$";
    pub const SINK_RATE: &str = r"\bVD\b";
    pub const SINK_RATE_FALLBACK: &str = r"GPS/VZ";
}
