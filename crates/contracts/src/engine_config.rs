//! Engine configuration contracts shared by the time, pipeline and CLI crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default backward jump threshold (seconds)
pub const DEFAULT_MAX_BACKWARD_JUMP_S: f64 = 5.0;
/// Default forward jump threshold (seconds)
pub const DEFAULT_MAX_FORWARD_JUMP_S: f64 = 100.0;
/// Minimum sample count before a series is checked for bad timestamps
pub const DEFAULT_TIMING_MIN_SAMPLES: usize = 3;
/// Allowed deviation of one interval from the mean interval, as a fraction
pub const DEFAULT_MAX_INTERVAL_DEVIATION: f64 = 0.5;
/// Altitude above ground above which the vehicle may be flying (m)
pub const DEFAULT_FLIGHT_MIN_ALTITUDE_M: f64 = 1.0;
/// Throttle above which the vehicle may be flying (%)
pub const DEFAULT_FLIGHT_MIN_THROTTLE: f64 = 20.0;
/// Minimum airspeed for a glide sample (m/s)
pub const DEFAULT_GLIDE_SPEED_MIN: f64 = 5.0;
/// Maximum |pitch| for a glide sample (deg)
pub const DEFAULT_GLIDE_PITCH_MAX_DEG: f64 = 20.0;
/// Maximum |roll| for a glide sample (deg)
pub const DEFAULT_GLIDE_ROLL_MAX_DEG: f64 = 45.0;
/// Maximum |longitudinal acceleration| for a glide sample
pub const DEFAULT_GLIDE_ACCX_MAX: f64 = 2.0;
/// Glide ratio smoothing window (seconds)
pub const DEFAULT_GLIDE_SMOOTHING_S: f64 = 5.0;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Relative clock tracking
    #[serde(default)]
    #[validate(nested)]
    pub time: TimeConfig,

    /// Timing repair pass
    #[serde(default)]
    #[validate(nested)]
    pub timing: TimingConfig,

    /// Flight-book pass
    #[serde(default)]
    #[validate(nested)]
    pub flightbook: FlightbookConfig,

    /// Glide performance passes
    #[serde(default)]
    #[validate(nested)]
    pub glide: GlideConfig,
}

/// Jump rejection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TimeConfig {
    #[validate(range(min = 0.0))]
    pub max_backward_jump_s: f64,
    #[validate(range(min = 0.0))]
    pub max_forward_jump_s: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            max_backward_jump_s: DEFAULT_MAX_BACKWARD_JUMP_S,
            max_forward_jump_s: DEFAULT_MAX_FORWARD_JUMP_S,
        }
    }
}

/// Bad timestamp detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TimingConfig {
    #[validate(range(min = 3))]
    pub min_samples: usize,
    #[validate(range(min = 0.0, max = 10.0))]
    pub max_interval_deviation: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_TIMING_MIN_SAMPLES,
            max_interval_deviation: DEFAULT_MAX_INTERVAL_DEVIATION,
        }
    }
}

/// "Flying" definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FlightbookConfig {
    pub min_altitude_m: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub min_throttle_percent: f64,
}

impl Default for FlightbookConfig {
    fn default() -> Self {
        Self {
            min_altitude_m: DEFAULT_FLIGHT_MIN_ALTITUDE_M,
            min_throttle_percent: DEFAULT_FLIGHT_MIN_THROTTLE,
        }
    }
}

/// Quasi-steady flight filter bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GlideConfig {
    #[validate(range(min = 0.0))]
    pub speed_min: f64,
    #[validate(range(min = 0.0, max = 90.0))]
    pub pitch_max_deg: f64,
    #[validate(range(min = 0.0, max = 90.0))]
    pub roll_max_deg: f64,
    #[validate(range(min = 0.0))]
    pub accx_max: f64,
    #[validate(range(min = 0.0))]
    pub smoothing_window_s: f64,
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self {
            speed_min: DEFAULT_GLIDE_SPEED_MIN,
            pitch_max_deg: DEFAULT_GLIDE_PITCH_MAX_DEG,
            roll_max_deg: DEFAULT_GLIDE_ROLL_MAX_DEG,
            accx_max: DEFAULT_GLIDE_ACCX_MAX,
            smoothing_window_s: DEFAULT_GLIDE_SMOOTHING_S,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.time.max_backward_jump_s, 5.0);
        assert_eq!(config.time.max_forward_jump_s, 100.0);
        assert_eq!(config.glide.roll_max_deg, 45.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"glide": {"roll_max_deg": 30.0}}"#).unwrap();
        assert_eq!(config.glide.roll_max_deg, 30.0);
        assert_eq!(config.glide.pitch_max_deg, DEFAULT_GLIDE_PITCH_MAX_DEG);
        assert_eq!(config.time, TimeConfig::default());
    }

    #[test]
    fn test_range_violation() {
        let mut config = EngineConfig::default();
        config.glide.roll_max_deg = 120.0;
        assert!(config.validate().is_err());
    }
}
