//! Relative clock tracking with jump rejection.

use contracts::{micros_to_secs, TimeConfig, TimeJump};
use serde::Serialize;
use tracing::{instrument, trace};

/// Clock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// No relative time seen yet
    #[default]
    Uninitialized,
    /// At least one sample accepted
    Valid,
}

/// Maximum tolerated jumps between consecutive updates (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JumpThresholds {
    pub forward_s: f64,
    pub backward_s: f64,
}

impl Default for JumpThresholds {
    fn default() -> Self {
        TimeConfig::default().into()
    }
}

impl From<TimeConfig> for JumpThresholds {
    fn from(config: TimeConfig) -> Self {
        Self {
            forward_s: config.max_forward_jump_s,
            backward_s: config.max_backward_jump_s,
        }
    }
}

/// Per-system relative clock.
///
/// The first update is trusted unconditionally. Later updates that jump
/// further than the thresholds are rejected unless jumps are allowed;
/// a rejected update leaves every field unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClockTracker {
    state: ClockState,
    time_s: f64,
    min_s: f64,
    max_s: f64,
    have_time_update: bool,
    thresholds: JumpThresholds,
}

impl ClockTracker {
    pub fn new(thresholds: JumpThresholds) -> Self {
        Self {
            thresholds,
            ..Default::default()
        }
    }

    /// Feed a candidate relative time (µs).
    #[instrument(level = "trace", name = "clock_update", skip(self))]
    pub fn update(&mut self, relative_us: i64, allow_jumps: bool) -> TimeJump {
        let candidate = micros_to_secs(relative_us);

        let diff = match self.state {
            ClockState::Valid => candidate - self.time_s,
            ClockState::Uninitialized => {
                self.state = ClockState::Valid;
                self.min_s = candidate;
                self.max_s = candidate;
                0.0
            }
        };

        if diff < -self.thresholds.backward_s && !allow_jumps {
            return TimeJump::Backward { diff_s: diff };
        }
        if diff > self.thresholds.forward_s && !allow_jumps {
            return TimeJump::Forward { diff_s: diff };
        }

        self.min_s = self.min_s.min(candidate);
        self.max_s = self.max_s.max(candidate);
        self.time_s = candidate;
        self.have_time_update = true;
        trace!(time_s = candidate, "clock advanced");
        TimeJump::Accepted
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state == ClockState::Valid
    }

    /// Current relative time (seconds)
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn min_s(&self) -> f64 {
        self.min_s
    }

    pub fn max_s(&self) -> f64 {
        self.max_s
    }

    /// Whether any update has been accepted
    pub fn have_time_update(&self) -> bool {
        self.have_time_update
    }

    pub fn thresholds(&self) -> JumpThresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: JumpThresholds) {
        self.thresholds = thresholds;
    }

    /// Widen min/max to cover another clock's span (merge support).
    pub fn extend_span(&mut self, other: &ClockTracker) {
        if !other.is_valid() {
            return;
        }
        if !self.is_valid() {
            *self = ClockTracker {
                thresholds: self.thresholds,
                ..other.clone()
            };
            return;
        }
        self.min_s = self.min_s.min(other.min_s);
        self.max_s = self.max_s.max(other.max_s);
        self.have_time_update |= other.have_time_update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: i64 = 1_000_000;

    #[test]
    fn test_first_sample_trusted() {
        let mut clock = ClockTracker::default();
        assert_eq!(clock.state(), ClockState::Uninitialized);
        assert_eq!(clock.update(5_000 * S, false), TimeJump::Accepted);
        assert!(clock.is_valid());
        assert_eq!(clock.min_s(), 5_000.0);
        assert_eq!(clock.max_s(), 5_000.0);
        assert!(clock.have_time_update());
    }

    #[test]
    fn test_backward_jump_rejected() {
        let mut clock = ClockTracker::default();
        clock.update(100 * S, false);
        let status = clock.update(50 * S, false);
        assert_eq!(status.code(), -1);
        assert_eq!(clock.time_s(), 100.0);
        assert_eq!(clock.min_s(), 100.0);

        assert_eq!(clock.update(50 * S, true), TimeJump::Accepted);
        assert_eq!(clock.time_s(), 50.0);
        assert_eq!(clock.min_s(), 50.0);
        assert_eq!(clock.max_s(), 100.0);
    }

    #[test]
    fn test_forward_jump_rejected() {
        let mut clock = ClockTracker::default();
        clock.update(0, false);
        assert_eq!(clock.update(101 * S, false).code(), 1);
        assert_eq!(clock.time_s(), 0.0);
        assert_eq!(clock.update(100 * S, false), TimeJump::Accepted);
    }

    #[test]
    fn test_small_backward_step_accepted() {
        let mut clock = ClockTracker::default();
        clock.update(10 * S, false);
        assert!(clock.update(6 * S, false).is_accepted());
        assert_eq!(clock.min_s(), 6.0);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut clock = ClockTracker::new(JumpThresholds {
            forward_s: 1.0,
            backward_s: 1.0,
        });
        clock.update(0, false);
        assert_eq!(clock.update(2 * S, false).code(), 1);
    }

    #[test]
    fn test_span_monotonic() {
        let mut clock = ClockTracker::default();
        let mut last = (f64::MAX, f64::MIN);
        for t in [10, 12, 9, 30, 31, 8, 120, 40] {
            clock.update(t * S, false);
            assert!(clock.min_s() <= clock.max_s());
            if last.0 != f64::MAX {
                assert!(clock.min_s() <= last.0);
                assert!(clock.max_s() >= last.1);
            }
            last = (clock.min_s(), clock.max_s());
        }
    }

    #[test]
    fn test_extend_span() {
        let mut a = ClockTracker::default();
        a.update(10 * S, false);
        let mut b = ClockTracker::default();
        b.update(2 * S, false);
        b.update(50 * S, false);
        a.extend_span(&b);
        assert_eq!(a.min_s(), 2.0);
        assert_eq!(a.max_s(), 50.0);

        let mut fresh = ClockTracker::default();
        fresh.extend_span(&b);
        assert!(fresh.is_valid());
        assert_eq!(fresh.time_s(), 50.0);
    }
}
