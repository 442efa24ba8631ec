//! Time contracts: reference pairs, jump classification, offset estimates.
//!
//! Relative time is device clock time in seconds (f64) or microseconds (i64).
//! Absolute time is microseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

/// Microseconds per second
pub const MICROS_PER_SEC: i64 = 1_000_000;

/// One observed correlation between the device clock and real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferencePair {
    /// Device relative time (µs)
    pub relative_us: i64,
    /// Absolute epoch time (µs)
    pub absolute_us: i64,
}

impl ReferencePair {
    pub fn new(relative_us: i64, absolute_us: i64) -> Self {
        Self {
            relative_us,
            absolute_us,
        }
    }

    /// `absolute - relative`, the offset this pair votes for.
    #[inline]
    pub fn offset_us(&self) -> i64 {
        self.absolute_us - self.relative_us
    }
}

/// Outcome of a relative clock update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum TimeJump {
    /// Update was applied
    #[default]
    Accepted,
    /// Rejected: candidate was too far behind the current time
    Backward { diff_s: f64 },
    /// Rejected: candidate was too far ahead of the current time
    Forward { diff_s: f64 },
}

impl TimeJump {
    /// Direction code: -1 backward, 0 accepted, 1 forward.
    pub fn code(&self) -> i8 {
        match self {
            TimeJump::Accepted => 0,
            TimeJump::Backward { .. } => -1,
            TimeJump::Forward { .. } => 1,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TimeJump::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeJump::Accepted => "accepted",
            TimeJump::Backward { .. } => "backward",
            TimeJump::Forward { .. } => "forward",
        }
    }
}

/// Where an absolute time offset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetSource {
    /// Mean over observed reference pairs
    ReferencePairs,
    /// Fallback guess, speculative
    Guess,
}

/// Result of absolute-time determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetEstimate {
    /// Offset to add to relative µs to get epoch µs
    pub offset_us: i64,
    pub source: OffsetSource,
    /// Number of reference pairs used (0 for a guess)
    pub pairs: usize,
}

impl OffsetEstimate {
    pub fn is_speculative(&self) -> bool {
        self.source == OffsetSource::Guess
    }
}

/// Convert relative seconds to whole microseconds.
#[inline]
pub fn secs_to_micros(seconds: f64) -> i64 {
    (seconds * MICROS_PER_SEC as f64).round() as i64
}

/// Convert microseconds to seconds.
#[inline]
pub fn micros_to_secs(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_SEC as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_codes() {
        assert_eq!(TimeJump::Accepted.code(), 0);
        assert_eq!(TimeJump::Backward { diff_s: -50.0 }.code(), -1);
        assert_eq!(TimeJump::Forward { diff_s: 200.0 }.code(), 1);
        assert!(TimeJump::default().is_accepted());
    }

    #[test]
    fn test_pair_offset() {
        let pair = ReferencePair::new(10_000_000, 1_011_000_000);
        assert_eq!(pair.offset_us(), 1_001_000_000);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(secs_to_micros(1.5), 1_500_000);
        assert!((micros_to_secs(2_500_000) - 2.5).abs() < 1e-12);
    }
}
