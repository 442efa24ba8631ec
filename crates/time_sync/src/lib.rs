//! # Time Sync
//!
//! Per-system time synchronization.
//!
//! Responsible for:
//! - relative clock tracking with forward/backward jump rejection
//! - collecting (relative, absolute) reference pairs
//! - determining the absolute offset, or falling back to a guess
//!
//! ## Usage
//!
//! ```
//! use time_sync::{ClockTracker, OffsetEstimator};
//!
//! let mut clock = ClockTracker::default();
//! let mut offsets = OffsetEstimator::new();
//!
//! assert!(clock.update(1_000_000, false).is_accepted());
//! offsets.add_reference(1_000_000, 1_700_000_001_000_000);
//! assert_eq!(offsets.determine().offset_us, 1_700_000_000_000_000);
//! ```

mod calendar;
mod clock;
mod offset;

pub use calendar::{
    format_epoch_us, is_absolute_time, starttime_from_filename, ABSOLUTE_YEAR_THRESHOLD,
};
pub use clock::{ClockState, ClockTracker, JumpThresholds};
pub use offset::OffsetEstimator;

// Re-export contracts types
pub use contracts::{OffsetEstimate, OffsetSource, ReferencePair, TimeJump};
