//! # Vehicle
//!
//! Per-vehicle telemetry state and the multi-vehicle scenario.
//!
//! - [`System`]: data store, relative clock, offset estimation, link
//!   counters and the postprocess pipeline of one vehicle
//! - `track_*`: typed ingestion of decoded records at the current time
//! - [`Scenario`]: systems keyed by id, merged and processed together
//!
//! ```ignore
//! let mut sys = System::new(1);
//! sys.update_time(1_000_000, false);
//! sys.track_sysperf(35.0, 12.4, 3.1);
//! sys.postprocess();
//! println!("{}", sys.summary());
//! ```

mod scenario;
mod summary;
mod system;
mod track;

pub use scenario::Scenario;
pub use summary::{format_duration, Summary};
pub use system::{MergeReport, System};
