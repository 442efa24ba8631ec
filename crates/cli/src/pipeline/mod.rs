//! Input loading, merging and run statistics.

mod loader;
mod snapshot;
mod stats;

pub use loader::{LoadPlan, Loaded};
pub use snapshot::{ScenarioSnapshot, SystemSnapshot};
pub use stats::RunStats;
