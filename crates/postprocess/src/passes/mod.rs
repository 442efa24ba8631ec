//! The standard analysis passes.

mod flightbook;
mod glide_position;
mod glide_velocity;
mod power;
mod timing;

pub use flightbook::{extract_flights, FlightLog, Flightbook, LANDING, TAKEOFF};
pub use glide_position::{horizontal_distance, GlidePositionBased};
pub use glide_velocity::{glide_ratio, wind_at, GlideVelocityBased, SteadyFlightFilter, WindSample};
pub use power::{integrate, PowerStatistics};
pub use timing::{TimingRepair, ORIGINAL_SUFFIX};
