//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Device clocks are relative: seconds (f64) in data units, microseconds (i64) at the edges
//! - Absolute time is microseconds since the Unix epoch
//! - A system's offset maps one onto the other

mod data_path;
mod engine_config;
mod error;
mod link;
mod record;
mod time;
mod vehicle_type;

pub use data_path::{DataPath, PATH_SEPARATOR};
pub use engine_config::*;
pub use error::*;
pub use link::*;
pub use record::*;
pub use time::*;
pub use vehicle_type::*;
