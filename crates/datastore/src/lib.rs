//! # Datastore
//!
//! Heterogeneous, time-indexed storage for one tracked system.
//!
//! - [`unit`]: the data unit variants (timeseries, event, parameter)
//! - [`hierarchy`]: the group tree with its flat path index

pub mod hierarchy;
pub mod unit;

pub use hierarchy::{GroupView, HierarchyStore};
pub use unit::{
    DataClass, DataUnit, Event, Interpolate, Parameter, Sample, TimedUnit, Timeseries, UnitKind,
    UnitMeta, UnitVariant,
};
