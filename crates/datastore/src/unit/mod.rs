//! Data units: the typed leaves of the hierarchy.
//!
//! The family is closed: [`DataUnit`] enumerates every representation the
//! engine stores. Code that needs a concrete representation asks for it
//! through [`UnitVariant`]; code that only needs a time axis asks through
//! [`TimedUnit`].

#[macro_use]
mod macros;
mod event;
mod parameter;
mod timeseries;

pub use event::Event;
pub use parameter::Parameter;
pub use timeseries::{Interpolate, Timeseries};

use std::cmp::Ordering;

use contracts::TelemetryError;
use serde::Serialize;

/// One (time, value) sample. Time is relative seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample<T> {
    pub time: f64,
    pub value: T,
}

impl<T> Sample<T> {
    #[inline]
    pub fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }
}

/// Raw data comes from ingestion, derived data from the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataClass {
    #[default]
    Raw,
    Derived,
}

impl DataClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataClass::Raw => "raw",
            DataClass::Derived => "derived",
        }
    }
}

/// Identity and labelling shared by every unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitMeta {
    pub name: String,
    /// Units of measure, free text
    pub units: String,
    pub class: DataClass,
    /// Epoch baseline: absolute µs corresponding to relative time zero
    pub epoch_us: i64,
}

impl UnitMeta {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            ..Default::default()
        }
    }

    pub fn derived(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            class: DataClass::Derived,
            ..Self::new(name, units)
        }
    }
}

/// Representation tag of a [`DataUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    SeriesF32,
    SeriesF64,
    SeriesU32,
    EventText,
    ParamF64,
    ParamU32,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::SeriesF32 => "timeseries<f32>",
            UnitKind::SeriesF64 => "timeseries<f64>",
            UnitKind::SeriesU32 => "timeseries<u32>",
            UnitKind::EventText => "event<text>",
            UnitKind::ParamF64 => "parameter<f64>",
            UnitKind::ParamU32 => "parameter<u32>",
        }
    }
}

/// Every stored representation.
#[derive(Debug, Clone, PartialEq)]
pub enum DataUnit {
    SeriesF32(Timeseries<f32>),
    SeriesF64(Timeseries<f64>),
    SeriesU32(Timeseries<u32>),
    EventText(Event<String>),
    ParamF64(Parameter<f64>),
    ParamU32(Parameter<u32>),
}

/// Concrete representation that can be stored in and borrowed out of a [`DataUnit`].
pub trait UnitVariant: Sized {
    const KIND: UnitKind;

    fn from_unit(unit: &DataUnit) -> Option<&Self>;
    fn from_unit_mut(unit: &mut DataUnit) -> Option<&mut Self>;
    fn into_unit(self) -> DataUnit;
    /// Empty raw unit with the given labels.
    fn empty(name: &str, units: &str) -> Self;
}

impl_unit_variant!(Timeseries<f32>, SeriesF32);
impl_unit_variant!(Timeseries<f64>, SeriesF64);
impl_unit_variant!(Timeseries<u32>, SeriesU32);
impl_unit_variant!(Event<String>, EventText);
impl_unit_variant!(Parameter<f64>, ParamF64);
impl_unit_variant!(Parameter<u32>, ParamU32);

/// Capability of units with an ordered, evenly-sampled-or-not time axis.
pub trait TimedUnit {
    fn sample_count(&self) -> usize;
    fn first_time(&self) -> Option<f64>;
    fn last_time(&self) -> Option<f64>;
    fn expects_periodic(&self) -> bool;
    fn set_expect_periodic(&mut self, periodic: bool);
    /// True when a periodic unit's spacing deviates from its mean interval
    /// by more than `max_deviation` (a fraction of the mean).
    fn has_bad_timestamps(&self, min_samples: usize, max_deviation: f64) -> bool;
    /// Respace timestamps evenly between the first and last sample.
    fn make_periodic(&mut self);
}

macro_rules! dispatch {
    ($self:expr, $unit:ident => $body:expr) => {
        match $self {
            DataUnit::SeriesF32($unit) => $body,
            DataUnit::SeriesF64($unit) => $body,
            DataUnit::SeriesU32($unit) => $body,
            DataUnit::EventText($unit) => $body,
            DataUnit::ParamF64($unit) => $body,
            DataUnit::ParamU32($unit) => $body,
        }
    };
}

impl DataUnit {
    pub fn kind(&self) -> UnitKind {
        match self {
            DataUnit::SeriesF32(_) => UnitKind::SeriesF32,
            DataUnit::SeriesF64(_) => UnitKind::SeriesF64,
            DataUnit::SeriesU32(_) => UnitKind::SeriesU32,
            DataUnit::EventText(_) => UnitKind::EventText,
            DataUnit::ParamF64(_) => UnitKind::ParamF64,
            DataUnit::ParamU32(_) => UnitKind::ParamU32,
        }
    }

    pub fn meta(&self) -> &UnitMeta {
        dispatch!(self, u => u.meta())
    }

    pub fn meta_mut(&mut self) -> &mut UnitMeta {
        dispatch!(self, u => u.meta_mut())
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn class(&self) -> DataClass {
        self.meta().class
    }

    pub fn is_raw(&self) -> bool {
        self.class() == DataClass::Raw
    }

    /// Number of stored samples or values.
    pub fn len(&self) -> usize {
        dispatch!(self, u => u.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        dispatch!(self, u => u.clear())
    }

    /// Time-axis capability, if the representation has one worth repairing.
    pub fn as_timed(&self) -> Option<&dyn TimedUnit> {
        match self {
            DataUnit::SeriesF32(u) => Some(u),
            DataUnit::SeriesF64(u) => Some(u),
            DataUnit::SeriesU32(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_timed_mut(&mut self) -> Option<&mut dyn TimedUnit> {
        match self {
            DataUnit::SeriesF32(u) => Some(u),
            DataUnit::SeriesF64(u) => Some(u),
            DataUnit::SeriesU32(u) => Some(u),
            _ => None,
        }
    }

    /// First and last relative time, for series and events.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        match self {
            DataUnit::EventText(e) => Some((e.first()?.time, e.last()?.time)),
            _ => {
                let timed = self.as_timed()?;
                Some((timed.first_time()?, timed.last_time()?))
            }
        }
    }

    /// Union `other` into `self`; both must share a representation.
    pub fn merge_in(&mut self, other: &DataUnit) -> Result<(), TelemetryError> {
        match (self, other) {
            (DataUnit::SeriesF32(a), DataUnit::SeriesF32(b)) => a.merge_in(b),
            (DataUnit::SeriesF64(a), DataUnit::SeriesF64(b)) => a.merge_in(b),
            (DataUnit::SeriesU32(a), DataUnit::SeriesU32(b)) => a.merge_in(b),
            (DataUnit::EventText(a), DataUnit::EventText(b)) => a.merge_in(b),
            (DataUnit::ParamF64(a), DataUnit::ParamF64(b)) => a.merge_in(b),
            (DataUnit::ParamU32(a), DataUnit::ParamU32(b)) => a.merge_in(b),
            (a, b) => {
                return Err(TelemetryError::type_mismatch(
                    a.meta().name.clone(),
                    a.kind().as_str(),
                    b.kind().as_str(),
                ))
            }
        }
        Ok(())
    }
}

/// Stable union of two time-sorted sample sequences.
///
/// Samples of `current` at a time also present in `incoming` are dropped;
/// the incoming ones win.
pub(crate) fn merge_samples<T: Clone>(current: &mut Vec<Sample<T>>, incoming: &[Sample<T>]) {
    if incoming.is_empty() {
        return;
    }
    sort_by_time(current);
    let mut sorted_incoming = incoming.to_vec();
    sort_by_time(&mut sorted_incoming);

    let previous = std::mem::take(current);
    let mut merged = Vec::with_capacity(previous.len() + sorted_incoming.len());
    let mut ours = previous.into_iter().peekable();
    let mut theirs = sorted_incoming.into_iter().peekable();

    loop {
        let order = match (ours.peek(), theirs.peek()) {
            (Some(a), Some(b)) => a.time.total_cmp(&b.time),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => merged.extend(ours.next()),
            Ordering::Greater => merged.extend(theirs.next()),
            Ordering::Equal => {
                ours.next();
            }
        }
    }
    *current = merged;
}

fn sort_by_time<T>(samples: &mut [Sample<T>]) {
    if !samples.windows(2).all(|w| w[0].time <= w[1].time) {
        samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(f64, f32)]) -> Timeseries<f32> {
        let mut ts = Timeseries::new("x", "m");
        for &(t, v) in points {
            ts.add_elem(v, t);
        }
        ts
    }

    #[test]
    fn test_meta_serializes_snake_case() {
        let meta = UnitMeta::derived("power", "W");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["class"], "derived");
        assert_eq!(json["units"], "W");
        assert_eq!(serde_json::to_value(UnitKind::SeriesF32).unwrap(), "series_f32");
    }

    #[test]
    fn test_merge_samples_incoming_wins() {
        let mut current = vec![Sample::new(0.0, 1), Sample::new(1.0, 2), Sample::new(2.0, 3)];
        let incoming = vec![Sample::new(1.0, 20), Sample::new(3.0, 40)];
        merge_samples(&mut current, &incoming);
        let values: Vec<i32> = current.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1, 20, 3, 40]);
    }

    #[test]
    fn test_merge_samples_drops_all_duplicates_at_time() {
        let mut current = vec![Sample::new(1.0, 1), Sample::new(1.0, 2)];
        let incoming = vec![Sample::new(1.0, 9)];
        merge_samples(&mut current, &incoming);
        assert_eq!(current, vec![Sample::new(1.0, 9)]);
    }

    #[test]
    fn test_merge_identical_is_noop() {
        let original = series(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
        let mut unit = DataUnit::SeriesF32(original.clone());
        unit.merge_in(&DataUnit::SeriesF32(original.clone())).unwrap();
        assert_eq!(unit, DataUnit::SeriesF32(original));
    }

    #[test]
    fn test_merge_type_mismatch() {
        let mut unit = DataUnit::SeriesF32(series(&[(0.0, 1.0)]));
        let other = DataUnit::ParamF64(Parameter::new("x", "m"));
        let err = unit.merge_in(&other).unwrap_err();
        assert!(matches!(err, TelemetryError::TypeMismatch { .. }));
        assert_eq!(unit.len(), 1);
    }

    #[test]
    fn test_variant_downcast() {
        let unit = Timeseries::<f64>::empty("lat", "deg").into_unit();
        assert_eq!(unit.kind(), UnitKind::SeriesF64);
        assert!(<Timeseries<f64>>::from_unit(&unit).is_some());
        assert!(<Timeseries<f32>>::from_unit(&unit).is_none());
        assert!(unit.as_timed().is_some());
        assert!(Event::<String>::empty("status", "").into_unit().as_timed().is_none());
    }

    #[test]
    fn test_time_span() {
        let unit = DataUnit::SeriesF32(series(&[(2.0, 1.0), (7.5, 2.0)]));
        assert_eq!(unit.time_span(), Some((2.0, 7.5)));
        let empty = DataUnit::SeriesF32(Timeseries::new("x", ""));
        assert_eq!(empty.time_span(), None);
    }
}
