//! Ordered (time, value) series.

use serde::Serialize;

use super::{merge_samples, Sample, TimedUnit, UnitMeta};

/// Numeric sample type that can be interpolated through f64.
pub trait Interpolate: Copy + PartialOrd + std::fmt::Debug {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

impl Interpolate for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Interpolate for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

impl Interpolate for u32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    // Saturating cast after rounding to nearest
    #[inline]
    fn from_f64(value: f64) -> Self {
        value.round() as u32
    }
}

/// Time-ordered samples of one quantity.
///
/// Raw ingestion appends in non-decreasing time; merges keep the order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeseries<T> {
    meta: UnitMeta,
    samples: Vec<Sample<T>>,
    /// Source promises evenly spaced samples
    expect_periodic: bool,
}

impl<T: Interpolate> Timeseries<T> {
    /// Empty raw series
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::new(name, units))
    }

    /// Empty derived series
    pub fn derived(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::derived(name, units))
    }

    pub fn with_meta(meta: UnitMeta) -> Self {
        Self {
            meta,
            samples: Vec::new(),
            expect_periodic: false,
        }
    }

    pub fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut UnitMeta {
        &mut self.meta
    }

    #[inline]
    pub fn add_elem(&mut self, value: T, time: f64) {
        self.samples.push(Sample::new(time, value));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample<T>> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&Sample<T>> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Value at `time`: linear between the bracketing samples, clamped to
    /// the first/last sample outside the covered span.
    pub fn data_at_time(&self, time: f64) -> Option<T> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        let upper = self.samples.partition_point(|s| s.time <= time);
        let lo = &self.samples[upper - 1];
        let hi = &self.samples[upper];
        let span = hi.time - lo.time;
        if lo.time == time || span <= 0.0 {
            return Some(lo.value);
        }
        let fraction = (time - lo.time) / span;
        let value = lo.value.to_f64() + (hi.value.to_f64() - lo.value.to_f64()) * fraction;
        Some(T::from_f64(value))
    }

    /// Smallest value, NaN samples ignored.
    pub fn min(&self) -> Option<T> {
        self.samples
            .iter()
            .map(|s| s.value)
            .filter(|v| !v.to_f64().is_nan())
            .fold(None, |acc, v| match acc {
                Some(m) if m <= v => Some(m),
                _ => Some(v),
            })
    }

    /// Largest value, NaN samples ignored.
    pub fn max(&self) -> Option<T> {
        self.samples
            .iter()
            .map(|s| s.value)
            .filter(|v| !v.to_f64().is_nan())
            .fold(None, |acc, v| match acc {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }

    /// Centered moving average into `out`, one output sample per input sample.
    ///
    /// Each output is the mean of all inputs within `window_s / 2` of its time.
    /// `out` keeps its labels; its samples are replaced.
    pub fn moving_average(&self, out: &mut Timeseries<T>, window_s: f64) {
        out.samples.clear();
        let half = window_s / 2.0;
        let mut lo = 0;
        let mut hi = 0;
        for sample in &self.samples {
            while hi < self.samples.len() && self.samples[hi].time <= sample.time + half {
                hi += 1;
            }
            while self.samples[lo].time < sample.time - half {
                lo += 1;
            }
            let window = &self.samples[lo..hi];
            let sum: f64 = window.iter().map(|s| s.value.to_f64()).sum();
            out.add_elem(T::from_f64(sum / window.len() as f64), sample.time);
        }
    }

    /// Union of samples; at an exact time present in both, `other` wins.
    pub fn merge_in(&mut self, other: &Timeseries<T>) {
        merge_samples(&mut self.samples, &other.samples);
        self.expect_periodic |= other.expect_periodic;
    }

    /// Copy of the samples as f64 pairs.
    pub fn to_f64_samples(&self) -> Vec<Sample<f64>> {
        self.samples
            .iter()
            .map(|s| Sample::new(s.time, s.value.to_f64()))
            .collect()
    }
}

impl<T: Interpolate> TimedUnit for Timeseries<T> {
    fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn first_time(&self) -> Option<f64> {
        self.samples.first().map(|s| s.time)
    }

    fn last_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time)
    }

    fn expects_periodic(&self) -> bool {
        self.expect_periodic
    }

    fn set_expect_periodic(&mut self, periodic: bool) {
        self.expect_periodic = periodic;
    }

    fn has_bad_timestamps(&self, min_samples: usize, max_deviation: f64) -> bool {
        if !self.expect_periodic || self.samples.len() < min_samples.max(2) {
            return false;
        }
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return false;
        };
        let mean = (last.time - first.time) / (self.samples.len() - 1) as f64;
        if mean <= 0.0 {
            return false;
        }
        let tolerance = max_deviation * mean;
        self.samples
            .windows(2)
            .any(|w| ((w[1].time - w[0].time) - mean).abs() > tolerance)
    }

    fn make_periodic(&mut self) {
        let n = self.samples.len();
        if n < 2 {
            return;
        }
        let start = self.samples[0].time;
        let end = self.samples[n - 1].time;
        let step = (end - start) / (n - 1) as f64;
        for (i, sample) in self.samples.iter_mut().enumerate() {
            sample.time = start + step * i as f64;
        }
        self.samples[n - 1].time = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series<T: Interpolate>(points: &[(f64, T)]) -> Timeseries<T> {
        let mut ts = Timeseries::new("test", "");
        for &(t, v) in points {
            ts.add_elem(v, t);
        }
        ts
    }

    #[test]
    fn test_data_at_time_interpolates() {
        let ts = series(&[(0.0, 0.0f64), (10.0, 100.0)]);
        assert!((ts.data_at_time(2.5).unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(ts.data_at_time(10.0), Some(100.0));
    }

    #[test]
    fn test_data_at_time_clamps() {
        let ts = series(&[(1.0, 5.0f32), (2.0, 7.0)]);
        assert_eq!(ts.data_at_time(-3.0), Some(5.0));
        assert_eq!(ts.data_at_time(99.0), Some(7.0));
        assert_eq!(series::<f32>(&[]).data_at_time(1.0), None);
    }

    #[test]
    fn test_data_at_time_u32_rounds() {
        let ts = series(&[(0.0, 0u32), (1.0, 3)]);
        assert_eq!(ts.data_at_time(0.5), Some(2));
    }

    #[test]
    fn test_min_max_last() {
        let ts = series(&[(0.0, 3.0f32), (1.0, -1.0), (2.0, f32::NAN), (3.0, 8.0)]);
        assert_eq!(ts.min(), Some(-1.0));
        assert_eq!(ts.max(), Some(8.0));
        assert_eq!(ts.last().map(|s| s.value), Some(8.0));
    }

    #[test]
    fn test_moving_average_window() {
        let ts = series(&[(0.0, 0.0f64), (1.0, 3.0), (2.0, 6.0), (10.0, 9.0)]);
        let mut out = Timeseries::derived("avg", "");
        ts.moving_average(&mut out, 2.0);
        let values: Vec<f64> = out.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.5, 3.0, 4.5, 9.0]);
        assert_eq!(out.meta().name, "avg");
    }

    #[test]
    fn test_bad_timestamps_detection() {
        let mut ts = series(&[(0.0, 1.0f32), (0.1, 1.0), (0.2, 1.0), (0.9, 1.0), (1.0, 1.0)]);
        assert!(!ts.has_bad_timestamps(3, 0.5), "not periodic yet");
        ts.set_expect_periodic(true);
        assert!(ts.has_bad_timestamps(3, 0.5));
        assert!(!ts.has_bad_timestamps(10, 0.5), "too few samples");

        let even = {
            let mut e = series(&[(0.0, 1.0f32), (1.0, 1.0), (2.0, 1.0)]);
            e.set_expect_periodic(true);
            e
        };
        assert!(!even.has_bad_timestamps(3, 0.5));
    }

    #[test]
    fn test_make_periodic() {
        let mut ts = series(&[(0.0, 1.0f32), (0.1, 2.0), (0.2, 3.0), (0.9, 4.0), (1.0, 5.0)]);
        ts.make_periodic();
        let times: Vec<f64> = ts.samples().iter().map(|s| s.time).collect();
        let values: Vec<f32> = ts.samples().iter().map(|s| s.value).collect();
        for (got, want) in times.iter().zip([0.0, 0.25, 0.5, 0.75, 1.0]) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_merge_in_keeps_order() {
        let mut a = series(&[(0.0, 1.0f32), (2.0, 3.0)]);
        let b = series(&[(1.0, 2.0f32), (2.0, 30.0)]);
        a.merge_in(&b);
        let got: Vec<(f64, f32)> = a.samples().iter().map(|s| (s.time, s.value)).collect();
        assert_eq!(got, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 30.0)]);
    }
}
