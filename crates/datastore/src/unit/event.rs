//! Sparse, change-triggered (time, value) log.

use serde::Serialize;

use super::{merge_samples, Sample, UnitMeta};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event<T> {
    meta: UnitMeta,
    samples: Vec<Sample<T>>,
}

impl<T: Clone + PartialEq> Event<T> {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::new(name, units))
    }

    pub fn derived(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::derived(name, units))
    }

    pub fn with_meta(meta: UnitMeta) -> Self {
        Self {
            meta,
            samples: Vec::new(),
        }
    }

    pub fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut UnitMeta {
        &mut self.meta
    }

    /// Unconditional append.
    pub fn add_elem(&mut self, value: T, time: f64) {
        self.samples.push(Sample::new(time, value));
    }

    /// Append only if `value` differs from the latest entry. Returns whether it was stored.
    pub fn add_if_changed(&mut self, value: T, time: f64) -> bool {
        if self.latest() == Some(&value) {
            return false;
        }
        self.add_elem(value, time);
        true
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.last().map(|s| &s.value)
    }

    /// Value in effect at `time` (latest entry at or before it).
    pub fn value_at_time(&self, time: f64) -> Option<&T> {
        let upper = self.samples.partition_point(|s| s.time <= time);
        upper.checked_sub(1).map(|i| &self.samples[i].value)
    }

    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample<T>> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn merge_in(&mut self, other: &Event<T>) {
        merge_samples(&mut self.samples, &other.samples);
    }
}
