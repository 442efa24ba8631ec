//! Scalar results without a time axis.

use serde::Serialize;

use super::UnitMeta;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter<T> {
    meta: UnitMeta,
    values: Vec<T>,
}

impl<T: Clone> Parameter<T> {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::new(name, units))
    }

    pub fn derived(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self::with_meta(UnitMeta::derived(name, units))
    }

    pub fn with_meta(meta: UnitMeta) -> Self {
        Self {
            meta,
            values: Vec::new(),
        }
    }

    pub fn meta(&self) -> &UnitMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut UnitMeta {
        &mut self.meta
    }

    /// Replace all values with one.
    pub fn set(&mut self, value: T) {
        self.values.clear();
        self.values.push(value);
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// First value
    pub fn value(&self) -> Option<&T> {
        self.values.first()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// A non-empty incoming parameter replaces the stored values.
    pub fn merge_in(&mut self, other: &Parameter<T>) {
        if !other.values.is_empty() {
            self.values = other.values.clone();
        }
    }
}
