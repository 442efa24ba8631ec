//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live ingestion counters, shareable across threads for progress reporting.
#[derive(Debug, Default)]
pub struct IngestionStats {
    /// Events applied
    pub events: AtomicU64,

    /// Track events dispatched to a system
    pub tracked: AtomicU64,

    /// Time updates refused by the jump filter
    pub rejected_time_updates: AtomicU64,

    /// Lines that failed to parse
    pub parse_errors: AtomicU64,

    /// Absolute timestamps turned into reference pairs
    pub references: AtomicU64,
}

impl IngestionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tracked(&self) {
        self.tracked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_time(&self) {
        self.rejected_time_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reference(&self) {
        self.references.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events: self.events.load(Ordering::Relaxed),
            tracked: self.tracked.load(Ordering::Relaxed),
            rejected_time_updates: self.rejected_time_updates.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            references: self.references.load(Ordering::Relaxed),
        }
    }
}

/// Stats snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub events: u64,
    pub tracked: u64,
    pub rejected_time_updates: u64,
    pub parse_errors: u64,
    pub references: u64,
}

impl StatsSnapshot {
    /// Add another snapshot's counts (one input file each).
    pub fn absorb(&mut self, other: &StatsSnapshot) {
        self.events += other.events;
        self.tracked += other.tracked;
        self.rejected_time_updates += other.rejected_time_updates;
        self.parse_errors += other.parse_errors;
        self.references += other.references;
    }
}
