//! Link accounting contracts

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of one received protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Decoded and tracked
    Interpreted,
    /// Valid message with no tracking support
    Uninterpreted,
    /// Checksum or framing failure
    Error,
}

impl LinkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkOutcome::Interpreted => "interpreted",
            LinkOutcome::Uninterpreted => "uninterpreted",
            LinkOutcome::Error => "error",
        }
    }
}

/// Snapshot of link counters for one system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub received: u64,
    pub interpreted: u64,
    pub uninterpreted: u64,
    pub errors: u64,
    /// Total bytes counted
    pub bytes_total: u64,
    /// Bytes accumulated since the last throughput sample
    pub bytes_pending: u64,
    pub interpreted_ids: BTreeSet<u32>,
    pub uninterpreted_ids: BTreeSet<u32>,
}

impl LinkSummary {
    /// Count one message.
    pub fn record(&mut self, bytes: u64, msgid: u32, outcome: LinkOutcome) {
        self.received += 1;
        self.bytes_total += bytes;
        self.bytes_pending += bytes;
        match outcome {
            LinkOutcome::Interpreted => {
                self.interpreted += 1;
                self.interpreted_ids.insert(msgid);
            }
            LinkOutcome::Uninterpreted => {
                self.uninterpreted += 1;
                self.uninterpreted_ids.insert(msgid);
            }
            LinkOutcome::Error => self.errors += 1,
        }
    }

    /// Take the pending byte count, resetting it.
    pub fn take_pending(&mut self) -> u64 {
        std::mem::take(&mut self.bytes_pending)
    }

    /// Add another summary's counters (used when merging systems).
    pub fn absorb(&mut self, other: &LinkSummary) {
        self.received += other.received;
        self.interpreted += other.interpreted;
        self.uninterpreted += other.uninterpreted;
        self.errors += other.errors;
        self.bytes_total += other.bytes_total;
        self.interpreted_ids.extend(other.interpreted_ids.iter().copied());
        self.uninterpreted_ids
            .extend(other.uninterpreted_ids.iter().copied());
    }

    /// Percentage of received messages that failed to decode.
    pub fn error_rate(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            self.errors as f64 / self.received as f64 * 100.0
        }
    }
}
