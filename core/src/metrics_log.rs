//! Bounded ring buffer of per-transaction performance samples.

use crate::types::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const SNAPSHOT_LOG_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub timestamp:        Timestamp,
    pub response_time_ms: f64,
    pub is_fraud:         bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotLog {
    entries: VecDeque<MetricsSnapshot>,
}

impl SnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample stamped with the wall clock.
    pub fn record(&mut self, response_time_ms: f64, is_fraud: bool) {
        self.record_at(Utc::now(), response_time_ms, is_fraud);
    }

    /// Append a sample with an explicit timestamp. The oldest sample is
    /// dropped as soon as the log exceeds capacity.
    pub fn record_at(&mut self, timestamp: Timestamp, response_time_ms: f64, is_fraud: bool) {
        self.entries.push_back(MetricsSnapshot {
            timestamp,
            response_time_ms,
            is_fraud,
        });
        while self.entries.len() > SNAPSHOT_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MetricsSnapshot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
