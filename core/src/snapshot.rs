//! Snapshot serialization: engine state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL ticks. It captures the
//! baseline and headline numbers needed to inspect a run at that tick
//! without replaying from tick 0.

use crate::{
    clock::DeskClock,
    metrics::DashboardMetrics,
    profile::UserProfile,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_INTERVAL: Tick = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskSnapshot {
    pub run_id: RunId,
    pub tick: Tick,
    pub clock: DeskClock,
    pub profile: UserProfile,
    pub knowledge_base_size: usize,
    pub metrics: Option<DashboardMetrics>,
}
