//! Engine clock: owns tick state, speed control, and pause.
//!
//! Timestamps are derived from the tick counter, never from the wall
//! clock, so a run replays identically from its seed.

use crate::types::{RunId, Tick, Timestamp};
use chrono::{Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 2024-01-01T00:00:00Z. Every run starts here.
pub const EPOCH_START_SECS: i64 = 1_704_067_200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeskClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    pub speed:        DeskSpeed,
    pub paused:       bool,
    /// Simulated instant of the current tick.
    pub now:          Timestamp,
}

impl DeskClock {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            current_tick: 0,
            speed: DeskSpeed::Normal,
            paused: true,
            now: Utc
                .timestamp_opt(EPOCH_START_SECS, 0)
                .single()
                .unwrap_or_default(),
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if called while paused; callers must check.
    pub fn advance(&mut self) -> Tick {
        assert!(!self.paused, "advance() called on paused clock");
        self.current_tick += 1;
        self.now += Duration::milliseconds(self.speed.interval_ms());
        self.current_tick
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: DeskSpeed) {
        self.speed = speed;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeskSpeed {
    Normal,       // one transaction every 2s
    Accelerated,  // one transaction every 500ms
    FastForward,  // one transaction every 100ms
}

impl DeskSpeed {
    /// Simulated milliseconds between two generated transactions.
    pub fn interval_ms(&self) -> i64 {
        match self {
            Self::Normal      => 2_000,
            Self::Accelerated => 500,
            Self::FastForward => 100,
        }
    }
}
