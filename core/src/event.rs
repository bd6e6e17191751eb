//! The event log: every observable state change of a run.
//!
//! RULE: The engine records what happened as events; the event log is the
//! replay and determinism reference. Two runs with the same seed and the
//! same commands must produce identical logs.

use crate::{
    clock::DeskSpeed,
    metrics::SystemHealth,
    scorer::ForcedScenario,
    transaction::{RiskLevel, TransactionStatus},
    types::{EntityId, RunId, Tick},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a run.
/// Variants are added over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Engine events ──────────────────────────────
    TickStarted {
        tick: Tick,
    },
    TickCompleted {
        tick: Tick,
    },
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },

    // ── Scoring events ─────────────────────────────
    TransactionScored {
        tick: Tick,
        transaction_id: EntityId,
        amount: f64,
        z_score: f64,
        signature_match_score: f64,
        matched_case_id: Option<EntityId>,
        risk_level: RiskLevel,
        forced: Option<ForcedScenario>,
        response_time_ms: f64,
    },
    BaselineUpdated {
        tick: Tick,
        mean: f64,
        std_dev: f64,
        window: usize,
    },

    // ── Monitoring events ──────────────────────────
    AlertsRecomputed {
        tick: Tick,
        total: usize,
        critical: usize,
    },
    HealthChanged {
        tick: Tick,
        from: SystemHealth,
        to: SystemHealth,
    },

    // ── Analyst events ─────────────────────────────
    CommandReceived {
        tick: Tick,
        command_type: String,
    },
    SpeedChanged {
        tick: Tick,
        speed: DeskSpeed,
    },
    StatusChanged {
        tick: Tick,
        transaction_id: EntityId,
        from: TransactionStatus,
        to: TransactionStatus,
        actor: String,
    },
    CaseAdded {
        tick: Tick,
        case_id: EntityId,
        transaction_id: EntityId,
    },
}

impl DeskEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TickStarted { .. }       => "tick_started",
            Self::TickCompleted { .. }     => "tick_completed",
            Self::RunInitialized { .. }    => "run_initialized",
            Self::TransactionScored { .. } => "transaction_scored",
            Self::BaselineUpdated { .. }   => "baseline_updated",
            Self::AlertsRecomputed { .. }  => "alerts_recomputed",
            Self::HealthChanged { .. }     => "health_changed",
            Self::CommandReceived { .. }   => "command_received",
            Self::SpeedChanged { .. }      => "speed_changed",
            Self::StatusChanged { .. }     => "status_changed",
            Self::CaseAdded { .. }         => "case_added",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub tick: Tick,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized DeskEvent
}
