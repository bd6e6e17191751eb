use serde::{Deserialize, Serialize};
use crate::{
    clock::DeskSpeed,
    scorer::ForcedScenario,
    transaction::TransactionStatus,
};

/// All analyst-issued commands.
/// Variants added over time, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AnalystCommand {
    // ── Clock control ─────────────────────────────
    Pause,
    Resume,
    SetSpeed { speed: DeskSpeed },

    // ── Review ────────────────────────────────────
    SetStatus {
        transaction_id: String,
        status:         TransactionStatus,
    },
    ConfirmFraud {
        transaction_id: String,
        #[serde(default)]
        notes:          String,
    },

    // ── Simulation ────────────────────────────────
    /// Force the next generated transaction into an attack scenario.
    InjectScenario { scenario: ForcedScenario },
}

impl AnalystCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pause               => "pause",
            Self::Resume              => "resume",
            Self::SetSpeed { .. }     => "set_speed",
            Self::SetStatus { .. }    => "set_status",
            Self::ConfirmFraud { .. } => "confirm_fraud",
            Self::InjectScenario { .. } => "inject_scenario",
        }
    }
}
