//! Scored transactions and the capped most-recent list the dashboard reads.

use crate::{
    error::{DeskError, DeskResult},
    types::{EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Maximum number of transactions kept in the live list.
pub const TRANSACTION_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low      => "LOW",
            Self::Medium   => "MEDIUM",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Review status. Set to `Pending` at scoring time; every later change
/// comes from an analyst action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Analyzing,
    Allowed,
    Blocked,
    Flagged,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending   => "PENDING",
            Self::Analyzing => "ANALYZING",
            Self::Allowed   => "ALLOWED",
            Self::Blocked   => "BLOCKED",
            Self::Flagged   => "FLAGGED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id:                    EntityId,
    pub timestamp:             Timestamp,
    pub amount:                f64,
    pub merchant:              String,
    pub merchant_id:           String,
    pub narrative:             String,
    pub location:              String,
    pub ip:                    String,
    pub z_score:               f64,
    pub velocity_score:        f64,
    pub signature_match_score: f64,
    pub matched_case_id:       Option<EntityId>,
    pub risk_level:            RiskLevel,
    pub status:                TransactionStatus,
}

/// Newest-first list of scored transactions, capped at
/// `TRANSACTION_LOG_CAPACITY`. The oldest entry is evicted on every push
/// past capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, txn: Transaction) {
        self.entries.insert(0, txn);
        self.entries.truncate(TRANSACTION_LOG_CAPACITY);
    }

    /// All retained transactions, most recent first.
    pub fn as_slice(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.entries.iter().find(|t| t.id == id)
    }

    /// Analyst status change. Risk level is never touched.
    pub fn set_status(&mut self, id: &str, status: TransactionStatus) -> DeskResult<&Transaction> {
        let txn = self
            .entries
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DeskError::TransactionNotFound { id: id.to_string() })?;
        txn.status = status;
        Ok(txn)
    }
}
