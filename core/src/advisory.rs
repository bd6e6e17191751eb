//! Advisory collaborator: a second opinion on a scored transaction.
//!
//! The real provider is external (an LLM-style service). The engine calls
//! it at most once per review and never lets its failure escape: an
//! unconfigured or failing provider degrades to a conservative HOLD.

use crate::{
    knowledge_base::FraudCase,
    transaction::{RiskLevel, Transaction},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Block,
    Allow,
    Hold,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryRequest<'a> {
    pub transaction:  &'a Transaction,
    pub matched_case: Option<&'a FraudCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdvisoryVerdict {
    pub is_likely_fraud:    bool,
    /// 0–100.
    pub confidence:         u8,
    pub reasoning:          String,
    pub recommended_action: RecommendedAction,
    pub key_risk_factors:   Vec<String>,
    /// True when this verdict is the local fallback.
    #[serde(default)]
    pub fallback:           bool,
}

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Advisory provider is not configured")]
    Unconfigured,

    #[error("Advisory call failed: {0}")]
    Failed(String),
}

pub trait AdvisoryProvider {
    fn assess(&self, request: &AdvisoryRequest<'_>) -> Result<AdvisoryVerdict, AdvisoryError>;
}

/// Ask the provider once. Any failure becomes the HOLD fallback.
pub fn advise(provider: Option<&dyn AdvisoryProvider>, request: &AdvisoryRequest<'_>) -> AdvisoryVerdict {
    let result = match provider {
        Some(p) => p.assess(request),
        None => Err(AdvisoryError::Unconfigured),
    };

    match result {
        Ok(mut verdict) => {
            verdict.confidence = verdict.confidence.min(100);
            verdict
        }
        Err(e) => {
            log::warn!(
                "Advisory unavailable for {}: {e}; holding for manual review",
                request.transaction.id
            );
            fallback_verdict(&e)
        }
    }
}

pub fn fallback_verdict(error: &AdvisoryError) -> AdvisoryVerdict {
    AdvisoryVerdict {
        is_likely_fraud: false,
        confidence: 0,
        reasoning: format!("[FALLBACK] Advisory unavailable ({error}). Manual review required."),
        recommended_action: RecommendedAction::Hold,
        key_risk_factors: Vec::new(),
        fallback: true,
    }
}

/// Local, deterministic provider used when no external service is wired in.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAdvisor;

impl AdvisoryProvider for HeuristicAdvisor {
    fn assess(&self, request: &AdvisoryRequest<'_>) -> Result<AdvisoryVerdict, AdvisoryError> {
        let txn = request.transaction;
        let mut factors = Vec::new();

        if txn.z_score.abs() > 3.0 {
            factors.push(format!("Amount is {:.1} standard deviations from baseline", txn.z_score));
        } else if txn.z_score.abs() > 1.5 {
            factors.push(format!("Amount moderately above baseline (z={:.1})", txn.z_score));
        }
        if let Some(case) = request.matched_case {
            factors.push(format!(
                "Narrative matches known case {} ({}) at {:.0}% similarity",
                case.id,
                case.case_type,
                txn.signature_match_score * 100.0
            ));
        }
        if txn.velocity_score > 0.8 {
            factors.push(format!("High velocity score {:.2}", txn.velocity_score));
        }

        let signature_hit = request.matched_case.is_some() && txn.signature_match_score >= 0.85;
        let (action, confidence, likely) = match txn.risk_level {
            RiskLevel::Critical if signature_hit => (RecommendedAction::Block, 90, true),
            RiskLevel::Critical => (RecommendedAction::Hold, 70, true),
            RiskLevel::Medium => (RecommendedAction::Hold, 50, false),
            RiskLevel::Low => (RecommendedAction::Allow, 80, false),
        };

        let reasoning = if factors.is_empty() {
            "No behavioral or signature anomalies detected.".to_string()
        } else {
            format!("{} risk factor(s): {}", factors.len(), factors.join("; "))
        };

        Ok(AdvisoryVerdict {
            is_likely_fraud: likely,
            confidence,
            reasoning,
            recommended_action: action,
            key_risk_factors: factors,
            fallback: false,
        })
    }
}
