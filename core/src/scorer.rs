//! Risk scorer: turns a profile and the knowledge base into one fully
//! scored transaction.
//!
//! Two independent signals feed the decision:
//!   1. Behavioral: z-score of the amount against the user's baseline.
//!   2. Signature: similarity to a known fraud case. The retrieval step is
//!      external; here the similarity and matched case are synthesized.
//!
//! The risk level is always derived from the z-score and signature score
//! that end up on the returned transaction.

use crate::{
    config::{ScoringConfig, SimulationConfig},
    error::{DeskError, DeskResult},
    knowledge_base::{FraudCase, KnowledgeBase},
    profile::UserProfile,
    rng::RandomSource,
    transaction::{RiskLevel, Transaction, TransactionStatus},
    types::{EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Attack scenario injected by the driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForcedScenario {
    /// Amount several standard deviations above the baseline.
    Behavioral,
    /// Normal-looking amount that replays a known fraud case.
    Signature,
}

/// Identity of the transaction being generated. Supplied by the driver so
/// the scorer itself never reads a clock.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub id:        EntityId,
    pub timestamp: Timestamp,
    pub forced:    Option<ForcedScenario>,
}

/// Decision table, evaluated in order.
pub fn classify_risk(z_score: f64, signature_match_score: f64, cfg: &ScoringConfig) -> RiskLevel {
    if z_score.abs() > cfg.critical_z || signature_match_score >= cfg.signature_critical {
        RiskLevel::Critical
    } else if z_score.abs() > cfg.medium_z || signature_match_score >= cfg.signature_medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub struct RiskScorer<'a> {
    scoring:    &'a ScoringConfig,
    simulation: &'a SimulationConfig,
}

impl<'a> RiskScorer<'a> {
    pub fn new(scoring: &'a ScoringConfig, simulation: &'a SimulationConfig) -> Self {
        Self { scoring, simulation }
    }

    pub fn score(
        &self,
        profile: &UserProfile,
        kb: &KnowledgeBase,
        request: ScoreRequest,
        rng: &mut dyn RandomSource,
    ) -> DeskResult<Transaction> {
        if profile.is_empty() {
            return Err(DeskError::InvalidProfile);
        }

        let cfg = self.scoring;
        let mean = profile.mean();
        let spread = profile.std_dev().max(cfg.min_spread);

        let forced = match request.forced {
            Some(ForcedScenario::Signature) if kb.is_empty() => {
                log::warn!(
                    "{}: signature scenario requested with an empty knowledge base, drawing normally",
                    request.id
                );
                None
            }
            other => other,
        };

        // Context draws come first so every scenario consumes them in the
        // same order.
        let sim_merchant = self.simulation.merchants.get(rng.below(self.simulation.merchants.len()));
        let location = self
            .simulation
            .locations
            .get(rng.below(self.simulation.locations.len()))
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());
        let ip = format!(
            "{}.{}.{}.{}",
            10 + rng.below(200),
            rng.below(256),
            rng.below(256),
            1 + rng.below(254)
        );

        let (merchant, merchant_id, category) = match sim_merchant {
            Some(m) => (m.name.clone(), m.merchant_id.clone(), m.category.clone()),
            None => ("Unknown Merchant".to_string(), "M-000".to_string(), "general".to_string()),
        };

        // 1. Amount (and, for signature replays, the case being replayed).
        let mut replayed: Option<&FraudCase> = None;
        let raw_amount = match forced {
            Some(ForcedScenario::Behavioral) => {
                let (lo, hi) = cfg.behavioral_sigma;
                mean + spread * rng.uniform(lo, hi)
            }
            Some(ForcedScenario::Signature) => {
                replayed = kb.pick(rng);
                rng.normal(mean, spread * cfg.signature_amount_spread)
            }
            None => {
                if rng.chance(cfg.anomaly_probability) {
                    let (lo, hi) = cfg.anomaly_sigma;
                    mean + spread * rng.uniform(lo, hi)
                } else {
                    rng.normal(mean, spread)
                }
            }
        };
        let amount = round_cents(raw_amount.max(cfg.min_amount));

        // 2. Behavioral signal.
        let z_score = (amount - mean) / spread;

        // 3. Signature signal.
        let (signature_match_score, matched_case_id) = match replayed {
            Some(case) => {
                let (lo, hi) = cfg.signature_score;
                (rng.uniform(lo, hi), Some(case.id.clone()))
            }
            None => {
                if !kb.is_empty() && rng.chance(cfg.coincidental_match_probability) {
                    let (lo, hi) = cfg.coincidental_score;
                    let score = rng.uniform(lo, hi);
                    (score, kb.pick(rng).map(|c| c.id.clone()))
                } else {
                    (rng.uniform(0.0, cfg.background_signature_max), None)
                }
            }
        };

        // 4. Secondary signal.
        let velocity_score = rng.next_f64().clamp(0.0, 1.0);

        // 5. Decision.
        let risk_level = classify_risk(z_score, signature_match_score, cfg);

        let (merchant, merchant_id, narrative) = match replayed {
            Some(case) => (
                case.merchant.clone(),
                format!("M-{}", case.id),
                case.narrative.clone(),
            ),
            None => {
                let narrative = format!("{} purchase at {} for ${:.2}", category, merchant, amount);
                (merchant, merchant_id, narrative)
            }
        };

        log::debug!(
            "{} scored: amount={:.2} z={:.2} sig={:.2} risk={}",
            request.id,
            amount,
            z_score,
            signature_match_score,
            risk_level.as_str()
        );

        Ok(Transaction {
            id: request.id,
            timestamp: request.timestamp,
            amount,
            merchant,
            merchant_id,
            narrative,
            location,
            ip,
            z_score,
            velocity_score,
            signature_match_score,
            matched_case_id,
            risk_level,
            status: TransactionStatus::Pending,
        })
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
