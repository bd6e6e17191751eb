use crate::{
    knowledge_base::{FraudCase, KnowledgeBase},
    reference::{
        ComplianceStatus, CustomerPolicy, MerchantRating, Policy, ReferenceData, SanctionEntity,
    },
};
use serde::{Deserialize, Serialize};

// ── Scoring ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// |z| above this is CRITICAL.
    pub critical_z: f64,
    /// |z| above this is MEDIUM.
    pub medium_z: f64,
    /// Signature similarity at or above this is CRITICAL.
    pub signature_critical: f64,
    /// Signature similarity at or above this is MEDIUM.
    pub signature_medium: f64,
    /// Lower bound on the baseline std-dev. Amounts are drawn with this
    /// spread and z-scores divide by it, so the two always agree.
    pub min_spread: f64,
    /// Smallest amount ever generated.
    pub min_amount: f64,
    /// Chance an unforced draw is an anomalous high-magnitude amount.
    pub anomaly_probability: f64,
    /// Sigma offset range for background anomalies.
    pub anomaly_sigma: (f64, f64),
    /// Sigma offset range for forced behavioral attacks.
    pub behavioral_sigma: (f64, f64),
    /// Spread multiplier for the "normal-looking" signature attack amount.
    pub signature_amount_spread: f64,
    /// Similarity range for forced signature attacks.
    pub signature_score: (f64, f64),
    /// Upper bound of the background similarity noise.
    pub background_signature_max: f64,
    pub coincidental_match_probability: f64,
    pub coincidental_score: (f64, f64),
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            critical_z: 3.0,
            medium_z: 1.5,
            signature_critical: 0.85,
            signature_medium: 0.5,
            min_spread: 10.0,
            min_amount: 1.0,
            anomaly_probability: 0.03,
            anomaly_sigma: (4.0, 8.0),
            behavioral_sigma: (4.0, 7.0),
            signature_amount_spread: 0.5,
            signature_score: (0.85, 0.99),
            background_signature_max: 0.30,
            coincidental_match_probability: 0.05,
            coincidental_score: (0.50, 0.80),
        }
    }
}

// ── Alerts and health ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub detection_rate_warning: f64,
    pub detection_rate_critical: f64,
    pub false_positive_rate_warning: f64,
    pub latency_warning_ms: f64,
    pub latency_critical_ms: f64,
    pub high_value_amount: f64,
    pub risky_merchant_keywords: Vec<String>,
    pub velocity_window: usize,
    pub velocity_count: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            detection_rate_warning: 0.10,
            detection_rate_critical: 0.20,
            false_positive_rate_warning: 0.20,
            latency_warning_ms: 3000.0,
            latency_critical_ms: 5000.0,
            high_value_amount: 10_000.0,
            risky_merchant_keywords: vec!["crypto".into(), "wire".into(), "transfer".into()],
            velocity_window: 10,
            velocity_count: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    pub critical_alert_count: usize,
    pub critical_false_positive_rate: f64,
    pub critical_latency_ms: f64,
    pub critical_detection_rate: f64,
    pub warning_alert_count: usize,
    pub warning_false_positive_rate: f64,
    pub warning_latency_ms: f64,
    pub warning_detection_rate: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            critical_alert_count: 5,
            critical_false_positive_rate: 0.30,
            critical_latency_ms: 5000.0,
            critical_detection_rate: 0.50,
            warning_alert_count: 10,
            warning_false_positive_rate: 0.15,
            warning_latency_ms: 2000.0,
            warning_detection_rate: 0.30,
        }
    }
}

// ── Driver simulation ───────────────────────────────────────────────────────

/// Synthetic response-time model for the snapshot log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyModel {
    pub base_ms: f64,
    pub jitter_ms: f64,
    /// Added when the signature lookup returned a match worth reviewing.
    pub signature_lookup_ms: f64,
    /// Added for CRITICAL transactions (deeper checks).
    pub critical_review_ms: f64,
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self {
            base_ms: 80.0,
            jitter_ms: 220.0,
            signature_lookup_ms: 150.0,
            critical_review_ms: 400.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimMerchant {
    pub merchant_id: String,
    pub name:        String,
    pub category:    String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub customer_id:      String,
    pub merchants:        Vec<SimMerchant>,
    pub locations:        Vec<String>,
    pub baseline_history: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct EngineConfigFile {
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    alerts: AlertThresholds,
    #[serde(default)]
    health: HealthThresholds,
    #[serde(default)]
    latency: LatencyModel,
    simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct FraudCasesFile {
    cases: Vec<FraudCase>,
}

#[derive(Debug, Clone, Deserialize)]
struct PoliciesFile {
    policies: Vec<Policy>,
}

#[derive(Debug, Clone, Deserialize)]
struct SanctionsFile {
    entities: Vec<SanctionEntity>,
}

#[derive(Debug, Clone, Deserialize)]
struct MerchantRatingsFile {
    merchants: Vec<MerchantRating>,
}

#[derive(Debug, Clone, Deserialize)]
struct CustomerPoliciesFile {
    customers: Vec<CustomerPolicy>,
}

#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub scoring:    ScoringConfig,
    pub alerts:     AlertThresholds,
    pub health:     HealthThresholds,
    pub latency:    LatencyModel,
    pub simulation: SimulationConfig,
    pub seed_cases: KnowledgeBase,
    pub reference:  ReferenceData,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let engine: EngineConfigFile = read_json(&format!("{data_dir}/engine/engine_config.json"))?;
        let cases: FraudCasesFile = read_json(&format!("{data_dir}/knowledge/fraud_cases.json"))?;
        let policies: PoliciesFile = read_json(&format!("{data_dir}/reference/policies.json"))?;
        let sanctions: SanctionsFile = read_json(&format!("{data_dir}/reference/sanctions.json"))?;
        let merchants: MerchantRatingsFile =
            read_json(&format!("{data_dir}/reference/merchant_ratings.json"))?;
        let customers: CustomerPoliciesFile =
            read_json(&format!("{data_dir}/reference/customer_policies.json"))?;

        if engine.simulation.merchants.is_empty() {
            anyhow::bail!("engine_config.json: simulation.merchants must not be empty");
        }

        Ok(Self {
            scoring: engine.scoring,
            alerts: engine.alerts,
            health: engine.health,
            latency: engine.latency,
            simulation: engine.simulation,
            seed_cases: KnowledgeBase::new(cases.cases),
            reference: ReferenceData::new(
                policies.policies,
                sanctions.entities,
                merchants.merchants,
                customers.customers,
            ),
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let merchant = |id: &str, name: &str, category: &str| SimMerchant {
            merchant_id: id.into(),
            name: name.into(),
            category: category.into(),
        };
        let case = |id: &str, narrative: &str, merchant: &str, case_type: &str| FraudCase {
            id: id.into(),
            narrative: narrative.into(),
            merchant: merchant.into(),
            case_type: case_type.into(),
            vector_id: Some(format!("vec-{id}")),
            analyst_notes: None,
        };

        Self {
            scoring: ScoringConfig::default(),
            alerts: AlertThresholds::default(),
            health: HealthThresholds::default(),
            latency: LatencyModel::default(),
            simulation: SimulationConfig {
                customer_id: "CUST-1001".into(),
                merchants: vec![
                    merchant("M-100", "Corner Grocery", "groceries"),
                    merchant("M-101", "City Transit", "transport"),
                    merchant("M-102", "Blue Bottle Cafe", "dining"),
                    merchant("M-103", "Harbor Pharmacy", "health"),
                ],
                locations: vec![
                    "Seattle, US".into(),
                    "Portland, US".into(),
                    "Vancouver, CA".into(),
                ],
                baseline_history: vec![42.0, 55.0, 38.5, 61.0, 47.25, 52.0, 44.0, 58.5, 49.0, 40.0],
            },
            seed_cases: KnowledgeBase::new(vec![
                case(
                    "FC-001",
                    "Card-not-present purchase of gift cards immediately after password reset",
                    "GiftCardMall Online",
                    "ACCOUNT_TAKEOVER",
                ),
                case(
                    "FC-002",
                    "Series of small test charges followed by a large crypto exchange deposit",
                    "CoinSwap Crypto Exchange",
                    "CARD_TESTING",
                ),
                case(
                    "FC-003",
                    "Urgent wire transfer requested by a spoofed executive email",
                    "Global Wire Transfer Services",
                    "BUSINESS_EMAIL_COMPROMISE",
                ),
            ]),
            reference: ReferenceData::new(
                vec![Policy {
                    id: "POL-001".into(),
                    title: "High-value transaction review".into(),
                    category: "transaction_monitoring".into(),
                    description: "Transactions above $10,000 require analyst review.".into(),
                }],
                vec![SanctionEntity {
                    id: "SAN-001".into(),
                    name: "Oceanic Trading LLC".into(),
                    list: "OFAC_SDN".into(),
                    country: "IR".into(),
                    reason: "Sanctions evasion".into(),
                }],
                vec![MerchantRating {
                    name: "CoinSwap Crypto Exchange".into(),
                    category: "crypto".into(),
                    risk_rating: "high".into(),
                    chargeback_rate: 0.042,
                }],
                vec![CustomerPolicy {
                    customer_id: "CUST-1001".into(),
                    daily_limit: 5_000.0,
                    blocked_countries: vec!["KP".into(), "IR".into()],
                    allowed_countries: vec![],
                    compliance_status: ComplianceStatus::Verified,
                }],
            ),
        }
    }
}
