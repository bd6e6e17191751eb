//! Static reference tables: policies, sanctions, merchant ratings,
//! customer policies, and the append-only audit log.
//!
//! All lookups are read-only. A miss is `None` (or an empty list), never an
//! error.

use crate::types::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Tables ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    pub id:          String,
    pub title:       String,
    pub category:    String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionEntity {
    pub id:      String,
    pub name:    String,
    pub list:    String, // "OFAC_SDN" | "EU" | "UN" ...
    pub country: String,
    #[serde(default)]
    pub reason:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerchantRating {
    pub name:          String,
    pub category:      String,
    pub risk_rating:   String, // "low" | "medium" | "high"
    pub chargeback_rate: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Verified,
    Pending,
    FailedKyc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerPolicy {
    pub customer_id:       String,
    pub daily_limit:       f64,
    #[serde(default)]
    pub blocked_countries: Vec<String>,
    /// Empty means every country not blocked is allowed.
    #[serde(default)]
    pub allowed_countries: Vec<String>,
    pub compliance_status: ComplianceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub entry_id:  String,
    pub timestamp: Timestamp,
    pub actor:     String,
    pub action:    String,
    pub target_id: EntityId,
    pub details:   String,
}

// ── Compliance ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplianceViolation {
    DailyLimitExceeded { amount: f64, daily_limit: f64 },
    BlockedCountry { country: String },
    CountryNotAllowed { country: String },
    FailedKyc,
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyLimitExceeded { amount, daily_limit } => {
                write!(f, "Amount ${amount:.2} exceeds daily limit ${daily_limit:.2}")
            }
            Self::BlockedCountry { country } => write!(f, "Country {country} is blocked"),
            Self::CountryNotAllowed { country } => {
                write!(f, "Country {country} is not in the allowed list")
            }
            Self::FailedKyc => write!(f, "Customer failed KYC"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceCheck {
    pub compliant:  bool,
    pub violations: Vec<ComplianceViolation>,
}

/// Evaluate every rule; no rule short-circuits another.
pub fn check_compliance(policy: &CustomerPolicy, amount: f64, country: &str) -> ComplianceCheck {
    let mut violations = Vec::new();

    if amount > policy.daily_limit {
        violations.push(ComplianceViolation::DailyLimitExceeded {
            amount,
            daily_limit: policy.daily_limit,
        });
    }
    if policy.blocked_countries.iter().any(|c| c == country) {
        violations.push(ComplianceViolation::BlockedCountry { country: country.to_string() });
    }
    if !policy.allowed_countries.is_empty() && !policy.allowed_countries.iter().any(|c| c == country) {
        violations.push(ComplianceViolation::CountryNotAllowed { country: country.to_string() });
    }
    if policy.compliance_status == ComplianceStatus::FailedKyc {
        violations.push(ComplianceViolation::FailedKyc);
    }

    ComplianceCheck {
        compliant: violations.is_empty(),
        violations,
    }
}

// ── Reference data ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub policies:          Vec<Policy>,
    pub sanctions:         Vec<SanctionEntity>,
    pub merchants:         Vec<MerchantRating>,
    pub customer_policies: Vec<CustomerPolicy>,
    #[serde(default)]
    audit_log:             Vec<AuditEntry>,
}

impl ReferenceData {
    pub fn new(
        policies: Vec<Policy>,
        sanctions: Vec<SanctionEntity>,
        merchants: Vec<MerchantRating>,
        customer_policies: Vec<CustomerPolicy>,
    ) -> Self {
        Self {
            policies,
            sanctions,
            merchants,
            customer_policies,
            audit_log: Vec::new(),
        }
    }

    pub fn policy(&self, id: &str) -> Option<&Policy> {
        self.policies.iter().find(|p| p.id == id)
    }

    /// Case-insensitive containment in either direction: the query inside
    /// the entity name, or the entity name inside the query.
    pub fn screen_sanctions(&self, name: &str) -> Vec<&SanctionEntity> {
        let query = name.to_lowercase();
        self.sanctions
            .iter()
            .filter(|s| {
                let entity = s.name.to_lowercase();
                entity.contains(&query) || query.contains(&entity)
            })
            .collect()
    }

    /// Exact merchant name match, ignoring case.
    pub fn merchant(&self, name: &str) -> Option<&MerchantRating> {
        let query = name.to_lowercase();
        self.merchants.iter().find(|m| m.name.to_lowercase() == query)
    }

    pub fn customer_policy(&self, customer_id: &str) -> Option<&CustomerPolicy> {
        self.customer_policies.iter().find(|p| p.customer_id == customer_id)
    }

    pub fn append_audit(&mut self, entry: AuditEntry) {
        self.audit_log.push(entry);
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }
}
