//! Alert generator: derives prioritized alerts from the latest metrics and
//! the live transaction list.
//!
//! RULES:
//!   - Stateless. Every call recomputes the full list; nothing is
//!     deduplicated across calls, so a persisting condition re-emits the
//!     same alert each time.
//!   - Every rule is independent; all that apply are included.
//!   - Output is sorted by severity (CRITICAL first), then newest first.

use crate::{
    config::AlertThresholds,
    metrics::DashboardMetrics,
    transaction::{RiskLevel, Transaction},
    types::{EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl AlertSeverity {
    /// Sort rank: lower sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning  => 1,
            Self::Info     => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    DetectionRate,
    FalsePositiveRate,
    Latency,
    HighValueCritical,
    RiskyMerchant,
    Velocity,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectionRate     => "detection_rate",
            Self::FalsePositiveRate => "false_positive_rate",
            Self::Latency           => "latency",
            Self::HighValueCritical => "high_value_critical",
            Self::RiskyMerchant     => "risky_merchant",
            Self::Velocity          => "velocity",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id:             String,
    pub kind:           AlertKind,
    pub severity:       AlertSeverity,
    pub title:          String,
    pub message:        String,
    pub timestamp:      Timestamp,
    pub transaction_id: Option<EntityId>,
}

impl Alert {
    fn system(kind: AlertKind, severity: AlertSeverity, title: &str, message: String, now: Timestamp) -> Self {
        Self {
            id: format!("ALERT-{}-{}", kind.as_str(), now.timestamp_millis()),
            kind,
            severity,
            title: title.to_string(),
            message,
            timestamp: now,
            transaction_id: None,
        }
    }

    fn for_transaction(
        kind: AlertKind,
        severity: AlertSeverity,
        title: &str,
        message: String,
        txn: &Transaction,
    ) -> Self {
        Self {
            id: format!("ALERT-{}-{}", kind.as_str(), txn.id),
            kind,
            severity,
            title: title.to_string(),
            message,
            timestamp: txn.timestamp,
            transaction_id: Some(txn.id.clone()),
        }
    }
}

/// Generate alerts. `transactions` is newest first. Metric rules only run
/// when `prior` metrics are supplied.
pub fn generate_alerts(
    transactions: &[Transaction],
    prior: Option<&DashboardMetrics>,
    thresholds: &AlertThresholds,
    now: Timestamp,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(m) = prior {
        if m.detection_rate > thresholds.detection_rate_warning {
            let severity = if m.detection_rate > thresholds.detection_rate_critical {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            alerts.push(Alert::system(
                AlertKind::DetectionRate,
                severity,
                "Elevated fraud detection rate",
                format!("{:.1}% of recent transactions flagged as fraud", m.detection_rate * 100.0),
                now,
            ));
        }

        if m.false_positive_rate > thresholds.false_positive_rate_warning {
            alerts.push(Alert::system(
                AlertKind::FalsePositiveRate,
                AlertSeverity::Warning,
                "High false positive rate",
                format!(
                    "{:.1}% of legitimate activity is being flagged",
                    m.false_positive_rate * 100.0
                ),
                now,
            ));
        }

        if m.avg_response_time_ms > thresholds.latency_warning_ms {
            let severity = if m.avg_response_time_ms > thresholds.latency_critical_ms {
                AlertSeverity::Critical
            } else {
                AlertSeverity::Warning
            };
            alerts.push(Alert::system(
                AlertKind::Latency,
                severity,
                "Scoring latency degraded",
                format!("Average response time {:.0}ms", m.avg_response_time_ms),
                now,
            ));
        }
    }

    if let Some(txn) = transactions
        .iter()
        .find(|t| t.risk_level == RiskLevel::Critical && t.amount > thresholds.high_value_amount)
    {
        alerts.push(Alert::for_transaction(
            AlertKind::HighValueCritical,
            AlertSeverity::Critical,
            "High-value critical transaction",
            format!("${:.2} at {} scored CRITICAL", txn.amount, txn.merchant),
            txn,
        ));
    }

    if let Some(txn) = transactions.iter().find(|t| {
        let name = t.merchant.to_lowercase();
        thresholds
            .risky_merchant_keywords
            .iter()
            .any(|k| name.contains(&k.to_lowercase()))
    }) {
        alerts.push(Alert::for_transaction(
            AlertKind::RiskyMerchant,
            AlertSeverity::Warning,
            "High-risk merchant category",
            format!("Payment to {} (${:.2})", txn.merchant, txn.amount),
            txn,
        ));
    }

    let recent = transactions.iter().take(thresholds.velocity_window).count();
    if recent >= thresholds.velocity_count {
        alerts.push(Alert::system(
            AlertKind::Velocity,
            AlertSeverity::Warning,
            "Transaction velocity",
            format!("{recent} transactions in the most recent window"),
            now,
        ));
    }

    alerts.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });

    for alert in alerts.iter().filter(|a| a.severity == AlertSeverity::Critical) {
        log::info!("CRITICAL alert {}: {}", alert.id, alert.message);
    }

    alerts
}
