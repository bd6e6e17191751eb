//! Metrics aggregator: reduces the transaction list, the snapshot log and
//! the current alerts into one dashboard summary.
//!
//! Pure and full-recompute: the same inputs always produce the same
//! summary, whatever order the transactions arrive in.
//!
//! The confusion matrix is a live self-evaluation against analyst-set
//! status, not a held-out test set:
//!   TP = fraud case  AND status BLOCKED
//!   FP = fraud case  AND status ALLOWED
//!   FN = approved    AND risk CRITICAL
//!   TN = approved    AND risk LOW
//! where "fraud case" is risk CRITICAL or status BLOCKED and "approved" is
//! status ALLOWED.

use crate::{
    alerts::{Alert, AlertSeverity},
    config::HealthThresholds,
    metrics_log::SnapshotLog,
    transaction::{RiskLevel, Transaction, TransactionStatus},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemHealth {
    #[default]
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardMetrics {
    pub total_transactions: usize,
    pub fraud_cases:        usize,
    pub approved_cases:     usize,
    pub pending_cases:      usize,
    pub detection_rate:     f64,

    pub avg_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    pub throughput_tps:       f64,

    pub true_positives:      usize,
    pub false_positives:     usize,
    pub false_negatives:     usize,
    pub true_negatives:      usize,
    pub precision:           f64,
    pub recall:              f64,
    pub accuracy:            f64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,

    pub active_alerts:   usize,
    pub critical_alerts: usize,
    pub system_health:   SystemHealth,
}

pub fn aggregate_metrics(
    transactions: &[Transaction],
    snapshots: &SnapshotLog,
    alerts: &[Alert],
    health: &HealthThresholds,
) -> DashboardMetrics {
    let total = transactions.len();

    let is_fraud = |t: &Transaction| {
        t.risk_level == RiskLevel::Critical || t.status == TransactionStatus::Blocked
    };
    let is_approved = |t: &Transaction| t.status == TransactionStatus::Allowed;

    let fraud_cases = transactions.iter().filter(|t| is_fraud(t)).count();
    let approved_cases = transactions.iter().filter(|t| is_approved(t)).count();
    let pending_cases = transactions
        .iter()
        .filter(|t| matches!(t.status, TransactionStatus::Pending | TransactionStatus::Analyzing))
        .count();

    let tp = transactions
        .iter()
        .filter(|t| is_fraud(t) && t.status == TransactionStatus::Blocked)
        .count();
    let fp = transactions
        .iter()
        .filter(|t| is_fraud(t) && t.status == TransactionStatus::Allowed)
        .count();
    let fn_ = transactions
        .iter()
        .filter(|t| is_approved(t) && t.risk_level == RiskLevel::Critical)
        .count();
    let tn = transactions
        .iter()
        .filter(|t| is_approved(t) && t.risk_level == RiskLevel::Low)
        .count();

    let mut latencies: Vec<f64> = snapshots.iter().map(|s| s.response_time_ms).collect();
    latencies.sort_by(|a, b| a.total_cmp(b));
    let avg_latency = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    let max_latency = latencies.last().copied().unwrap_or(0.0);

    let detection_rate = ratio(fraud_cases, total);
    let false_positive_rate = ratio(fp, fp + tn);
    let critical_alerts = alerts
        .iter()
        .filter(|a| a.severity == AlertSeverity::Critical)
        .count();

    let system_health = classify_health(
        critical_alerts,
        alerts.len(),
        false_positive_rate,
        avg_latency,
        detection_rate,
        health,
    );

    DashboardMetrics {
        total_transactions: total,
        fraud_cases,
        approved_cases,
        pending_cases,
        detection_rate,
        avg_response_time_ms: avg_latency,
        max_response_time_ms: max_latency,
        p95_response_time_ms: percentile(&latencies, 0.95),
        p99_response_time_ms: percentile(&latencies, 0.99),
        throughput_tps: throughput(snapshots),
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        true_negatives: tn,
        precision: ratio(tp, tp + fp),
        recall: ratio(tp, tp + fn_),
        accuracy: ratio(tp + tn, total),
        false_positive_rate,
        false_negative_rate: ratio(fn_, fn_ + tp),
        active_alerts: alerts.len(),
        critical_alerts,
        system_health,
    }
}

/// First match wins: CRITICAL, then WARNING, else NORMAL.
pub fn classify_health(
    critical_alerts: usize,
    total_alerts: usize,
    false_positive_rate: f64,
    avg_latency_ms: f64,
    detection_rate: f64,
    t: &HealthThresholds,
) -> SystemHealth {
    if critical_alerts > t.critical_alert_count
        || false_positive_rate > t.critical_false_positive_rate
        || avg_latency_ms > t.critical_latency_ms
        || detection_rate > t.critical_detection_rate
    {
        SystemHealth::Critical
    } else if total_alerts > t.warning_alert_count
        || false_positive_rate > t.warning_false_positive_rate
        || avg_latency_ms > t.warning_latency_ms
        || detection_rate > t.warning_detection_rate
    {
        SystemHealth::Warning
    } else {
        SystemHealth::Normal
    }
}

/// Nearest-rank percentile over ascending `sorted` values:
/// index = ceil(n * p) - 1, rounded to the nearest integer. 0 when empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() as f64 * p).ceil() as usize;
    let idx = rank.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx].round()
}

/// Samples per second between the earliest and latest sample.
fn throughput(snapshots: &SnapshotLog) -> f64 {
    if snapshots.len() < 2 {
        return 0.0;
    }
    let mut stamps: Vec<_> = snapshots.iter().map(|s| s.timestamp).collect();
    stamps.sort();
    let (first, last) = match (stamps.first(), stamps.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return 0.0,
    };
    let elapsed = (last - first).num_milliseconds() as f64 / 1000.0;
    if elapsed <= 0.0 {
        return 0.0;
    }
    snapshots.len() as f64 / elapsed
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        (num as f64 / den as f64).clamp(0.0, 1.0)
    }
}
