//! Alert generator tests: each rule on its own, severity ordering, and
//! stateless recomputation.

use chrono::{Duration, TimeZone, Utc};
use riskdesk_core::{
    alerts::{generate_alerts, Alert, AlertKind, AlertSeverity},
    config::AlertThresholds,
    metrics::DashboardMetrics,
    transaction::{RiskLevel, Transaction, TransactionStatus},
    types::Timestamp,
};
use std::collections::HashSet;

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

fn txn(id: &str, amount: f64, merchant: &str, risk_level: RiskLevel, age_secs: i64) -> Transaction {
    Transaction {
        id: id.to_string(),
        timestamp: now() - Duration::seconds(age_secs),
        amount,
        merchant: merchant.to_string(),
        merchant_id: "M-100".into(),
        narrative: String::new(),
        location: "Seattle, US".into(),
        ip: "10.0.0.1".into(),
        z_score: 0.0,
        velocity_score: 0.2,
        signature_match_score: 0.1,
        matched_case_id: None,
        risk_level,
        status: TransactionStatus::Pending,
    }
}

fn kinds(alerts: &[Alert]) -> Vec<AlertKind> {
    alerts.iter().map(|a| a.kind).collect()
}

fn find(alerts: &[Alert], kind: AlertKind) -> Option<&Alert> {
    alerts.iter().find(|a| a.kind == kind)
}

/// No transactions and no prior metrics produce no alerts.
#[test]
fn empty_input_no_alerts() {
    let alerts = generate_alerts(&[], None, &AlertThresholds::default(), now());
    assert!(alerts.is_empty(), "unexpected alerts: {alerts:?}");
}

/// Metric rules are skipped until metrics exist.
#[test]
fn metric_rules_need_prior_metrics() {
    let alerts = generate_alerts(
        &[txn("T1", 20.0, "Corner Grocery", RiskLevel::Low, 0)],
        None,
        &AlertThresholds::default(),
        now(),
    );
    assert!(alerts.is_empty(), "metric rules ran without metrics: {alerts:?}");
}

/// Detection rate escalates from WARNING to CRITICAL.
#[test]
fn detection_rate_severity() {
    let t = AlertThresholds::default();
    let metrics = |rate| DashboardMetrics { detection_rate: rate, ..Default::default() };

    let alerts = generate_alerts(&[], Some(&metrics(0.10)), &t, now());
    assert!(find(&alerts, AlertKind::DetectionRate).is_none(), "0.10 is not > 0.10");

    let alerts = generate_alerts(&[], Some(&metrics(0.15)), &t, now());
    let a = find(&alerts, AlertKind::DetectionRate).expect("detection alert");
    assert_eq!(a.severity, AlertSeverity::Warning);
    assert!(a.message.contains("15.0%"), "message: {}", a.message);

    let alerts = generate_alerts(&[], Some(&metrics(0.25)), &t, now());
    let a = find(&alerts, AlertKind::DetectionRate).expect("detection alert");
    assert_eq!(a.severity, AlertSeverity::Critical);
    assert!(a.transaction_id.is_none());
    assert_eq!(a.timestamp, now());
}

/// FPR above 0.20 raises a WARNING.
#[test]
fn false_positive_rate_warning() {
    let t = AlertThresholds::default();
    let m = DashboardMetrics { false_positive_rate: 0.21, ..Default::default() };
    let alerts = generate_alerts(&[], Some(&m), &t, now());
    let a = find(&alerts, AlertKind::FalsePositiveRate).expect("fpr alert");
    assert_eq!(a.severity, AlertSeverity::Warning);

    let m = DashboardMetrics { false_positive_rate: 0.20, ..Default::default() };
    let alerts = generate_alerts(&[], Some(&m), &t, now());
    assert!(find(&alerts, AlertKind::FalsePositiveRate).is_none());
}

/// Latency escalates above 3000ms and 5000ms.
#[test]
fn latency_severity() {
    let t = AlertThresholds::default();
    let m = |ms| DashboardMetrics { avg_response_time_ms: ms, ..Default::default() };

    assert!(find(&generate_alerts(&[], Some(&m(3000.0)), &t, now()), AlertKind::Latency).is_none());

    let alerts = generate_alerts(&[], Some(&m(3500.0)), &t, now());
    assert_eq!(find(&alerts, AlertKind::Latency).map(|a| a.severity), Some(AlertSeverity::Warning));

    let alerts = generate_alerts(&[], Some(&m(5200.0)), &t, now());
    assert_eq!(find(&alerts, AlertKind::Latency).map(|a| a.severity), Some(AlertSeverity::Critical));
}

/// Only the first (most recent) high-value CRITICAL transaction alerts.
#[test]
fn high_value_critical_uses_first_match() {
    let txns = vec![
        txn("T3", 9_000.0, "Corner Grocery", RiskLevel::Critical, 0),
        txn("T2", 12_500.0, "Corner Grocery", RiskLevel::Critical, 5),
        txn("T1", 20_000.0, "Corner Grocery", RiskLevel::Critical, 10),
    ];
    let alerts = generate_alerts(&txns, None, &AlertThresholds::default(), now());
    let high: Vec<&Alert> = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::HighValueCritical)
        .collect();

    assert_eq!(high.len(), 1, "one high-value alert per call");
    assert_eq!(high[0].severity, AlertSeverity::Critical);
    assert_eq!(high[0].transaction_id.as_deref(), Some("T2"));
    assert_eq!(high[0].id, "ALERT-high_value_critical-T2");
}

/// A large amount that is not CRITICAL does not trip the high-value rule.
#[test]
fn high_value_requires_critical_risk() {
    let txns = vec![txn("T1", 50_000.0, "Corner Grocery", RiskLevel::Medium, 0)];
    let alerts = generate_alerts(&txns, None, &AlertThresholds::default(), now());
    assert!(find(&alerts, AlertKind::HighValueCritical).is_none());
}

/// Risky merchant keywords match case-insensitively.
#[test]
fn risky_merchant_case_insensitive() {
    let txns = vec![
        txn("T2", 30.0, "Corner Grocery", RiskLevel::Low, 0),
        txn("T1", 900.0, "Global WIRE Services", RiskLevel::Low, 5),
    ];
    let alerts = generate_alerts(&txns, None, &AlertThresholds::default(), now());
    let a = find(&alerts, AlertKind::RiskyMerchant).expect("risky merchant alert");
    assert_eq!(a.severity, AlertSeverity::Warning);
    assert_eq!(a.transaction_id.as_deref(), Some("T1"));
}

/// Velocity fires at five transactions in the recent window, not four.
#[test]
fn velocity_threshold() {
    let t = AlertThresholds::default();
    let make = |n: usize| -> Vec<Transaction> {
        (0..n)
            .map(|i| txn(&format!("T{i}"), 20.0, "Corner Grocery", RiskLevel::Low, i as i64))
            .collect()
    };

    assert!(find(&generate_alerts(&make(4), None, &t, now()), AlertKind::Velocity).is_none());
    let alerts = generate_alerts(&make(5), None, &t, now());
    assert_eq!(find(&alerts, AlertKind::Velocity).map(|a| a.severity), Some(AlertSeverity::Warning));
}

/// CRITICAL before WARNING; newest first within a severity.
#[test]
fn sorted_by_severity_then_recency() {
    let txns = vec![
        txn("T2", 15_000.0, "Corner Grocery", RiskLevel::Critical, 30),
        txn("T1", 40.0, "CoinSwap Crypto Exchange", RiskLevel::Low, 60),
    ];
    let m = DashboardMetrics {
        detection_rate: 0.5,
        false_positive_rate: 0.4,
        ..Default::default()
    };
    let alerts = generate_alerts(&txns, Some(&m), &AlertThresholds::default(), now());

    assert_eq!(
        kinds(&alerts),
        vec![
            AlertKind::DetectionRate,
            AlertKind::HighValueCritical,
            AlertKind::FalsePositiveRate,
            AlertKind::RiskyMerchant,
        ]
    );
    for pair in alerts.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.severity.rank() < b.severity.rank()
                || (a.severity == b.severity && a.timestamp >= b.timestamp),
            "out of order: {} before {}",
            a.id,
            b.id
        );
    }
}

/// Within a call, no two alerts share a kind and transaction.
#[test]
fn no_duplicate_alerts_within_a_call() {
    let txns: Vec<Transaction> = (0..12)
        .map(|i| txn(&format!("T{i}"), 25_000.0, "Crypto Wire Transfer", RiskLevel::Critical, i))
        .collect();
    let m = DashboardMetrics {
        detection_rate: 1.0,
        false_positive_rate: 0.9,
        avg_response_time_ms: 9000.0,
        ..Default::default()
    };
    let alerts = generate_alerts(&txns, Some(&m), &AlertThresholds::default(), now());

    let mut seen = HashSet::new();
    for a in &alerts {
        assert!(
            seen.insert((a.kind, a.transaction_id.clone())),
            "duplicate alert {:?} for {:?}",
            a.kind,
            a.transaction_id
        );
    }
    assert_eq!(alerts.len(), 6, "every rule fires exactly once");
}

/// Repeated calls on unchanged input give the same list; nothing is
/// remembered between calls.
#[test]
fn recomputation_is_stateless() {
    let txns = vec![txn("T1", 12_000.0, "CoinSwap Crypto Exchange", RiskLevel::Critical, 0)];
    let m = DashboardMetrics { detection_rate: 0.3, ..Default::default() };
    let t = AlertThresholds::default();

    let first = generate_alerts(&txns, Some(&m), &t, now());
    let second = generate_alerts(&txns, Some(&m), &t, now());
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}
