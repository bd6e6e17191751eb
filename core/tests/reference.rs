//! Reference data tests: compliance rules, sanctions screening, lookups,
//! and loading the shipped data directory.

use riskdesk_core::{
    config::DeskConfig,
    reference::{check_compliance, ComplianceStatus, ComplianceViolation, CustomerPolicy},
};

fn policy(limit: f64, blocked: &[&str], allowed: &[&str], status: ComplianceStatus) -> CustomerPolicy {
    CustomerPolicy {
        customer_id: "CUST-T".into(),
        daily_limit: limit,
        blocked_countries: blocked.iter().map(|c| c.to_string()).collect(),
        allowed_countries: allowed.iter().map(|c| c.to_string()).collect(),
        compliance_status: status,
    }
}

/// A zero daily limit rejects any positive amount.
#[test]
fn zero_limit_rejects_any_amount() {
    let check = check_compliance(&policy(0.0, &[], &[], ComplianceStatus::Verified), 1.0, "US");
    assert!(!check.compliant);
    assert_eq!(
        check.violations,
        vec![ComplianceViolation::DailyLimitExceeded { amount: 1.0, daily_limit: 0.0 }]
    );
}

/// Every rule is evaluated; violations accumulate.
#[test]
fn all_violations_reported() {
    let p = policy(100.0, &["KP"], &["US", "CA"], ComplianceStatus::FailedKyc);
    let check = check_compliance(&p, 500.0, "KP");
    assert!(!check.compliant);
    assert_eq!(check.violations.len(), 4, "violations: {:?}", check.violations);
    assert!(check.violations.contains(&ComplianceViolation::FailedKyc));
    assert!(check
        .violations
        .contains(&ComplianceViolation::BlockedCountry { country: "KP".into() }));
    assert!(check
        .violations
        .contains(&ComplianceViolation::CountryNotAllowed { country: "KP".into() }));
}

/// A non-empty allowed list excludes everything else.
#[test]
fn allowed_list_is_exclusive() {
    let p = policy(1_000.0, &[], &["US", "CA"], ComplianceStatus::Verified);
    assert!(check_compliance(&p, 10.0, "CA").compliant);
    let check = check_compliance(&p, 10.0, "MX");
    assert_eq!(
        check.violations,
        vec![ComplianceViolation::CountryNotAllowed { country: "MX".into() }]
    );
}

/// Within limits, not blocked, verified: compliant.
#[test]
fn clean_transaction_is_compliant() {
    let p = policy(5_000.0, &["KP", "IR"], &[], ComplianceStatus::Verified);
    let check = check_compliance(&p, 5_000.0, "US");
    assert!(check.compliant, "amount equal to the limit is allowed");
    assert!(check.violations.is_empty());
    assert_eq!(
        ComplianceViolation::BlockedCountry { country: "IR".into() }.to_string(),
        "Country IR is blocked"
    );
}

/// Sanctions screening matches in both containment directions.
#[test]
fn sanctions_screen_both_directions() {
    let reference = DeskConfig::default_test().reference;

    let hits = reference.screen_sanctions("oceanic");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "SAN-001");

    let hits = reference.screen_sanctions("Payment to OCEANIC TRADING LLC via wire");
    assert_eq!(hits.len(), 1, "entity name inside the query");

    assert!(reference.screen_sanctions("Harbor Pharmacy").is_empty());
}

/// Merchant lookup ignores case but requires the whole name.
#[test]
fn merchant_lookup_is_exact() {
    let reference = DeskConfig::default_test().reference;
    let rating = reference.merchant("coinswap crypto exchange").expect("rating");
    assert_eq!(rating.risk_rating, "high");
    assert!(reference.merchant("CoinSwap").is_none());
}

/// Lookups miss with None, never an error.
#[test]
fn lookups_miss_with_none() {
    let reference = DeskConfig::default_test().reference;
    assert!(reference.policy("POL-001").is_some());
    assert!(reference.policy("POL-999").is_none());
    assert!(reference.customer_policy("CUST-1001").is_some());
    assert!(reference.customer_policy("CUST-0000").is_none());
    assert!(reference.audit_log().is_empty());
}

/// The shipped data directory parses into a usable config.
#[test]
fn shipped_data_loads() {
    let config = DeskConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/../data"))
        .expect("data/ should load");

    assert!(!config.simulation.merchants.is_empty());
    assert!(!config.simulation.baseline_history.is_empty());
    assert!(config.seed_cases.len() >= 3);
    assert!(config.reference.customer_policy("CUST-1001").is_some());
    assert_eq!(
        config
            .reference
            .customer_policy("CUST-1003")
            .map(|p| p.compliance_status),
        Some(ComplianceStatus::FailedKyc)
    );
    assert!(!config.reference.screen_sanctions("Volkov Holdings").is_empty());
}

/// A missing data directory is an error naming the file.
#[test]
fn missing_data_dir_is_error() {
    let err = DeskConfig::load("/nonexistent/riskdesk-data").unwrap_err();
    assert!(err.to_string().contains("engine_config.json"), "error: {err}");
}
