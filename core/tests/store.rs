//! SQLite store tests: event log ordering, snapshots, audit and fraud-case
//! tables.

use chrono::{TimeZone, Utc};
use riskdesk_core::{
    event::EventLogEntry,
    knowledge_base::FraudCase,
    reference::AuditEntry,
    store::SimStore,
};

fn store() -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_run("run-1", 42, "0.1.0-test").expect("insert run");
    store
}

fn event(tick: u64, event_type: &str, payload: &str) -> EventLogEntry {
    EventLogEntry {
        id: None,
        run_id: "run-1".into(),
        tick,
        source: "engine".into(),
        event_type: event_type.into(),
        payload: payload.into(),
    }
}

/// Events come back for their tick only, in insertion order.
#[test]
fn events_by_tick_in_order() {
    let s = store();
    s.append_event(&event(1, "tick_started", "a")).unwrap();
    s.append_event(&event(1, "transaction_scored", "b")).unwrap();
    s.append_event(&event(2, "tick_started", "c")).unwrap();

    let tick1 = s.events_for_tick("run-1", 1).unwrap();
    let payloads: Vec<&str> = tick1.iter().map(|e| e.payload.as_str()).collect();
    assert_eq!(payloads, vec!["a", "b"]);
    assert!(tick1.iter().all(|e| e.id.is_some()));

    assert_eq!(s.event_count("run-1", "tick_started").unwrap(), 2);
    assert_eq!(s.event_count("run-1", "case_added").unwrap(), 0);
}

/// Events for an unknown run violate the foreign key.
#[test]
fn events_require_registered_run() {
    let s = store();
    let mut orphan = event(1, "tick_started", "x");
    orphan.run_id = "run-missing".into();
    assert!(s.append_event(&orphan).is_err());
}

/// The latest snapshot at or before a tick is returned.
#[test]
fn latest_snapshot_lookup() {
    let s = store();
    assert!(s.latest_snapshot_before("run-1", 500).unwrap().is_none());

    s.save_snapshot("run-1", 100, "{\"tick\":100}").unwrap();
    s.save_snapshot("run-1", 200, "{\"tick\":200}").unwrap();

    assert_eq!(
        s.latest_snapshot_before("run-1", 199).unwrap(),
        Some((100, "{\"tick\":100}".to_string()))
    );
    assert_eq!(s.latest_snapshot_before("run-1", 200).unwrap().map(|(t, _)| t), Some(200));
}

/// Audit entries survive the round trip with their timestamp.
#[test]
fn audit_entries_roundtrip() {
    let s = store();
    let entry = AuditEntry {
        entry_id: "audit-1".into(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 42).unwrap(),
        actor: "analyst".into(),
        action: "status_change".into(),
        target_id: "TXN-000021".into(),
        details: "PENDING -> BLOCKED".into(),
    };
    s.append_audit("run-1", 21, &entry).unwrap();

    assert_eq!(s.audit_entries("run-1").unwrap(), vec![entry.clone()]);
    assert!(s.append_audit("run-1", 22, &entry).is_err(), "entry ids are unique");
}

/// Run-added fraud cases are stored with optional fields intact.
#[test]
fn fraud_cases_roundtrip() {
    let s = store();
    let case = FraudCase {
        id: "CASE-TXN-000007".into(),
        narrative: "dining purchase at Blue Bottle Cafe for $812.00".into(),
        merchant: "Blue Bottle Cafe".into(),
        case_type: "ANALYST_CONFIRMED".into(),
        vector_id: None,
        analyst_notes: Some("card reported stolen".into()),
    };
    s.insert_fraud_case("run-1", 7, &case).unwrap();

    assert_eq!(s.fraud_cases("run-1").unwrap(), vec![case.clone()]);
    assert!(s.insert_fraud_case("run-1", 8, &case).is_err(), "case ids are unique per run");
}

/// The path-based constructor turns on WAL and foreign keys without error.
#[test]
fn open_by_path_applies_pragmas() {
    let s = SimStore::open(":memory:").expect("open");
    s.migrate().expect("migration");
    s.insert_run("run-1", 42, "0.1.0-test").expect("insert run");

    let mut orphan = event(1, "tick_started", "x");
    orphan.run_id = "run-missing".into();
    assert!(s.append_event(&orphan).is_err(), "foreign keys enforced");
    s.append_event(&event(1, "tick_started", "y")).expect("append");
    assert_eq!(s.event_count("run-1", "tick_started").unwrap(), 1);
}
