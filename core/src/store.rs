//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods and never executes SQL directly.

use rusqlite::{params, types::Type, Connection, OptionalExtension};
use crate::{
    error::DeskResult,
    event::EventLogEntry,
    knowledge_base::FraudCase,
    reference::AuditEntry,
    types::Tick,
};
use chrono::{DateTime, Utc};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the run database at `path`.
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, 0i64],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, tick, source, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.run_id,
                entry.tick as i64,
                entry.source,
                entry.event_type,
                entry.payload,
                entry.tick as i64,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, run_id: &str, tick: Tick) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, tick, source, event_type, payload
             FROM event_log WHERE run_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, tick as i64], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    tick:       row.get::<_, i64>(2)? as u64,
                    source:     row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> DeskResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, run_id: &str, tick: Tick, state_json: &str) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO snapshot (run_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![run_id, tick as i64, state_json],
        )?;
        Ok(())
    }

    pub fn latest_snapshot_before(
        &self,
        run_id: &str,
        tick: Tick,
    ) -> DeskResult<Option<(Tick, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT tick, state_json FROM snapshot
                 WHERE run_id = ?1 AND tick <= ?2
                 ORDER BY tick DESC LIMIT 1",
                params![run_id, tick as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }

    // ── Audit log ──────────────────────────────────────────────

    pub fn append_audit(&self, run_id: &str, tick: Tick, entry: &AuditEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO audit_log (entry_id, run_id, tick, timestamp, actor, action, target_id, details)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.entry_id,
                run_id,
                tick as i64,
                entry.timestamp.to_rfc3339(),
                entry.actor,
                entry.action,
                entry.target_id,
                entry.details,
            ],
        )?;
        Ok(())
    }

    /// Audit entries in insertion order.
    pub fn audit_entries(&self, run_id: &str) -> DeskResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, timestamp, actor, action, target_id, details
             FROM audit_log WHERE run_id = ?1
             ORDER BY rowid ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                let raw: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
                Ok(AuditEntry {
                    entry_id:  row.get(0)?,
                    timestamp,
                    actor:     row.get(2)?,
                    action:    row.get(3)?,
                    target_id: row.get(4)?,
                    details:   row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Knowledge base ─────────────────────────────────────────

    pub fn insert_fraud_case(&self, run_id: &str, tick: Tick, case: &FraudCase) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO fraud_case (
                case_id, run_id, case_type, narrative, merchant, vector_id, analyst_notes, created_tick
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                case.id,
                run_id,
                case.case_type,
                case.narrative,
                case.merchant,
                case.vector_id,
                case.analyst_notes,
                tick as i64,
            ],
        )?;
        Ok(())
    }

    /// Cases added during the run, in insertion order. Seed cases are not
    /// persisted.
    pub fn fraud_cases(&self, run_id: &str) -> DeskResult<Vec<FraudCase>> {
        let mut stmt = self.conn.prepare(
            "SELECT case_id, narrative, merchant, case_type, vector_id, analyst_notes
             FROM fraud_case WHERE run_id = ?1
             ORDER BY rowid ASC",
        )?;
        let cases = stmt
            .query_map(params![run_id], |row| {
                Ok(FraudCase {
                    id:            row.get(0)?,
                    narrative:     row.get(1)?,
                    merchant:      row.get(2)?,
                    case_type:     row.get(3)?,
                    vector_id:     row.get(4)?,
                    analyst_notes: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cases)
    }
}
