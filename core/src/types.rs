//! Shared primitive types used across the entire engine.

use chrono::{DateTime, Utc};

/// One driver step. One tick = one generated transaction.
pub type Tick = u64;

/// A stable, unique identifier for any entity in the engine.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Every timestamp the engine produces is UTC.
pub type Timestamp = DateTime<Utc>;
