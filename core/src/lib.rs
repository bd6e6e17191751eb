//! riskdesk-core: transaction risk scoring and metrics aggregation for a
//! fraud-review desk.
//!
//! Leaves first: `profile` (rolling baseline), `scorer` (behavioral +
//! signature risk), `metrics_log` (latency ring buffer), `metrics`
//! (dashboard KPIs and health), `alerts`, `knowledge_base` (fraud cases and
//! the feedback loop), `reference` (lookups and compliance). `engine` wires
//! them into the scoring loop and persists through `store`.

pub mod advisory;
pub mod alerts;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod knowledge_base;
pub mod metrics;
pub mod metrics_log;
pub mod profile;
pub mod reference;
pub mod rng;
pub mod scorer;
pub mod snapshot;
pub mod store;
pub mod transaction;
pub mod types;
