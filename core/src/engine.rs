//! The desk engine: drives the scoring loop for one monitored user.
//!
//! STEP ORDER (fixed, documented, never reordered):
//!   1. Score the next transaction against the current profile and
//!      knowledge base.
//!   2. Prepend it to the transaction list (cap 50).
//!   3. Fold its amount into the profile only if it scored LOW.
//!   4. Record a metrics snapshot (synthetic latency, fraud flag).
//!   5. Regenerate alerts from the previous metrics and the list.
//!   6. Re-aggregate metrics with the fresh alerts.
//!
//! RULES:
//!   - Single writer: every call takes `&mut self`, so the scorer always
//!     sees one consistent profile / knowledge-base snapshot.
//!   - All randomness flows through the RngBank.
//!   - All state changes are recorded in the event log.

use crate::{
    advisory::{advise, AdvisoryProvider, AdvisoryRequest, AdvisoryVerdict},
    alerts::{generate_alerts, Alert, AlertSeverity},
    clock::DeskClock,
    command::AnalystCommand,
    config::{DeskConfig, LatencyModel},
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
    knowledge_base::{FraudCase, KnowledgeBase},
    metrics::{aggregate_metrics, DashboardMetrics, SystemHealth},
    metrics_log::SnapshotLog,
    profile::UserProfile,
    reference::{check_compliance, AuditEntry, ComplianceCheck, ReferenceData},
    rng::{RandomSource, RngBank, StreamSlot, SubsystemRng},
    scorer::{ForcedScenario, RiskScorer, ScoreRequest},
    snapshot::{DeskSnapshot, SNAPSHOT_INTERVAL},
    store::SimStore,
    transaction::{RiskLevel, Transaction, TransactionLog, TransactionStatus},
    types::{RunId, Tick},
};
use serde::Serialize;

/// What a single step produced.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub transaction:      Transaction,
    pub response_time_ms: f64,
    pub events:           Vec<DeskEvent>,
}

pub struct DeskEngine {
    pub run_id:   RunId,
    pub clock:    DeskClock,
    pub rng_bank: RngBank,
    seed:         u64,
    config:       DeskConfig,

    scoring_rng:  SubsystemRng,
    latency_rng:  SubsystemRng,
    scenario_rng: SubsystemRng,

    profile:        UserProfile,
    knowledge_base: KnowledgeBase,
    transactions:   TransactionLog,
    snapshots:      SnapshotLog,
    alerts:         Vec<Alert>,
    metrics:        Option<DashboardMetrics>,
    reference:      ReferenceData,

    /// Chance per tick of an unrequested attack scenario.
    attack_rate:      f64,
    pending_scenario: Option<ForcedScenario>,

    pub store: SimStore,
}

impl DeskEngine {
    /// Wire an engine to an already migrated store and register the run.
    pub fn new(run_id: RunId, seed: u64, store: SimStore, config: DeskConfig) -> DeskResult<Self> {
        store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

        let rng_bank = RngBank::new(seed);
        let profile = UserProfile::new(config.simulation.baseline_history.clone());
        let knowledge_base = config.seed_cases.clone();
        let reference = config.reference.clone();

        Ok(Self {
            clock: DeskClock::new(run_id.clone()),
            scoring_rng: rng_bank.for_stream(StreamSlot::Scoring),
            latency_rng: rng_bank.for_stream(StreamSlot::Latency),
            scenario_rng: rng_bank.for_stream(StreamSlot::Scenario),
            rng_bank,
            seed,
            config,
            profile,
            knowledge_base,
            transactions: TransactionLog::new(),
            snapshots: SnapshotLog::new(),
            alerts: Vec::new(),
            metrics: None,
            reference,
            attack_rate: 0.0,
            pending_scenario: None,
            store,
            run_id,
        })
    }

    /// In-memory store and test config. Used by the integration tests.
    pub fn build_test(run_id: RunId, seed: u64) -> DeskResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Self::new(run_id, seed, store, DeskConfig::default_test())
    }

    pub fn set_attack_rate(&mut self, rate: f64) {
        self.attack_rate = rate.clamp(0.0, 1.0);
    }

    // ── Read access ────────────────────────────────────────────

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Most recent first.
    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn snapshots(&self) -> &SnapshotLog {
        &self.snapshots
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Current metrics. All zero / NORMAL before the first step.
    pub fn metrics(&self) -> DashboardMetrics {
        self.metrics.clone().unwrap_or_default()
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Compliance check against a customer's policy. `None` when the
    /// customer has no policy on file.
    pub fn check_customer_compliance(
        &self,
        customer_id: &str,
        amount: f64,
        country: &str,
    ) -> Option<ComplianceCheck> {
        self.reference
            .customer_policy(customer_id)
            .map(|p| check_compliance(p, amount, country))
    }

    // ── Driving ────────────────────────────────────────────────

    /// Advance one tick and score one transaction.
    pub fn tick(&mut self, forced: Option<ForcedScenario>) -> DeskResult<StepOutcome> {
        assert!(!self.clock.paused, "tick() called on paused engine");

        let current_tick = self.clock.advance();
        let now = self.clock.now;
        let mut events = vec![DeskEvent::TickStarted { tick: current_tick }];

        let forced = forced
            .or_else(|| self.pending_scenario.take())
            .or_else(|| self.roll_scenario());

        // 1. Score.
        let request = ScoreRequest {
            id: format!("TXN-{current_tick:06}"),
            timestamp: now,
            forced,
        };
        let txn = RiskScorer::new(&self.config.scoring, &self.config.simulation).score(
            &self.profile,
            &self.knowledge_base,
            request,
            &mut self.scoring_rng,
        )?;

        // 2. Record.
        self.transactions.push(txn.clone());

        // 3. Baseline only learns from LOW-risk amounts.
        if txn.risk_level == RiskLevel::Low {
            self.profile = self.profile.update(txn.amount);
            log::debug!(
                "tick={current_tick} baseline mean={:.2} sd={:.2} n={}",
                self.profile.mean(),
                self.profile.std_dev(),
                self.profile.len()
            );
            events.push(DeskEvent::BaselineUpdated {
                tick: current_tick,
                mean: self.profile.mean(),
                std_dev: self.profile.std_dev(),
                window: self.profile.len(),
            });
        }

        // 4. Snapshot.
        let response_time_ms = simulate_latency(&self.config.latency, &txn, &mut self.latency_rng);
        self.snapshots
            .record_at(now, response_time_ms, txn.risk_level == RiskLevel::Critical);

        events.insert(
            1,
            DeskEvent::TransactionScored {
                tick: current_tick,
                transaction_id: txn.id.clone(),
                amount: txn.amount,
                z_score: txn.z_score,
                signature_match_score: txn.signature_match_score,
                matched_case_id: txn.matched_case_id.clone(),
                risk_level: txn.risk_level,
                forced,
                response_time_ms,
            },
        );

        // 5 + 6. Alerts, then metrics.
        events.extend(self.recompute(current_tick));
        events.push(DeskEvent::TickCompleted { tick: current_tick });

        self.persist(current_tick, "engine", &events)?;

        if current_tick.is_multiple_of(SNAPSHOT_INTERVAL) {
            self.take_snapshot(current_tick)?;
        }

        Ok(StepOutcome {
            transaction: txn,
            response_time_ms,
            events,
        })
    }

    /// Run n ticks in a loop. Used for testing and batch runs.
    pub fn run_ticks(&mut self, n: u64) -> DeskResult<()> {
        // Emit RunInitialized at tick 0 so seed differences are observable.
        if self.clock.current_tick == 0 {
            let init = DeskEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
            };
            self.persist(0, "engine", &[init])?;
        }
        self.clock.resume();
        for _ in 0..n {
            self.tick(None)?;
        }
        self.clock.pause();
        Ok(())
    }

    // ── Analyst actions ────────────────────────────────────────

    /// Change a transaction's review status and audit it.
    pub fn set_status(
        &mut self,
        transaction_id: &str,
        status: TransactionStatus,
        actor: &str,
    ) -> DeskResult<Transaction> {
        let tick = self.clock.current_tick;
        let from = self
            .transactions
            .get(transaction_id)
            .map(|t| t.status)
            .ok_or_else(|| DeskError::TransactionNotFound { id: transaction_id.to_string() })?;
        let txn = self.transactions.set_status(transaction_id, status)?.clone();

        self.audit(
            actor,
            "status_change",
            transaction_id,
            format!("{} -> {}", from.as_str(), status.as_str()),
        )?;

        let mut events = vec![DeskEvent::StatusChanged {
            tick,
            transaction_id: transaction_id.to_string(),
            from,
            to: status,
            actor: actor.to_string(),
        }];
        events.extend(self.recompute(tick));
        self.persist(tick, "analyst", &events)?;

        Ok(txn)
    }

    /// Feedback loop: block the transaction and grow the knowledge base
    /// with a case derived from it.
    pub fn confirm_fraud(
        &mut self,
        transaction_id: &str,
        notes: &str,
        actor: &str,
    ) -> DeskResult<FraudCase> {
        let txn = self.set_status(transaction_id, TransactionStatus::Blocked, actor)?;
        let tick = self.clock.current_tick;

        let case = self.knowledge_base.add_case(&txn, notes).clone();
        self.store.insert_fraud_case(&self.run_id, tick, &case)?;
        self.audit(actor, "case_added", &case.id, format!("from {}", txn.id))?;
        self.persist(
            tick,
            "analyst",
            &[DeskEvent::CaseAdded {
                tick,
                case_id: case.id.clone(),
                transaction_id: txn.id.clone(),
            }],
        )?;

        Ok(case)
    }

    /// Ask the advisory collaborator about one transaction. Never fails
    /// because of the provider; only an unknown id is an error.
    pub fn review(
        &mut self,
        transaction_id: &str,
        provider: Option<&dyn AdvisoryProvider>,
    ) -> DeskResult<AdvisoryVerdict> {
        let txn = self
            .transactions
            .get(transaction_id)
            .ok_or_else(|| DeskError::TransactionNotFound { id: transaction_id.to_string() })?;
        let matched_case = txn
            .matched_case_id
            .as_deref()
            .and_then(|id| self.knowledge_base.get(id));

        let verdict = advise(
            provider,
            &AdvisoryRequest {
                transaction: txn,
                matched_case,
            },
        );

        self.audit(
            "advisory",
            "advisory_review",
            transaction_id,
            format!(
                "{:?} ({}% confidence){}",
                verdict.recommended_action,
                verdict.confidence,
                if verdict.fallback { " [fallback]" } else { "" }
            ),
        )?;
        Ok(verdict)
    }

    /// Dispatch an analyst command.
    pub fn apply(&mut self, command: AnalystCommand) -> DeskResult<()> {
        let tick = self.clock.current_tick;
        self.persist(
            tick,
            "analyst",
            &[DeskEvent::CommandReceived {
                tick,
                command_type: command.type_name().to_string(),
            }],
        )?;

        match command {
            AnalystCommand::Pause => self.clock.pause(),
            AnalystCommand::Resume => self.clock.resume(),
            AnalystCommand::SetSpeed { speed } => {
                self.clock.set_speed(speed);
                self.persist(tick, "analyst", &[DeskEvent::SpeedChanged { tick, speed }])?;
            }
            AnalystCommand::SetStatus { transaction_id, status } => {
                self.set_status(&transaction_id, status, "analyst")?;
            }
            AnalystCommand::ConfirmFraud { transaction_id, notes } => {
                self.confirm_fraud(&transaction_id, &notes, "analyst")?;
            }
            AnalystCommand::InjectScenario { scenario } => {
                self.pending_scenario = Some(scenario);
            }
        }
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────

    /// Background attack injection. Draws nothing when the rate is 0.
    fn roll_scenario(&mut self) -> Option<ForcedScenario> {
        if self.attack_rate <= 0.0 || !self.scenario_rng.chance(self.attack_rate) {
            return None;
        }
        if self.scenario_rng.chance(0.5) {
            Some(ForcedScenario::Behavioral)
        } else {
            Some(ForcedScenario::Signature)
        }
    }

    /// Regenerate alerts from the previous metrics, then re-aggregate.
    fn recompute(&mut self, tick: Tick) -> Vec<DeskEvent> {
        let previous_health = self.metrics.as_ref().map(|m| m.system_health);

        self.alerts = generate_alerts(
            self.transactions.as_slice(),
            self.metrics.as_ref(),
            &self.config.alerts,
            self.clock.now,
        );
        let metrics = aggregate_metrics(
            self.transactions.as_slice(),
            &self.snapshots,
            &self.alerts,
            &self.config.health,
        );

        let mut events = vec![DeskEvent::AlertsRecomputed {
            tick,
            total: self.alerts.len(),
            critical: self
                .alerts
                .iter()
                .filter(|a| a.severity == AlertSeverity::Critical)
                .count(),
        }];

        let from = previous_health.unwrap_or(SystemHealth::Normal);
        if from != metrics.system_health {
            log::info!("tick={tick} system health {:?} -> {:?}", from, metrics.system_health);
            events.push(DeskEvent::HealthChanged {
                tick,
                from,
                to: metrics.system_health,
            });
        }

        self.metrics = Some(metrics);
        events
    }

    fn audit(&mut self, actor: &str, action: &str, target_id: &str, details: String) -> DeskResult<()> {
        let entry = AuditEntry {
            entry_id: uuid::Uuid::new_v4().to_string(),
            timestamp: self.clock.now,
            actor: actor.to_string(),
            action: action.to_string(),
            target_id: target_id.to_string(),
            details,
        };
        self.store.append_audit(&self.run_id, self.clock.current_tick, &entry)?;
        self.reference.append_audit(entry);
        Ok(())
    }

    fn persist(&self, tick: Tick, source: &str, events: &[DeskEvent]) -> DeskResult<()> {
        for event in events {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                tick,
                source:     source.to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(&self, tick: Tick) -> DeskResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(&self.run_id, tick)
    }

    fn take_snapshot(&self, tick: Tick) -> DeskResult<()> {
        let snapshot = DeskSnapshot {
            run_id: self.run_id.clone(),
            tick,
            clock: self.clock.clone(),
            profile: self.profile.clone(),
            knowledge_base_size: self.knowledge_base.len(),
            metrics: self.metrics.clone(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }
}

/// Synthetic end-to-end response time for one scored transaction.
fn simulate_latency(model: &LatencyModel, txn: &Transaction, rng: &mut dyn RandomSource) -> f64 {
    let mut ms = model.base_ms + rng.next_f64() * model.jitter_ms;
    if txn.matched_case_id.is_some() {
        ms += model.signature_lookup_ms;
    }
    if txn.risk_level == RiskLevel::Critical {
        ms += model.critical_review_ms;
    }
    ms.round()
}
