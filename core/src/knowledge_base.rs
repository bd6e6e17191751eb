//! Fraud-case knowledge base and the analyst feedback loop.
//!
//! RULE: append-only. Existing cases are never edited or removed; a
//! confirmed transaction becomes a new case whose id is derived from the
//! transaction id.

use crate::{rng::RandomSource, transaction::Transaction, types::EntityId};
use serde::{Deserialize, Serialize};

/// Type tag for every case created from analyst feedback.
pub const ANALYST_CONFIRMED: &str = "ANALYST_CONFIRMED";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudCase {
    pub id:        EntityId,
    pub narrative: String,
    pub merchant:  String,
    #[serde(rename = "type")]
    pub case_type: String,
    /// Embedding id. `None` until the external embedding job has run.
    #[serde(default)]
    pub vector_id: Option<String>,
    #[serde(default)]
    pub analyst_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    cases: Vec<FraudCase>,
}

impl KnowledgeBase {
    /// Build from seed cases. Later duplicates of an id are dropped so ids
    /// stay unique.
    pub fn new(seed: Vec<FraudCase>) -> Self {
        let mut kb = Self::default();
        for case in seed {
            if kb.get(&case.id).is_some() {
                log::warn!("Dropping duplicate seed case {}", case.id);
                continue;
            }
            kb.cases.push(case);
        }
        kb
    }

    pub fn cases(&self) -> &[FraudCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FraudCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Pick a case uniformly. `None` on an empty knowledge base.
    pub fn pick(&self, rng: &mut dyn RandomSource) -> Option<&FraudCase> {
        if self.cases.is_empty() {
            return None;
        }
        self.cases.get(rng.below(self.cases.len()))
    }

    /// Turn an analyst-confirmed transaction into a new case and append it.
    ///
    /// The id is `CASE-<transaction id>`; if the same transaction is
    /// confirmed again a numeric suffix keeps the id unique.
    pub fn add_case(&mut self, txn: &Transaction, notes: &str) -> &FraudCase {
        let base = format!("CASE-{}", txn.id);
        let mut id = base.clone();
        let mut n = 2;
        while self.get(&id).is_some() {
            id = format!("{base}-{n}");
            n += 1;
        }

        let notes = notes.trim();
        self.cases.push(FraudCase {
            id,
            narrative: txn.narrative.clone(),
            merchant:  txn.merchant.clone(),
            case_type: ANALYST_CONFIRMED.to_string(),
            vector_id: None,
            analyst_notes: if notes.is_empty() { None } else { Some(notes.to_string()) },
        });

        let case = &self.cases[self.cases.len() - 1];
        log::debug!("Knowledge base grew to {} cases ({})", self.cases.len(), case.id);
        case
    }
}
