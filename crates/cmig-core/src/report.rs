//! Run counters. The final summary (counts per outcome and per skip
//! reason) is the only user-visible failure surface of a run.

use std::collections::BTreeMap;

use serde::Serialize;

/// Counters for one input file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseReport {
    pub label: String,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: BTreeMap<String, usize>,
}

impl PhaseReport {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn skip(&mut self, reason: &str) {
        *self.skipped.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Counters over classification outcomes and their materialization.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutcomeTally {
    pub paid_orders: usize,
    pub unpaid_orders: usize,
    /// Orders skipped because their reference already existed.
    pub order_skips: usize,
    pub copies: usize,
    /// Copies skipped because their code already existed.
    pub copy_skips: usize,
    pub published: usize,
    /// Withdrawals by unsold reason.
    pub withdrawn: BTreeMap<String, usize>,
}

impl OutcomeTally {
    pub fn withdraw(&mut self, reason: &str) {
        *self.withdrawn.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn withdrawn_total(&self) -> usize {
        self.withdrawn.values().sum()
    }

    pub fn orders_total(&self) -> usize {
        self.paid_orders + self.unpaid_orders
    }
}

/// The whole run's counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub phases: Vec<PhaseReport>,
    pub outcomes: OutcomeTally,
}

impl RunReport {
    pub fn phase(&self, label: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|phase| phase.label == label)
    }
}
