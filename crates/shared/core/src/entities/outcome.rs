use serde::{Deserialize, Serialize};

use crate::values::{Payoff, TimeCount};

/// Payoff assigned to every participant of a replication whose allocation
/// problem was infeasible
pub const INFEASIBLE_PAYOFF: Payoff = -1.0;

/// Realized result of one replication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    /// Payoff per participant (index = participant)
    pub payoffs: Vec<Payoff>,
    /// Clock count reached when the run ended
    pub time_count: TimeCount,
    /// False when the solver reported the allocation problem infeasible
    pub feasible: bool,
    /// System-level cost of flexibility that was requested but not delivered,
    /// NaN when the run had no allocation to deliver
    pub externality: f64,
}

impl SampleOutcome {
    /// Create a feasible outcome
    pub fn new(payoffs: Vec<Payoff>, time_count: TimeCount) -> Self {
        Self {
            payoffs,
            time_count,
            feasible: true,
            externality: 0.0,
        }
    }

    /// Degraded outcome for an infeasible allocation problem
    pub fn infeasible(participants: usize, time_count: TimeCount) -> Self {
        Self {
            payoffs: vec![INFEASIBLE_PAYOFF; participants],
            time_count,
            feasible: false,
            externality: f64::NAN,
        }
    }

    pub fn with_externality(mut self, externality: f64) -> Self {
        self.externality = externality;
        self
    }

    /// Number of participants covered by this outcome
    pub fn participants(&self) -> usize {
        self.payoffs.len()
    }

    pub fn payoff(&self, participant: usize) -> Option<Payoff> {
        self.payoffs.get(participant).copied()
    }

    /// Sum of all participants' payoffs
    pub fn total_payoff(&self) -> Payoff {
        self.payoffs.iter().sum()
    }
}
