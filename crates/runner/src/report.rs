//! Experiment bookkeeping

use chrono::{DateTime, Utc};
use gridflex_core::{ProfileKey, Seed};
use gridflex_ports::Writable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A replication that ended in an error instead of an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationFault {
    pub profile: ProfileKey,
    pub replication: u32,
    pub seed: Seed,
    pub message: String,
}

/// What an experiment ran and how it ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub experiment_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Profiles selected for sampling
    pub profiles: usize,
    /// Replications handed to a worker
    pub dispatched: u64,
    /// Replications whose outcome was recorded
    pub completed: u64,
    pub faults: Vec<ReplicationFault>,
    /// Dispatch stopped because of a cancellation request
    pub cancelled: bool,
    /// Dispatch stopped because of a fault under the fail-fast policy
    pub aborted: bool,
}

impl ExperimentReport {
    pub(crate) fn start(profiles: usize) -> Self {
        let now = Utc::now();
        Self {
            experiment_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            profiles,
            dispatched: 0,
            completed: 0,
            faults: Vec::new(),
            cancelled: false,
            aborted: false,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// True when every dispatched replication was recorded
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.completed == self.dispatched
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl Writable for ExperimentReport {
    fn format_result(&self) -> String {
        let mut out = format!(
            "Experiment {}: {} profiles, {}/{} replications recorded in {} ms\n",
            self.experiment_id,
            self.profiles,
            self.completed,
            self.dispatched,
            self.elapsed().num_milliseconds()
        );
        if self.cancelled {
            out.push_str("Cancelled\n");
        }
        if self.aborted {
            out.push_str("Aborted after fault\n");
        }
        for fault in &self.faults {
            out.push_str(&format!(
                "Fault {} #{} (seed {}): {}\n",
                fault.profile, fault.replication, fault.seed, fault.message
            ));
        }
        out
    }
}
