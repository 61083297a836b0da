//! Gridflex Runner - Empirical Game Experiments
//!
//! Runs every selected strategy profile many times and aggregates the
//! outcomes into a payoff matrix:
//!
//! - **Config**: experiment parameters, JSON loadable
//! - **Director**: profile selection, worker pool, fault policy, cancellation
//! - **Report**: what ran, what failed, when
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │     GameDirector     │
//!                 │ (profiles × samples) │
//!                 └──────────┬───────────┘
//!                            │ semaphore (concurrency permits)
//!            ┌───────────────┼───────────────┐
//!            ▼               ▼               ▼
//!     ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!     │ RunExecutor │ │ RunExecutor │ │ RunExecutor │   blocking pool
//!     └──────┬──────┘ └──────┬──────┘ └──────┬──────┘
//!            │ solve         │               │
//!            ▼               ▼               ▼
//!     ┌──────────────────────────────────────────────┐
//!     │   AllocationSolver (serialized if needed)    │
//!     └──────────────────────────────────────────────┘
//!            │ SampleOutcome
//!            ▼
//!     ┌──────────────────────────────────────────────┐
//!     │       HeuristicSymmetricPayoffMatrix         │
//!     └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod director;
pub mod error;
pub mod report;

// Re-export main types
pub use config::{DirectorConfig, ProfileSelection};
pub use director::{CancelHandle, ExperimentSummary, GameDirector, replication_seed};
pub use error::{DirectorError, DirectorResult};
pub use report::{ExperimentReport, ReplicationFault};
