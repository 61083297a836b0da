//! Gridflex Game Engine
//!
//! Aggregates replication outcomes into an empirical payoff table:
//! - `HeuristicSymmetricPayoffMatrix` - concurrent per-profile running statistics
//! - `RunningStats` / `ConfidenceLevel` - streaming mean, variance and intervals
//! - `combinatorics` - enumeration of symmetric profiles
//! - `EvolutionaryGameDynamics` - replicator-dynamics coefficients
//! - `GameResult` - described results handed to report writers

pub mod combinatorics;
pub mod dynamics;
pub mod error;
pub mod matrix;
pub mod result;
pub mod stats;

pub use dynamics::EvolutionaryGameDynamics;
pub use error::{GameError, PayoffResult};
pub use matrix::{
    HeuristicSymmetricPayoffMatrix, PayoffEntry, PayoffEstimate, PayoffSnapshot, PayoffVisitor,
};
pub use result::GameResult;
pub use stats::{ConfidenceLevel, RunningStats};

// Re-export the reporting ports for convenience
pub use gridflex_ports::{Visitable, Writable};
