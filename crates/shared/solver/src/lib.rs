//! Gridflex Solvers
//!
//! Reference implementations of the allocation solver port. The production
//! optimizer lives outside this workspace; these cover testing and baselines,
//! plus decorators for memoized and serialized access to any solver.

mod dummy;
mod greedy;
mod memoizing;
mod serialized;

pub use dummy::{DummySolver, InfeasibleSolver};
pub use greedy::GreedySolver;
pub use memoizing::{MemoizationCache, MemoizingSolver};
pub use serialized::SerializedSolver;

// Re-export the trait from ports for convenience
pub use gridflex_ports::AllocationSolver;

/// Names accepted by [`create_solver`]
pub const SOLVER_NAMES: [&str; 3] = ["greedy", "dummy", "infeasible"];

/// Factory function to create reference solvers by name
///
/// `None` for a name no reference solver answers to.
pub fn create_solver(solver_type: &str) -> Option<Box<dyn AllocationSolver>> {
    match solver_type.to_lowercase().as_str() {
        "greedy" => Some(Box::new(GreedySolver::new())),
        "dummy" => Some(Box::new(DummySolver::new())),
        "infeasible" => Some(Box::new(InfeasibleSolver::new())),
        _ => None,
    }
}
