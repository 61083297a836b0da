use gridflex_core::{AllocResult, FlexConstraints};

/// Port for the external allocation optimizer
///
/// An infeasible problem is a regular result ([`AllocResult::Infeasible`]),
/// not an error. Implementations that are not safe to call from several
/// threads at once must be declared non-reentrant to the game director.
pub trait AllocationSolver: Send + Sync {
    fn solve(&self, constraints: &FlexConstraints) -> AllocResult;

    fn name(&self) -> &str;
}
