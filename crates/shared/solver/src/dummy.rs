use gridflex_core::{AllocResult, Allocation, FlexConstraints};
use gridflex_ports::AllocationSolver;

/// Solver that never activates anybody
///
/// Returns an all-false allocation over the horizon with objective `-1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummySolver;

impl DummySolver {
    pub fn new() -> Self {
        Self
    }
}

impl AllocationSolver for DummySolver {
    fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
        AllocResult::Allocation(Allocation::idle(
            constraints.providers() as usize,
            constraints.horizon_slots() as usize,
        ))
    }

    fn name(&self) -> &str {
        "dummy"
    }
}

/// Solver that reports every problem as infeasible
#[derive(Debug, Clone, Copy, Default)]
pub struct InfeasibleSolver;

impl InfeasibleSolver {
    pub fn new() -> Self {
        Self
    }
}

impl AllocationSolver for InfeasibleSolver {
    fn solve(&self, _constraints: &FlexConstraints) -> AllocResult {
        AllocResult::Infeasible
    }

    fn name(&self) -> &str {
        "infeasible"
    }
}
