use gridflex_core::{AllocResult, Allocation, FlexConstraints};
use gridflex_ports::AllocationSolver;

/// Earliest-fit activation planner
///
/// Gives every provider exactly the required number of activations,
/// separated by the mandatory rest time. Providers are staggered by one
/// activation length where the horizon leaves room, so the grid is not
/// served by everybody in the same slots. The objective is the number of
/// activated provider-slots.
///
/// The problem is infeasible when one provider cannot fit the required
/// activations into the horizon.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }

    fn plan_provider(provider: usize, constraints: &FlexConstraints, slack: usize) -> Vec<bool> {
        let horizon = constraints.horizon_slots() as usize;
        let duration = constraints.activation_duration() as usize;
        let period = duration + constraints.inter_activation_time() as usize;
        let offset = (provider * duration) % (slack + 1);

        let mut schedule = vec![false; horizon];
        for activation in 0..constraints.required_activations() as usize {
            let start = offset + activation * period;
            for slot in schedule.iter_mut().skip(start).take(duration) {
                *slot = true;
            }
        }
        schedule
    }
}

impl AllocationSolver for GreedySolver {
    fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
        let providers = constraints.providers() as usize;
        let required = constraints.required_activations();

        if required > constraints.max_feasible_activations() {
            log::trace!(
                "greedy: {} activations required, at most {} fit",
                required,
                constraints.max_feasible_activations()
            );
            return AllocResult::Infeasible;
        }

        let duration = constraints.activation_duration() as usize;
        let rest = constraints.inter_activation_time() as usize;
        let used = if required == 0 {
            0
        } else {
            required as usize * duration + (required as usize - 1) * rest
        };
        let slack = (constraints.horizon_slots() as usize).saturating_sub(used);

        let activations: Vec<Vec<bool>> = (0..providers)
            .map(|p| Self::plan_provider(p, constraints, slack))
            .collect();
        let objective = activations.iter().flatten().filter(|a| **a).count() as f64;

        AllocResult::Allocation(Allocation::new(activations, objective))
    }

    fn name(&self) -> &str {
        "greedy"
    }
}
