use serde::{Deserialize, Serialize};

/// Objective value reported for an infeasible problem
pub const INFEASIBLE_OBJECTIVE: f64 = -1.0;

/// Activation plan produced by an allocation solver
///
/// `activations[provider][slot]` is true when the provider is asked to
/// activate in that slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    activations: Vec<Vec<bool>>,
    objective: f64,
}

impl Allocation {
    pub fn new(activations: Vec<Vec<bool>>, objective: f64) -> Self {
        Self {
            activations,
            objective,
        }
    }

    /// Plan where nobody is ever activated
    pub fn idle(providers: usize, slots: usize) -> Self {
        Self::new(vec![vec![false; slots]; providers], INFEASIBLE_OBJECTIVE)
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn providers(&self) -> usize {
        self.activations.len()
    }

    /// Activation flags of one provider
    pub fn schedule(&self, provider: usize) -> Option<&[bool]> {
        self.activations.get(provider).map(Vec::as_slice)
    }

    pub fn is_active(&self, provider: usize, slot: usize) -> bool {
        self.activations
            .get(provider)
            .and_then(|s| s.get(slot))
            .copied()
            .unwrap_or(false)
    }

    /// Providers activated in `slot`
    pub fn active_providers(&self, slot: usize) -> Vec<usize> {
        (0..self.activations.len())
            .filter(|p| self.is_active(*p, slot))
            .collect()
    }

    /// All active (provider, slot) pairs, ordered by provider then slot
    pub fn activations(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.activations.iter().enumerate().flat_map(|(p, slots)| {
            slots
                .iter()
                .enumerate()
                .filter(|(_, active)| **active)
                .map(move |(s, _)| (p, s))
        })
    }

    /// Number of activated providers per slot
    pub fn total_activations_profile(&self) -> Vec<u32> {
        let slots = self.activations.iter().map(Vec::len).max().unwrap_or(0);
        let mut profile = vec![0u32; slots];
        for (_, slot) in self.activations() {
            profile[slot] += 1;
        }
        profile
    }

    pub fn total_activations(&self) -> usize {
        self.activations().count()
    }
}

/// Outcome of one solver invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AllocResult {
    Allocation(Allocation),
    Infeasible,
}

impl AllocResult {
    pub fn is_feasible(&self) -> bool {
        matches!(self, AllocResult::Allocation(_))
    }

    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            AllocResult::Allocation(a) => Some(a),
            AllocResult::Infeasible => None,
        }
    }

    /// Objective value, `-1` for an infeasible result
    pub fn objective(&self) -> f64 {
        match self {
            AllocResult::Allocation(a) => a.objective(),
            AllocResult::Infeasible => INFEASIBLE_OBJECTIVE,
        }
    }
}

impl From<Allocation> for AllocResult {
    fn from(allocation: Allocation) -> Self {
        AllocResult::Allocation(allocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Allocation {
        Allocation::new(
            vec![vec![true, false, true], vec![true, true, false]],
            12.0,
        )
    }

    #[test]
    fn test_active_providers() {
        let a = sample();
        assert_eq!(a.active_providers(0), vec![0, 1]);
        assert_eq!(a.active_providers(1), vec![1]);
        assert!(a.active_providers(7).is_empty());
        assert!(!a.is_active(5, 0));
    }

    #[test]
    fn test_activation_profile() {
        let a = sample();
        assert_eq!(a.total_activations_profile(), vec![2, 1, 1]);
        assert_eq!(a.total_activations(), 4);
        assert_eq!(
            a.activations().collect::<Vec<_>>(),
            vec![(0, 0), (0, 2), (1, 0), (1, 1)]
        );
    }

    #[test]
    fn test_infeasible_result() {
        let r = AllocResult::Infeasible;
        assert!(!r.is_feasible());
        assert!(r.allocation().is_none());
        assert_eq!(r.objective(), -1.0);

        let ok: AllocResult = Allocation::idle(2, 4).into();
        assert!(ok.is_feasible());
        assert_eq!(ok.allocation().map(Allocation::total_activations), Some(0));
    }
}
