use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use gridflex_core::{AllocResult, FlexConstraints};
use gridflex_ports::AllocationSolver;

type Slot = Arc<OnceLock<AllocResult>>;

/// Solutions keyed by the exact problem they solve
///
/// Cheap to clone; clones share the same table, so several solvers (or
/// several experiments) can read one cache.
#[derive(Debug, Clone, Default)]
pub struct MemoizationCache {
    table: Arc<DashMap<FlexConstraints, Slot>>,
}

impl MemoizationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached solution of a problem, if one was stored
    pub fn get(&self, constraints: &FlexConstraints) -> Option<AllocResult> {
        self.table
            .get(constraints)
            .and_then(|slot| slot.get().cloned())
    }

    /// Store a solution computed elsewhere; an existing one is kept
    pub fn insert(&self, constraints: FlexConstraints, result: AllocResult) {
        let slot = Arc::clone(self.table.entry(constraints).or_default().value());
        let _ = slot.set(result);
    }

    /// Number of problems with a stored solution
    pub fn len(&self) -> usize {
        self.table.iter().filter(|e| e.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, constraints: &FlexConstraints) -> Slot {
        if let Some(slot) = self.table.get(constraints) {
            return Arc::clone(&slot);
        }
        Arc::clone(self.table.entry(*constraints).or_default().value())
    }
}

/// Decorator that solves each distinct problem only once
///
/// Concurrent calls for the same constraints wait for the first one instead
/// of solving again. With `update_cache` off the cache is read-only: misses
/// are solved but not stored.
pub struct MemoizingSolver {
    inner: Arc<dyn AllocationSolver>,
    cache: MemoizationCache,
    update_cache: bool,
}

impl MemoizingSolver {
    /// Memoize into a fresh cache
    pub fn new(inner: Arc<dyn AllocationSolver>) -> Self {
        Self::with_cache(inner, MemoizationCache::new(), true)
    }

    pub fn with_cache(
        inner: Arc<dyn AllocationSolver>,
        cache: MemoizationCache,
        update_cache: bool,
    ) -> Self {
        Self {
            inner,
            cache,
            update_cache,
        }
    }

    pub fn cache(&self) -> &MemoizationCache {
        &self.cache
    }

    pub fn inner(&self) -> &Arc<dyn AllocationSolver> {
        &self.inner
    }
}

impl AllocationSolver for MemoizingSolver {
    fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
        if !self.update_cache {
            return match self.cache.get(constraints) {
                Some(result) => result,
                None => self.inner.solve(constraints),
            };
        }

        let slot = self.cache.slot(constraints);
        slot.get_or_init(|| {
            log::debug!("{} solving uncached problem", self.inner.name());
            self.inner.solve(constraints)
        })
        .clone()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl std::fmt::Debug for MemoizingSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizingSolver")
            .field("inner", &self.inner.name())
            .field("cached", &self.cache.len())
            .field("update_cache", &self.update_cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GreedySolver, InfeasibleSolver};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Greedy solver counting its invocations
    #[derive(Default)]
    struct CountingSolver {
        calls: AtomicUsize,
    }

    impl AllocationSolver for CountingSolver {
        fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            GreedySolver::new().solve(constraints)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn problem(providers: usize) -> FlexConstraints {
        FlexConstraints::builder()
            .required_activations(2)
            .build()
            .for_providers(providers)
    }

    #[test]
    fn test_each_problem_is_solved_once_under_concurrency() {
        let counter = Arc::new(CountingSolver::default());
        let solver = Arc::new(MemoizingSolver::new(counter.clone()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let solver = solver.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        let result = solver.solve(&problem(2 + (t + i) % 3));
                        assert!(result.is_feasible());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(solver.cache().len(), 3);
        assert_eq!(solver.name(), "counting");
    }

    #[test]
    fn test_cached_result_matches_inner() {
        let solver = MemoizingSolver::new(Arc::new(GreedySolver::new()));
        let first = solver.solve(&problem(3));
        let second = solver.solve(&problem(3));

        assert_eq!(first, second);
        assert_eq!(first, GreedySolver::new().solve(&problem(3)));
    }

    #[test]
    fn test_infeasible_results_are_cached_too() {
        let solver = MemoizingSolver::new(Arc::new(InfeasibleSolver::new()));
        assert!(!solver.solve(&problem(2)).is_feasible());
        assert_eq!(solver.cache().get(&problem(2)), Some(AllocResult::Infeasible));
    }

    #[test]
    fn test_read_only_cache() {
        let cache = MemoizationCache::new();
        cache.insert(problem(2), AllocResult::Infeasible);

        let counter = Arc::new(CountingSolver::default());
        let solver = MemoizingSolver::with_cache(counter.clone(), cache.clone(), false);

        // Hit: served from the shared cache, even though greedy could solve it
        assert_eq!(solver.solve(&problem(2)), AllocResult::Infeasible);
        assert_eq!(counter.calls.load(Ordering::SeqCst), 0);

        // Miss: solved every time and never stored
        assert!(solver.solve(&problem(4)).is_feasible());
        assert!(solver.solve(&problem(4)).is_feasible());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }
}
