use std::sync::Arc;

use gridflex_core::{AllocResult, FlexConstraints};
use gridflex_ports::AllocationSolver;
use parking_lot::Mutex;

/// Gate that admits one `solve` call at a time
///
/// Wraps solvers that are not reentrant (e.g. bindings to a native
/// optimizer holding global state) so they can be shared by a worker pool.
pub struct SerializedSolver {
    inner: Arc<dyn AllocationSolver>,
    gate: Mutex<()>,
}

impl SerializedSolver {
    pub fn new(inner: Arc<dyn AllocationSolver>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    /// The wrapped solver
    pub fn inner(&self) -> &Arc<dyn AllocationSolver> {
        &self.inner
    }
}

impl AllocationSolver for SerializedSolver {
    fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
        let _guard = self.gate.lock();
        self.inner.solve(constraints)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl std::fmt::Debug for SerializedSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedSolver")
            .field("inner", &self.inner.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DummySolver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Records the highest number of overlapping calls
    #[derive(Default)]
    struct OverlapCounter {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl AllocationSolver for OverlapCounter {
        fn solve(&self, constraints: &FlexConstraints) -> AllocResult {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            DummySolver::new().solve(constraints)
        }

        fn name(&self) -> &str {
            "counter"
        }
    }

    #[test]
    fn test_calls_never_overlap() {
        let counter = Arc::new(OverlapCounter::default());
        let solver = Arc::new(SerializedSolver::new(counter.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let solver = solver.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        solver.solve(&FlexConstraints::default());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.calls.load(Ordering::SeqCst), 40);
        assert_eq!(counter.peak.load(Ordering::SeqCst), 1);
        assert_eq!(solver.name(), "counter");
    }
}
