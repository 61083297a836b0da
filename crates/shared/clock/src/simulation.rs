use gridflex_core::TimeCount;
use gridflex_ports::{Clock, KernelError, KernelResult};

/// Lifecycle state of a simulation clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    /// No time has elapsed since creation or the last reset
    #[default]
    Idle,
    /// At least one step has elapsed
    Running,
}

/// Monotonic step counter driving a simulation
///
/// The count only moves forward through [`advance`](Self::advance) and back
/// to zero through [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    count: TimeCount,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Advance the clock by `step` steps
    ///
    /// Fails with `InvalidArgument` for a negative step or when the counter
    /// would overflow; the count is left unchanged in that case.
    pub fn advance(&mut self, step: i64) -> KernelResult<()> {
        let step = u64::try_from(step).map_err(|_| {
            KernelError::invalid(format!("Clock step must be non-negative, got {}", step))
        })?;
        self.count = self
            .count
            .checked_add(step)
            .ok_or_else(|| KernelError::invalid("Clock counter overflow"))?;
        Ok(())
    }

    /// Current time count
    pub fn time_count(&self) -> TimeCount {
        self.count
    }

    /// Return the count to zero
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn state(&self) -> ClockState {
        if self.count == 0 {
            ClockState::Idle
        } else {
            ClockState::Running
        }
    }
}

impl Clock for SimulationClock {
    fn time_count(&self) -> TimeCount {
        self.count
    }

    fn name(&self) -> &str {
        "SimulationClock"
    }
}
