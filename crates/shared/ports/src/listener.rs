use gridflex_core::{Event, Payoff, Seed, StrategyId, TimeCount};

use crate::error::KernelResult;

/// Receives events posted on a simulation's event bus
pub trait Listener {
    fn on_event(&mut self, event: &Event);
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn on_event(&mut self, event: &Event) {
        (**self).on_event(event)
    }
}

/// A strategy-playing participant of one replication
///
/// Participants observe the run through the event bus. The executor asks
/// them after each step whether they delivered the activation requested from
/// them, and reads their payoff once the run is over.
pub trait Participant: Listener {
    /// Strategy this participant plays
    fn strategy(&self) -> &StrategyId;

    /// Whether the activation requested for `slot` was delivered
    fn delivered(&self, _slot: TimeCount) -> bool {
        false
    }

    /// Payoff accumulated so far
    fn payoff(&self) -> Payoff;
}

/// Creates participants for strategy identifiers
///
/// Shared between worker threads, so creation must not rely on mutable
/// factory state. Per-participant randomness comes from `seed`.
pub trait StrategyFactory: Send + Sync {
    /// Create the participant at `index` playing `strategy`
    fn create(
        &self,
        strategy: &StrategyId,
        index: usize,
        seed: Seed,
    ) -> KernelResult<Box<dyn Participant>>;

    /// Whether `strategy` can be created by this factory
    fn supports(&self, strategy: &StrategyId) -> bool;

    /// Event types the created participants rely on besides the kernel's own
    fn event_types(&self) -> Vec<String> {
        Vec::new()
    }
}
