//! One replication of a strategy profile
//!
//! The executor asks the solver for an activation plan once, turns the plan
//! into scheduled `flex:activation` events, settles every activated slot
//! after its step and collects the participants' payoffs at the end.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use gridflex_core::{
    AllocResult, Event, FlexConstraints, SampleOutcome, Seed, StrategyProfile, TimeCount,
    attributes, event_types,
};
use gridflex_ports::{
    AllocationSolver, KernelError, KernelResult, Listener, Participant, StrategyFactory,
};
use serde::{Deserialize, Serialize};

use crate::event::EventFactory;
use crate::simulator::{Simulator, attach};

/// Economic parameters of a replication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of time steps simulated
    pub horizon: TimeCount,
    /// Reward paid for every provider requested in a slot
    pub activation_reward: f64,
    /// Penalty announced for a requested activation that is not delivered
    pub undelivered_penalty: f64,
    /// System cost of one undelivered activation
    pub externality_price: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            horizon: 96,
            activation_reward: 10.0,
            undelivered_penalty: 5.0,
            externality_price: 20.0,
        }
    }
}

/// Seed handed to participant `index` of a replication seeded with `seed`
pub fn participant_seed(seed: Seed, index: usize) -> Seed {
    seed ^ (index as u64)
        .wrapping_add(1)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

type SharedParticipant = Rc<RefCell<Box<dyn Participant>>>;

/// Runs single replications
///
/// Holds no per-run state: every call builds its own clock, bus, agenda and
/// participants and drops them before returning.
pub struct RunExecutor {
    strategies: Arc<dyn StrategyFactory>,
    events: EventFactory,
    config: RunConfig,
}

impl RunExecutor {
    /// Executor using the kernel event types
    pub fn new(strategies: Arc<dyn StrategyFactory>, config: RunConfig) -> KernelResult<Self> {
        Self::with_events(strategies, config, EventFactory::standard())
    }

    /// Executor with a custom event registry
    ///
    /// Fails with `UnknownEventType` when the strategies rely on a type the
    /// registry does not know.
    pub fn with_events(
        strategies: Arc<dyn StrategyFactory>,
        config: RunConfig,
        events: EventFactory,
    ) -> KernelResult<Self> {
        events.ensure_registered(event_types::KERNEL)?;
        events.ensure_registered(strategies.event_types())?;
        Ok(Self {
            strategies,
            events,
            config,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run one replication
    pub fn execute(
        &self,
        profile: &StrategyProfile,
        constraints: &FlexConstraints,
        solver: &dyn AllocationSolver,
        seed: Seed,
    ) -> KernelResult<SampleOutcome> {
        self.execute_observed(profile, constraints, solver, seed, &[])
    }

    /// Run one replication with extra listeners on the bus
    pub fn execute_observed(
        &self,
        profile: &StrategyProfile,
        constraints: &FlexConstraints,
        solver: &dyn AllocationSolver,
        seed: Seed,
        observers: &[Rc<RefCell<dyn Listener>>],
    ) -> KernelResult<SampleOutcome> {
        if self.config.horizon == 0 {
            return Err(KernelError::fault("Replication horizon must be positive"));
        }
        if profile.is_empty() {
            return Err(KernelError::fault("Profile has no participants"));
        }

        let participants = self.create_participants(profile, seed)?;
        let n = participants.len();

        let mut sim = Simulator::new(self.config.horizon, self.events.clone()).map_err(into_fault)?;
        for participant in &participants {
            sim.register(participant);
        }
        for observer in observers {
            sim.register_dyn(observer);
        }

        let result = solver.solve(&constraints.for_providers(n));
        log::trace!(
            "{} solved {} providers, objective {}",
            solver.name(),
            n,
            result.objective()
        );

        let allocation = match result {
            AllocResult::Infeasible => {
                let time = sim.run().map_err(into_fault)?;
                log::debug!("Infeasible allocation for {}", profile.canonical());
                return Ok(SampleOutcome::infeasible(n, time));
            }
            AllocResult::Allocation(allocation) => allocation,
        };

        for (provider, slot) in allocation.activations() {
            let at = slot as TimeCount + 1;
            if provider >= n || at > self.config.horizon {
                continue;
            }
            let event = self
                .activation(provider, slot, constraints.slot_hours())
                .map_err(into_fault)?;
            sim.schedule(at, event);
        }

        let mut externality = 0.0;
        let time = sim.run_with(|ctx| {
            let slot = ctx.time() - 1;
            let requested: Vec<usize> = allocation
                .active_providers(slot as usize)
                .into_iter()
                .filter(|p| *p < n)
                .collect();
            if requested.is_empty() {
                return Ok(());
            }

            let delivered = requested
                .iter()
                .filter(|p| participants[**p].borrow().delivered(slot))
                .count();
            let reward = self.config.activation_reward * requested.len() as f64;
            let share = if delivered > 0 {
                reward / delivered as f64
            } else {
                0.0
            };
            externality += self.config.externality_price * (requested.len() - delivered) as f64;

            let event = ctx.build(event_types::MARKET_SETTLEMENT)?;
            let event = attach(event, attributes::SLOT, slot)?;
            let event = attach(event, attributes::REQUESTED, requested.len())?;
            let event = attach(event, attributes::DELIVERED, delivered)?;
            let event = attach(event, attributes::REWARD_SHARE, share)?;
            let event = attach(event, attributes::PENALTY, self.config.undelivered_penalty)?;
            ctx.post(&event);
            Ok(())
        })
        .map_err(into_fault)?;

        let mut payoffs = Vec::with_capacity(n);
        for (index, participant) in participants.iter().enumerate() {
            let payoff = participant.borrow().payoff();
            if !payoff.is_finite() {
                return Err(KernelError::fault(format!(
                    "Participant {} reported non-finite payoff {}",
                    index, payoff
                )));
            }
            payoffs.push(payoff);
        }

        Ok(SampleOutcome::new(payoffs, time).with_externality(externality))
    }

    fn activation(&self, provider: usize, slot: usize, volume: f64) -> KernelResult<Event> {
        let event = self.events.build(event_types::FLEX_ACTIVATION)?;
        let event = attach(event, attributes::PROVIDER, provider)?;
        let event = attach(event, attributes::SLOT, slot)?;
        attach(event, attributes::VOLUME, volume)
    }

    fn create_participants(
        &self,
        profile: &StrategyProfile,
        seed: Seed,
    ) -> KernelResult<Vec<SharedParticipant>> {
        let mut participants = Vec::with_capacity(profile.len());
        for (index, strategy) in profile.iter().enumerate() {
            let participant = self
                .strategies
                .create(strategy, index, participant_seed(seed, index))
                .map_err(|e| {
                    KernelError::fault(format!(
                        "Cannot create participant {} ({}): {}",
                        index, strategy, e
                    ))
                })?;
            if participant.strategy() != strategy {
                return Err(KernelError::fault(format!(
                    "Participant {} plays {} instead of {}",
                    index,
                    participant.strategy(),
                    strategy
                )));
            }
            participants.push(Rc::new(RefCell::new(participant)));
        }
        Ok(participants)
    }
}

/// Any error raised while a replication runs is a fault of that replication
fn into_fault(err: KernelError) -> KernelError {
    match err {
        KernelError::SimulationFault(_) => err,
        other => KernelError::fault(other.to_string()),
    }
}

impl std::fmt::Debug for RunExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunExecutor")
            .field("events", &self.events)
            .field("config", &self.config)
            .finish()
    }
}
