//! Reference participant strategies
//!
//! - `noop` never delivers and never earns anything
//! - `responsive` delivers every activation asked of it
//! - `opportunistic` delivers with a fixed probability and pays a penalty
//!   for every activation it skips

use std::collections::BTreeSet;

use gridflex_core::{Event, Payoff, Seed, StrategyId, TimeCount, attributes, event_types};
use gridflex_ports::{KernelError, KernelResult, Listener, Participant, StrategyFactory};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bus::NoopListener;

pub const NOOP: &str = "noop";
pub const RESPONSIVE: &str = "responsive";
pub const OPPORTUNISTIC: &str = "opportunistic";

/// Parameters of the built-in strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinConfig {
    /// Cost a provider bears for every slot it delivers
    pub activation_cost: f64,
    /// Probability that an opportunistic provider delivers an activation
    pub delivery_probability: f64,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            activation_cost: 1.0,
            delivery_probability: 0.5,
        }
    }
}

/// Factory for the built-in strategies
#[derive(Debug, Clone, Default)]
pub struct BuiltinStrategies {
    config: BuiltinConfig,
}

impl BuiltinStrategies {
    pub fn new(config: BuiltinConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuiltinConfig {
        &self.config
    }

    /// Identifiers of every built-in strategy
    pub fn ids() -> Vec<StrategyId> {
        [NOOP, OPPORTUNISTIC, RESPONSIVE]
            .into_iter()
            .map(StrategyId::from)
            .collect()
    }
}

impl StrategyFactory for BuiltinStrategies {
    fn create(
        &self,
        strategy: &StrategyId,
        index: usize,
        seed: Seed,
    ) -> KernelResult<Box<dyn Participant>> {
        match strategy.as_str() {
            NOOP => Ok(Box::new(NoopParticipant::new())),
            RESPONSIVE => Ok(Box::new(ResponsiveParticipant::new(
                index,
                self.config.activation_cost,
            ))),
            OPPORTUNISTIC => {
                let p = self.config.delivery_probability;
                if !(0.0..=1.0).contains(&p) {
                    return Err(KernelError::invalid(format!(
                        "Delivery probability must be within [0, 1], got {}",
                        p
                    )));
                }
                Ok(Box::new(OpportunisticParticipant::new(
                    index,
                    p,
                    self.config.activation_cost,
                    seed,
                )))
            }
            other => Err(KernelError::invalid(format!("Unknown strategy: {}", other))),
        }
    }

    fn supports(&self, strategy: &StrategyId) -> bool {
        matches!(strategy.as_str(), NOOP | RESPONSIVE | OPPORTUNISTIC)
    }
}

/// Slot of an activation addressed to `index`
fn addressed_slot(event: &Event, index: usize) -> Option<TimeCount> {
    if !event.is(event_types::FLEX_ACTIVATION) {
        return None;
    }
    let provider = usize::try_from(event.int(attributes::PROVIDER)?).ok()?;
    if provider != index {
        return None;
    }
    u64::try_from(event.int(attributes::SLOT)?).ok()
}

/// Settlement terms: (slot, reward share, penalty)
fn settlement(event: &Event) -> Option<(TimeCount, f64, f64)> {
    if !event.is(event_types::MARKET_SETTLEMENT) {
        return None;
    }
    let slot = u64::try_from(event.int(attributes::SLOT)?).ok()?;
    let share = event.float(attributes::REWARD_SHARE).unwrap_or(0.0);
    let penalty = event.float(attributes::PENALTY).unwrap_or(0.0);
    Some((slot, share, penalty))
}

/// Participant that ignores the market entirely
pub struct NoopParticipant {
    strategy: StrategyId,
    listener: NoopListener,
}

impl NoopParticipant {
    pub fn new() -> Self {
        Self {
            strategy: StrategyId::from(NOOP),
            listener: NoopListener,
        }
    }
}

impl Default for NoopParticipant {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for NoopParticipant {
    fn on_event(&mut self, event: &Event) {
        self.listener.on_event(event);
    }
}

impl Participant for NoopParticipant {
    fn strategy(&self) -> &StrategyId {
        &self.strategy
    }

    fn payoff(&self) -> Payoff {
        0.0
    }
}

/// Participant that always delivers
pub struct ResponsiveParticipant {
    strategy: StrategyId,
    index: usize,
    activation_cost: f64,
    delivered: BTreeSet<TimeCount>,
    payoff: Payoff,
}

impl ResponsiveParticipant {
    pub fn new(index: usize, activation_cost: f64) -> Self {
        Self {
            strategy: StrategyId::from(RESPONSIVE),
            index,
            activation_cost,
            delivered: BTreeSet::new(),
            payoff: 0.0,
        }
    }
}

impl Listener for ResponsiveParticipant {
    fn on_event(&mut self, event: &Event) {
        if let Some(slot) = addressed_slot(event, self.index) {
            self.delivered.insert(slot);
        } else if let Some((slot, share, _)) = settlement(event) {
            if self.delivered.contains(&slot) {
                self.payoff += share - self.activation_cost;
            }
        }
    }
}

impl Participant for ResponsiveParticipant {
    fn strategy(&self) -> &StrategyId {
        &self.strategy
    }

    fn delivered(&self, slot: TimeCount) -> bool {
        self.delivered.contains(&slot)
    }

    fn payoff(&self) -> Payoff {
        self.payoff
    }
}

/// Participant that delivers at random
pub struct OpportunisticParticipant {
    strategy: StrategyId,
    index: usize,
    delivery_probability: f64,
    activation_cost: f64,
    rng: StdRng,
    delivered: BTreeSet<TimeCount>,
    missed: BTreeSet<TimeCount>,
    payoff: Payoff,
}

impl OpportunisticParticipant {
    pub fn new(index: usize, delivery_probability: f64, activation_cost: f64, seed: Seed) -> Self {
        Self {
            strategy: StrategyId::from(OPPORTUNISTIC),
            index,
            delivery_probability,
            activation_cost,
            rng: StdRng::seed_from_u64(seed),
            delivered: BTreeSet::new(),
            missed: BTreeSet::new(),
            payoff: 0.0,
        }
    }
}

impl Listener for OpportunisticParticipant {
    fn on_event(&mut self, event: &Event) {
        if let Some(slot) = addressed_slot(event, self.index) {
            if self.rng.gen_bool(self.delivery_probability) {
                self.delivered.insert(slot);
            } else {
                self.missed.insert(slot);
            }
        } else if let Some((slot, share, penalty)) = settlement(event) {
            if self.delivered.contains(&slot) {
                self.payoff += share - self.activation_cost;
            } else if self.missed.contains(&slot) {
                self.payoff -= penalty;
            }
        }
    }
}

impl Participant for OpportunisticParticipant {
    fn strategy(&self) -> &StrategyId {
        &self.strategy
    }

    fn delivered(&self, slot: TimeCount) -> bool {
        self.delivered.contains(&slot)
    }

    fn payoff(&self) -> Payoff {
        self.payoff
    }
}
