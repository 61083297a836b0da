mod event;
mod outcome;
mod profile;
mod strategy;

pub use event::{Event, EventValue, RESERVED_TYPE_KEY, attributes, event_types};
pub use outcome::{INFEASIBLE_PAYOFF, SampleOutcome};
pub use profile::{ProfileKey, StrategyProfile};
pub use strategy::StrategyId;
