//! Gridflex Core Domain
//!
//! Pure domain types for the gridflex flexibility game platform.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod flex;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Events
    Event,
    EventValue,
    RESERVED_TYPE_KEY,
    // Strategy profiles
    ProfileKey,
    StrategyId,
    StrategyProfile,
    // Outcomes
    INFEASIBLE_PAYOFF,
    SampleOutcome,
    attributes,
    event_types,
};
pub use flex::{AllocResult, Allocation, FlexConstraints, FlexConstraintsBuilder, INFEASIBLE_OBJECTIVE};
pub use values::{Payoff, Seed, TimeCount};
