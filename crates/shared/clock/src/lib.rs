//! Gridflex Clock
//!
//! Discrete time for the simulation kernel. A replication owns one
//! [`SimulationClock`] and advances it one step at a time:
//!
//! ```text
//! Idle (count = 0) ──advance(n > 0)──▶ Running (count > 0)
//!        ▲                                   │
//!        └──────────────reset()──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```
//! use gridflex_clock::{ClockState, SimulationClock};
//!
//! let mut clock = SimulationClock::new();
//! clock.advance(3).unwrap();
//! assert_eq!(clock.time_count(), 3);
//! assert_eq!(clock.state(), ClockState::Running);
//!
//! clock.reset();
//! assert_eq!(clock.state(), ClockState::Idle);
//! ```

mod simulation;

pub use simulation::{ClockState, SimulationClock};

// Re-export the Clock trait for convenience
pub use gridflex_ports::Clock;
