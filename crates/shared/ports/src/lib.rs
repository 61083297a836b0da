//! Gridflex Ports
//!
//! Port definitions (traits) for the gridflex platform.
//! These define the boundaries between the simulation kernel, the game
//! engine and pluggable collaborators (solvers, strategies, reporting).

mod clock;
mod error;
mod listener;
mod report;
mod solver;

pub use clock::Clock;
pub use error::{KernelError, KernelResult};
pub use listener::{Listener, Participant, StrategyFactory};
pub use report::{Visitable, Writable};
pub use solver::AllocationSolver;
