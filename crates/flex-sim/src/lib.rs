//! Gridflex Simulation Kernel
//!
//! Discrete-event kernel and the executor for one game replication:
//! - `EventFactory` - registry of known event types
//! - `EventBus` - listener registration and event delivery
//! - `Agenda` - events scheduled for future time steps
//! - `Simulator` - the time-step loop
//! - `RunExecutor` - one replication of a strategy profile against a solver
//! - `BuiltinStrategies` - reference participant strategies

pub mod agenda;
pub mod bus;
pub mod event;
pub mod executor;
pub mod simulator;
pub mod strategies;

pub use agenda::Agenda;
pub use bus::{EventBus, EventRecorder, NoopListener};
pub use event::EventFactory;
pub use executor::{RunConfig, RunExecutor, participant_seed};
pub use simulator::{Simulator, StepContext};
pub use strategies::{BuiltinConfig, BuiltinStrategies};

// Re-export the ports used at this crate's seams
pub use gridflex_ports::{KernelError, KernelResult, Listener, Participant, StrategyFactory};
