use thiserror::Error;

/// Errors raised by the simulation kernel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// Contract violation inside one replication
    #[error("Simulation fault: {0}")]
    SimulationFault(String),
}

impl KernelError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        KernelError::InvalidArgument(msg.into())
    }

    pub fn fault(msg: impl Into<String>) -> Self {
        KernelError::SimulationFault(msg.into())
    }
}

pub type KernelResult<T> = std::result::Result<T, KernelError>;
