use gridflex_game::GameError;
use gridflex_ports::KernelError;
use thiserror::Error;

/// Errors raised while setting up or running an experiment
#[derive(Error, Debug)]
pub enum DirectorError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Simulation fault: {0}")]
    Fault(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Cannot start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<KernelError> for DirectorError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::InvalidArgument(msg) => DirectorError::InvalidArgument(msg),
            KernelError::UnknownEventType(t) => DirectorError::UnknownEventType(t),
            KernelError::SimulationFault(msg) => DirectorError::Fault(msg),
        }
    }
}

impl From<GameError> for DirectorError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::InvalidArgument(msg) => DirectorError::InvalidArgument(msg),
            no_data @ GameError::NoData(_) => DirectorError::InvalidArgument(no_data.to_string()),
        }
    }
}

pub type DirectorResult<T> = std::result::Result<T, DirectorError>;
