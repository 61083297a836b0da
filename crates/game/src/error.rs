use gridflex_core::ProfileKey;
use thiserror::Error;

/// Errors raised by the payoff matrix
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No samples recorded for profile {0}")]
    NoData(ProfileKey),
}

pub type PayoffResult<T> = std::result::Result<T, GameError>;
