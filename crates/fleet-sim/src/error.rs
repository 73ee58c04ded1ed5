use fleet_core::CoreError;
use fleet_dispatch::DispatchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation setup failed: {0}")]
    Setup(#[from] DispatchError),

    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("simulation is already running")]
    AlreadyRunning,

    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    #[error("initial fleet build failed: {0}")]
    Join(String),
}

pub type SimResult<T> = Result<T, SimError>;
