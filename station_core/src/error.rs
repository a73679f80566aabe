use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StationError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

impl StationError {
    /// Whether the condition clears by itself on a later tick.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
