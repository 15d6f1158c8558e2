use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("no receiver learned on channel {0}")]
    UnknownChannel(u8),
    #[error("simulator worker has shut down")]
    Disconnected,
    #[error("timed out waiting for condition")]
    WaitTimeout,
}

pub type Result<T> = std::result::Result<T, SimError>;
