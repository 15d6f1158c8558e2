use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoverError {
    #[error("transmitter error: {0}")]
    Transmitter(String),
    #[error("transmitter fault: {0}")]
    TransmitterFault(String),
    #[error("transmitter disconnected")]
    Disconnected,
    #[error("feature not supported by this cover: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing transmitter")]
    MissingTransmitter,
    #[error("missing channel")]
    MissingChannel,
    #[error("channel {0} is outside 1..=15")]
    InvalidChannel(u8),
    #[error("unknown transmitter '{0}'")]
    UnknownTransmitter(String),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
