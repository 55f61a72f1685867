use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    #[error("channel {channel} unavailable: {reason}")]
    ChannelUnavailable {
        channel: &'static str,
        reason: String,
    },
    #[error("actuator write failed: {0}")]
    ActuatorWrite(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Rejections produced by the command normalizer. None of them change state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("invalid parameter {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("missing parameter {0}")]
    MissingParameter(&'static str),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing level switches")]
    MissingSwitches,
    #[error("missing foam probe")]
    MissingFoamProbe,
    #[error("missing pump")]
    MissingPump,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
