use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OdoError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("pulse input not supported in this build")]
    HardwareUnsupported,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing trajectory")]
    MissingTrajectory,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
