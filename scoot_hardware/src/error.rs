use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pulse input already started")]
    AlreadyStarted,
    #[error("simulated pulse rate out of range: {0} Hz")]
    InvalidRate(f64),
    #[error("pulse input not supported on this platform")]
    Unsupported,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
