//! Error types for avimux

use thiserror::Error;

/// Result type alias for avimux operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for avimux
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying writer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (missing format key, dimension mismatch)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported operation (no codec, codec rejected the format)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The RIFF stream outgrew its 32-bit addressing
    #[error("Stream size {size} exceeds the {limit} byte limit")]
    SizeLimit { size: u64, limit: u64 },
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a codec error
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Error::Codec(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }
}
