//! Error types for the IPMI fan governor

use thiserror::Error;

/// Core error type for governor operations
#[derive(Error, Debug)]
pub enum IpmiFanError {
    /// Malformed or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two host entries share the same name
    #[error("Duplicate \"{0}\" host name found")]
    DuplicateHost(String),

    /// Configuration file could not be deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An external command did not finish in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// An external command exited with a non-zero status
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No temperature readings were available
    #[error("No temperature data: {0}")]
    NoData(String),

    /// Parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for governor operations
pub type Result<T> = std::result::Result<T, IpmiFanError>;

impl From<serde_yaml::Error> for IpmiFanError {
    fn from(err: serde_yaml::Error) -> Self {
        IpmiFanError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for IpmiFanError {
    fn from(err: toml::de::Error) -> Self {
        IpmiFanError::Serialization(err.to_string())
    }
}
