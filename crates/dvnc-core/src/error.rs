use thiserror::Error;

/// Top-level error type shared by the DVNC crates.
///
/// Subsystem crates define their own error types and implement
/// `From<DvncError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DvncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

}

impl From<toml::de::Error> for DvncError {
    fn from(err: toml::de::Error) -> Self {
        DvncError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DvncError {
    fn from(err: toml::ser::Error) -> Self {
        DvncError::Config(err.to_string())
    }
}

/// A specialized `Result` type for DVNC operations.
pub type Result<T> = std::result::Result<T, DvncError>;
