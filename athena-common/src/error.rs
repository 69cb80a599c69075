//! Common error types for Athena pricing

use thiserror::Error;

/// Common result type for Athena operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the pricing core and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// Payload has the wrong top-level shape or exceeds a sanity bound
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A field could not be parsed to the expected numeric type
    #[error("Coercion failure: {0}")]
    CoercionFailure(String),

    /// Failure reported by the resource fetch collaborator
    #[error("Upstream fetch error: {0}")]
    UpstreamFetch(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True for errors that only invalidate one (well, source) unit of work
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedPayload(_) | Error::CoercionFailure(_) | Error::UpstreamFetch(_)
        )
    }
}
