//! Common error types for Achievagrad

use thiserror::Error;

/// Common result type for Achievagrad operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the proxy and the client
#[derive(Error, Debug)]
pub enum Error {
    /// Identity provider unreachable or rejected the client credentials
    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    /// Catalog provider (or the proxy, seen from the client) unreachable or non-success
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Payload could not be parsed
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Input that should have been filtered before reaching this call path
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
