//! Error types for avm-client

use thiserror::Error;

/// Result type alias using avm-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the agent runtime
#[derive(Error, Debug)]
pub enum Error {
    /// A transport-level failure (string-based: transports differ widely)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A malformed event or message payload
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A generic client error
    #[error("{0}")]
    Other(String),
}
