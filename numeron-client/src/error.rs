//! Game Server client error types.

use numeron_core::TransportError;
use thiserror::Error;

/// Errors that can occur while talking to the Game Server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("Game Server request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the expected JSON.
    #[error("Failed to parse Game Server response: {0}")]
    ParseError(String),

    /// Non-success status without a usable error body.
    #[error("Game Server returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Request timed out.
    #[error("Game Server request timed out after {0}ms")]
    Timeout(u64),

    /// Game Server could not be reached.
    #[error("Game Server unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("Game Server client configuration error: {0}")]
    ConfigError(String),
}

/// Timeouts are classified by the client, which knows the configured limit.
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::Unavailable(err.to_string())
        } else if err.is_decode() {
            ClientError::ParseError(err.to_string())
        } else {
            ClientError::RequestFailed(err.to_string())
        }
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        TransportError::new(err.to_string())
    }
}
