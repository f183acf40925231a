//! Error types for the Numeron play-screen core.

use thiserror::Error;

/// Top-level error type for all play-screen operations.
#[derive(Error, Debug)]
pub enum NumeronError {
    /// A digit outside 0–9 was supplied.
    #[error("Invalid digit: {0:?} (expected 0-9)")]
    InvalidDigit(String),

    /// An item key was empty or blank.
    #[error("Invalid item key: {0:?}")]
    InvalidItemKey(String),

    /// The item needs a target digit and none was supplied.
    #[error("Item {item} requires a target digit")]
    MissingParameter {
        /// The item that was activated.
        item: String,
    },

    /// The Game Server refused the activation.
    #[error("Item use was rejected: {reason}")]
    RemoteRejection {
        /// Server-supplied reason, shown verbatim.
        reason: String,
    },

    /// The request could not complete (network, status or parse failure).
    #[error("Item request failed: {cause}")]
    TransportFailure {
        /// Diagnostic cause. Logged, never shown to the player.
        cause: String,
    },

    /// A persisted memo record could not be decoded.
    #[error("Malformed persisted state: {0}")]
    MalformedPersistedState(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite storage error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NumeronError {
    /// Whether the player should see this error through a blocking notification.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. } | Self::RemoteRejection { .. } | Self::TransportFailure { .. }
        )
    }
}

/// Failure reported by a [`GameServer`](crate::ports::GameServer) transport.
///
/// Carries only a diagnostic description; the controller turns it into
/// [`NumeronError::TransportFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    /// Build a transport error from anything printable.
    pub fn new(cause: impl Into<String>) -> Self {
        Self(cause.into())
    }
}

impl From<TransportError> for NumeronError {
    fn from(err: TransportError) -> Self {
        Self::TransportFailure { cause: err.0 }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, NumeronError>;
