//! Error types for parley-session

use parley_api::OperationError;
use thiserror::Error;

/// Result type alias using parley-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the session controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A failure reported by the remote service
    #[error(transparent)]
    Remote(#[from] OperationError),

    /// No authentication check has completed yet
    #[error("Session not initialized")]
    Uninitialized,

    /// A reply is still streaming into this conversation
    #[error("A message is already being sent in this conversation")]
    SendInProgress,

    /// The conversation's detail is still being fetched
    #[error("Conversation is still loading")]
    LoadInProgress,

    /// Nothing to send
    #[error("Message is empty")]
    EmptyMessage,

    /// The model is not in the fetched model list
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// `retry_send` with no failed send recorded for the active conversation
    #[error("No failed message to retry")]
    NothingToRetry,
}

impl Error {
    /// Check if this error means the session has to sign in again
    pub fn is_auth_required(&self) -> bool {
        match self {
            Error::Remote(e) => e.is_auth_required(),
            _ => false,
        }
    }
}
