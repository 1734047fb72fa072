//! Error types for parley-api

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the backend [`OperationError`]
pub type Result<T> = std::result::Result<T, OperationError>;

/// Failures reported by the remote conversation service.
///
/// Every remote call resolves to one of these as a value; nothing is thrown
/// past the service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum OperationError {
    /// The session is not signed in. Recoverable through re-authentication.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend answered with data that violates the contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network or backend unavailable
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Anything the backend reported that fits no other category
    #[error("{0}")]
    Unknown(String),
}

impl OperationError {
    /// Create a malformed-response error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse(detail.into())
    }

    /// Create a transport error
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::TransportFailure(detail.into())
    }

    /// Check if this error means the session has to sign in again
    pub fn is_auth_required(&self) -> bool {
        matches!(self, OperationError::AuthenticationRequired)
    }
}
