//! Session store errors.

use testwatch_core::{SessionId, SessionStatus};

/// Error type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while driving a session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The session is not active (never created, or already archived)
    #[error("Test session with ID {0} not found")]
    NotFound(SessionId),

    /// The session is active but its status does not allow the operation
    #[error("Cannot {operation} test session {id} while it is {status}")]
    InvalidState {
        /// Session the operation targeted
        id: SessionId,
        /// Status the session was in
        status: SessionStatus,
        /// Operation that was rejected
        operation: &'static str,
    },

    /// The session could not be serialized for export
    #[error("Failed to serialize test session: {0}")]
    Serialization(String),
}

impl SessionError {
    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}
