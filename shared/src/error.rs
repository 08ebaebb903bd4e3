use thiserror::Error as ThisError;

use crate::DenyReason;

/// Errors that can occur while mutating ownership state.
///
/// None of these cross the process boundary: public operations turn them
/// into a status value and, where useful, a log line.
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum AuthorityError {
    /// Agent or pawn handle no longer resolves
    #[error("Invalid target for '{operation}': {target} does not exist")]
    InvalidTarget {
        operation: &'static str,
        target: String,
    },

    /// Operation requires authority this process does not have
    #[error("{operation} not permitted on {host_type}: process is not authoritative")]
    Unauthorized {
        operation: &'static str,
        host_type: &'static str,
    },

    /// Ownership policy rejected the transfer
    #[error("Agent {agent} may not own pawn {pawn}: {}", reason.name())]
    EligibilityDenied {
        agent: String,
        pawn: String,
        reason: DenyReason,
    },

    /// A user supplied hook returned an error or panicked
    #[error("Hook '{hook}' faulted: {message}")]
    CallbackFault {
        hook: &'static str,
        message: String,
    },
}

impl AuthorityError {
    pub fn invalid_target(operation: &'static str, target: impl std::fmt::Debug) -> Self {
        AuthorityError::InvalidTarget {
            operation,
            target: format!("{:?}", target),
        }
    }

    pub fn deny_reason(&self) -> DenyReason {
        match self {
            AuthorityError::InvalidTarget { .. } => DenyReason::PawnInvalid,
            AuthorityError::Unauthorized { .. } => DenyReason::NotAuthoritative,
            AuthorityError::EligibilityDenied { reason, .. } => *reason,
            AuthorityError::CallbackFault { .. } => DenyReason::HookFault,
        }
    }
}

/// Errors raised by a host adapter's message transport
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection {connection} is closed")]
    ConnectionClosed { connection: String },

    #[error("Failed to send message: {reason}")]
    SendFailed { reason: String },

    #[error("A {sender} may not send {message} messages")]
    SenderNotAllowed {
        sender: &'static str,
        message: &'static str,
    },

    #[error("{message} is bound for a {expected}, not a {receiver}")]
    WrongDirection {
        message: &'static str,
        expected: &'static str,
        receiver: &'static str,
    },
}
