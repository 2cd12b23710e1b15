//! # Exit Errors
//!
//! Every failure the exit protocol can observe is an [`ExitError`]. Handshake
//! failures never escape on their own: the [`Coordinator`](crate::Coordinator)
//! collects them per actor into an [`ExitReport`](crate::ExitReport).

use std::error::Error;
use std::sync::Arc;

/// Errors produced while registering actors or running an exit handshake.
///
/// The type is `Clone` so a report can hand out copies of its entries while
/// still owning them. Actor-supplied errors are shared behind an `Arc` for the
/// same reason.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExitError {
    #[error("name {0:?} is already registered")]
    DuplicateName(String),
    #[error("timeout")]
    Timeout,
    #[error("exit listener was dropped before the request was delivered")]
    ListenerDropped,
    #[error("reply was dropped without being resolved")]
    ReplyDropped,
    #[error("exit handshake panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Actor(Arc<dyn Error + Send + Sync>),
}

impl ExitError {
    /// Wraps an actor's own error so it can be sent back through a [`Reply`](crate::Reply).
    pub fn actor<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        ExitError::Actor(Arc::from(err.into()))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExitError::Timeout)
    }
}

impl PartialEq for ExitError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExitError::DuplicateName(a), ExitError::DuplicateName(b)) => a == b,
            (ExitError::Timeout, ExitError::Timeout)
            | (ExitError::ListenerDropped, ExitError::ListenerDropped)
            | (ExitError::ReplyDropped, ExitError::ReplyDropped) => true,
            (ExitError::Panicked(a), ExitError::Panicked(b)) => a == b,
            // Actor errors carry no equality of their own; compare what the caller sees.
            (ExitError::Actor(a), ExitError::Actor(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
