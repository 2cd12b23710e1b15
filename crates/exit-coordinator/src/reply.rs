//! # Reply Handles
//!
//! A [`Reply`] is the actor's half of one exit handshake. It wraps a oneshot
//! sender, so it can be resolved at most once; both [`Reply::ok`] and
//! [`Reply::err`] consume it.

use crate::error::ExitError;
use tokio::sync::oneshot;

/// Outcome of one actor's exit, as seen by the coordinator.
pub type ExitOutcome = Result<(), ExitError>;

/// Single-use handle an actor resolves once it has finished shutting down.
///
/// Dropping a `Reply` without resolving it is reported back as
/// [`ExitError::ReplyDropped`].
#[derive(Debug)]
pub struct Reply {
    respond_to: oneshot::Sender<ExitOutcome>,
}

impl Reply {
    pub(crate) fn new(respond_to: oneshot::Sender<ExitOutcome>) -> Self {
        Self { respond_to }
    }

    /// Reports a clean exit.
    pub fn ok(self) {
        self.resolve(Ok(()));
    }

    /// Reports that the actor failed to shut down cleanly.
    pub fn err<E>(self, err: E)
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.resolve(Err(ExitError::actor(err)));
    }

    /// Sends an already built outcome.
    ///
    /// The coordinator may have given up waiting (timeout), in which case the
    /// outcome is discarded.
    pub fn resolve(self, outcome: ExitOutcome) {
        let _ = self.respond_to.send(outcome);
    }
}

/// Message carried on a signal's request channel.
///
/// `delivered` is fired by the listener the moment the actor takes the
/// request, which gives the sender rendezvous semantics on top of a buffered
/// channel.
#[derive(Debug)]
pub(crate) struct ExitRequest {
    pub(crate) reply: Reply,
    pub(crate) delivered: oneshot::Sender<()>,
}

impl ExitRequest {
    /// Builds a request and returns the receivers for both handshake phases.
    pub(crate) fn new() -> (Self, oneshot::Receiver<()>, oneshot::Receiver<ExitOutcome>) {
        let (respond_to, outcome) = oneshot::channel();
        let (delivered, delivery) = oneshot::channel();
        let request = Self {
            reply: Reply::new(respond_to),
            delivered,
        };
        (request, delivery, outcome)
    }
}
