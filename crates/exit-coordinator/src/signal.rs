//! # Exit Signals
//!
//! An exit signal is a pair of handles around one request channel:
//!
//! - [`ExitSignal`] stays with whoever will ask the actor to stop (normally
//!   the [`Coordinator`](crate::Coordinator)).
//! - [`ExitListener`] goes to the actor, which polls it inside its own loop.
//!
//! ```rust
//! use exit_coordinator::ExitSignal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (signal, mut listener) = ExitSignal::new("worker");
//!
//!     tokio::spawn(async move {
//!         if let Some(reply) = listener.recv().await {
//!             // flush, close, release...
//!             reply.ok();
//!         }
//!     });
//!
//!     assert!(signal.exit().await.is_ok());
//! }
//! ```
//!
//! ## Timeouts
//!
//! With a timeout `T`, the handshake has two phases and each gets its own
//! full `T`: delivering the request to the actor, then waiting for the actor
//! to resolve its [`Reply`]. An actor that takes the request but never answers
//! is therefore given up on after at most `2 * T`.

use crate::error::ExitError;
use crate::reply::{ExitOutcome, ExitRequest, Reply};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, info, warn};

/// Hook invoked with the actor name and outcome once a handshake has finished.
pub type SignalHook = Arc<dyn Fn(&str, &ExitOutcome) + Send + Sync>;

/// Coordinator side of an exit signal. Consumed by [`ExitSignal::exit`].
pub struct ExitSignal {
    name: String,
    sender: mpsc::Sender<ExitRequest>,
    timeout: Option<Duration>,
    on_exit: Option<SignalHook>,
}

/// Actor side of an exit signal.
#[derive(Debug)]
pub struct ExitListener {
    name: String,
    receiver: mpsc::Receiver<ExitRequest>,
}

impl ExitSignal {
    /// Creates a signal with no timeout and its matching listener.
    pub fn new(name: impl Into<String>) -> (Self, ExitListener) {
        let name = name.into();
        // One request per signal, so a single slot is all the channel ever needs.
        let (sender, receiver) = mpsc::channel(1);
        let signal = Self {
            name: name.clone(),
            sender,
            timeout: None,
            on_exit: None,
        };
        (signal, ExitListener { name, receiver })
    }

    /// Bounds each handshake phase by `timeout`. A zero duration means no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Registers a hook that runs right after this signal's handshake finishes.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &ExitOutcome) + Send + Sync + 'static,
    {
        self.on_exit = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn has_timeout(&self) -> bool {
        self.timeout.is_some()
    }

    /// Falls back to `default` when the signal carries no timeout of its own.
    pub(crate) fn inherit_timeout(&mut self, default: Option<Duration>) {
        if self.timeout.is_none() {
            self.timeout = default;
        }
    }

    /// Asks the actor to exit and waits for its outcome.
    pub async fn exit(self) -> ExitOutcome {
        debug!(actor = %self.name, timeout = ?self.timeout, "Requesting exit");

        let outcome = self.handshake().await;
        match &outcome {
            Ok(()) => info!(actor = %self.name, "Exited"),
            Err(e) => warn!(actor = %self.name, error = %e, "Exit failed"),
        }

        if let Some(hook) = &self.on_exit {
            hook(&self.name, &outcome);
        }
        outcome
    }

    async fn handshake(&self) -> ExitOutcome {
        let (request, delivery, outcome) = ExitRequest::new();

        let Some(timeout) = self.timeout else {
            self.deliver(request, delivery).await?;
            return await_reply(outcome).await;
        };

        // Two independent timers: one for delivery, one for the reply.
        time::timeout(timeout, self.deliver(request, delivery))
            .await
            .map_err(|_| ExitError::Timeout)??;
        time::timeout(timeout, await_reply(outcome))
            .await
            .map_err(|_| ExitError::Timeout)?
    }

    /// Completes once the actor has taken the request off its listener.
    async fn deliver(
        &self,
        request: ExitRequest,
        delivery: oneshot::Receiver<()>,
    ) -> Result<(), ExitError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| ExitError::ListenerDropped)?;
        delivery.await.map_err(|_| ExitError::ListenerDropped)
    }
}

async fn await_reply(outcome: oneshot::Receiver<ExitOutcome>) -> ExitOutcome {
    match outcome.await {
        Ok(outcome) => outcome,
        Err(_) => Err(ExitError::ReplyDropped),
    }
}

impl fmt::Debug for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitSignal")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("on_exit", &self.on_exit.is_some())
            .finish()
    }
}

impl ExitListener {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for an exit request and returns the reply to resolve.
    ///
    /// Returns `None` once the [`ExitSignal`] has been dropped without asking.
    /// Cancel safe, so it can sit in a `tokio::select!` next to the actor's
    /// regular work.
    pub async fn recv(&mut self) -> Option<Reply> {
        while let Some(request) = self.receiver.recv().await {
            if let Some(reply) = self.accept(request) {
                return Some(reply);
            }
        }
        None
    }

    /// Non-blocking variant of [`recv`](Self::recv) for synchronous polling loops.
    pub fn try_recv(&mut self) -> Option<Reply> {
        while let Ok(request) = self.receiver.try_recv() {
            if let Some(reply) = self.accept(request) {
                return Some(reply);
            }
        }
        None
    }

    fn accept(&self, request: ExitRequest) -> Option<Reply> {
        // The requester stopped waiting for delivery (timed out); nobody would
        // read the reply.
        if request.delivered.send(()).is_err() {
            debug!(actor = %self.name, "Discarding stale exit request");
            return None;
        }
        Some(request.reply)
    }
}
