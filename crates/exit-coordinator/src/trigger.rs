//! # Exit Triggers
//!
//! [`Coordinator::exit_on`](crate::Coordinator::exit_on) waits for one
//! notification from an [`ExitTrigger`] before running the exit round. The
//! core only needs "subscribe, receive one notification"; where that
//! notification comes from is up to the caller.
//!
//! Provided triggers:
//!
//! | Trigger | Fires when |
//! |---------|------------|
//! | [`OsSignals`] | the process receives one of the subscribed OS signals |
//! | `oneshot::Receiver<T>` | a value is sent, or the sender is dropped |
//! | `broadcast::Receiver<T>` | a value is broadcast, or all senders are dropped |
//! | `watch::Receiver<bool>` | the value becomes `true`, or the sender is dropped |
//! | `Arc<Notify>` | `notify_one` / `notify_waiters` is called |

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, watch, Notify};
use tracing::{debug, info};

/// A source of a single asynchronous "time to exit" notification.
#[async_trait]
pub trait ExitTrigger: Send {
    /// Completes once the trigger has fired.
    async fn triggered(&mut self);
}

#[async_trait]
impl<T: Send> ExitTrigger for oneshot::Receiver<T> {
    async fn triggered(&mut self) {
        if self.await.is_err() {
            debug!("Trigger sender dropped, treating as fired");
        }
    }
}

#[async_trait]
impl<T: Clone + Send> ExitTrigger for broadcast::Receiver<T> {
    async fn triggered(&mut self) {
        match self.recv().await {
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "Trigger receiver lagged, treating as fired");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("Trigger senders dropped, treating as fired");
            }
        }
    }
}

#[async_trait]
impl ExitTrigger for watch::Receiver<bool> {
    async fn triggered(&mut self) {
        let sender_alive = self.wait_for(|fired| *fired).await.is_ok();
        if !sender_alive {
            debug!("Trigger sender dropped, treating as fired");
        }
    }
}

#[async_trait]
impl ExitTrigger for Arc<Notify> {
    async fn triggered(&mut self) {
        self.notified().await;
    }
}

/// Fires on the first of a set of OS signals.
#[derive(Debug)]
pub struct OsSignals {
    #[cfg(unix)]
    signals: Vec<(tokio::signal::unix::SignalKind, tokio::signal::unix::Signal)>,
}

#[cfg(unix)]
impl OsSignals {
    /// Subscribes to `kinds`. Must be called from within a Tokio runtime.
    pub fn new(kinds: &[tokio::signal::unix::SignalKind]) -> io::Result<Self> {
        let signals = kinds
            .iter()
            .map(|kind| Ok((*kind, tokio::signal::unix::signal(*kind)?)))
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { signals })
    }

    /// `SIGINT` and `SIGTERM`, the usual termination requests.
    pub fn terminate() -> io::Result<Self> {
        use tokio::signal::unix::SignalKind;
        Self::new(&[SignalKind::interrupt(), SignalKind::terminate()])
    }
}

#[cfg(not(unix))]
impl OsSignals {
    /// Ctrl-C, the only termination request available off unix.
    pub fn terminate() -> io::Result<Self> {
        Ok(Self {})
    }
}

#[async_trait]
impl ExitTrigger for OsSignals {
    #[cfg(unix)]
    async fn triggered(&mut self) {
        use std::task::Poll;

        let kind = std::future::poll_fn(|cx| {
            for (kind, signal) in self.signals.iter_mut() {
                if signal.poll_recv(cx).is_ready() {
                    return Poll::Ready(*kind);
                }
            }
            Poll::Pending
        })
        .await;
        info!(signal = kind.as_raw_value(), "Received OS signal");
    }

    #[cfg(not(unix))]
    async fn triggered(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c, treating as fired");
            return;
        }
        info!("Received ctrl-c");
    }
}
