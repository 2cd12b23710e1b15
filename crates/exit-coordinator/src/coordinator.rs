//! # Exit Coordinator
//!
//! The [`Coordinator`] owns the registry of live [`ExitSignal`]s and runs exit
//! rounds over them. It is a cheap, cloneable handle: clone it into every
//! component that needs to register an actor.
//!
//! ## Exit Round
//!
//! 1. The registry is snapshotted and cleared under its lock. Actors that
//!    register afterwards belong to the next round.
//! 2. Every signal in the snapshot is asked to exit concurrently, each in its
//!    own task. Signals without their own timeout use the coordinator's.
//! 3. All handshakes are joined; one actor failing never cuts another short.
//! 4. Failures are collected into an [`ExitReport`]. A round where every
//!    actor exited cleanly yields `None`.
//!
//! ```rust
//! use exit_coordinator::Coordinator;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new("app");
//!     coordinator.set_timeout(Duration::from_millis(100));
//!
//!     let mut listener = coordinator.register("worker").unwrap();
//!     tokio::spawn(async move {
//!         let reply = listener.recv().await.unwrap();
//!         reply.err("could not flush");
//!     });
//!
//!     let report = coordinator.exit().await.expect("worker failed");
//!     assert_eq!(report.to_string(), "worker: could not flush");
//! }
//! ```

use crate::config::CoordinatorConfig;
use crate::error::ExitError;
use crate::report::ExitReport;
use crate::signal::{ExitListener, ExitSignal};
use crate::trigger::ExitTrigger;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

/// Hook invoked with the result of every exit round, right before it is returned.
pub type ExitHook = Arc<dyn Fn(Option<&ExitReport>) + Send + Sync>;

const DEFAULT_NAME: &str = "exit";

/// Registry of actors and driver of exit rounds.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    registry: Mutex<Registry>,
    after_exit: Option<ExitHook>,
}

struct Registry {
    signals: HashMap<String, ExitSignal>,
    timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        Self::builder()
            .name(config.name.clone())
            .timeout(config.timeout())
            .build()
    }

    /// Process-wide coordinator for code that does not want to pass one around.
    pub fn global() -> &'static Coordinator {
        static GLOBAL: OnceLock<Coordinator> = OnceLock::new();
        GLOBAL.get_or_init(|| Coordinator::new("global"))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Sets the default timeout for signals that have none. Zero waits forever.
    pub fn set_timeout(&self, timeout: Duration) {
        self.registry().timeout = (!timeout.is_zero()).then_some(timeout);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.registry().timeout
    }

    /// Registers an actor under `name` and returns the listener it must poll.
    pub fn register(&self, name: impl Into<String>) -> Result<ExitListener, ExitError> {
        let (signal, listener) = ExitSignal::new(name);
        self.attach(signal)?;
        Ok(listener)
    }

    /// Registers a pre-built signal, e.g. one with its own timeout or hook.
    pub fn attach(&self, signal: ExitSignal) -> Result<(), ExitError> {
        let mut registry = self.registry();
        if registry.signals.contains_key(signal.name()) {
            warn!(actor = signal.name(), "Duplicate registration rejected");
            return Err(ExitError::DuplicateName(signal.name().to_string()));
        }
        debug!(actor = signal.name(), "Registered");
        registry.signals.insert(signal.name().to_string(), signal);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry().signals.contains_key(name)
    }

    /// Number of actors registered for the next round.
    pub fn len(&self) -> usize {
        self.registry().signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().signals.is_empty()
    }

    /// Asks every registered actor to exit and waits for all of them.
    ///
    /// Returns `None` when every actor exited cleanly (or none was
    /// registered), otherwise a report of the failures.
    ///
    /// # Cancel safety
    ///
    /// Not cancel safe. The registry is cleared as soon as the round starts;
    /// dropping the future afterwards aborts the handshakes still running and
    /// their outcomes are lost. Actors that already took their request still
    /// see it, but their replies go nowhere. Bound the round with
    /// [`set_timeout`](Self::set_timeout) rather than by dropping it.
    pub async fn exit(&self) -> Option<ExitReport> {
        let span = info_span!("exit", coordinator = %self.inner.name);
        let result = self.run_round().instrument(span).await;

        if let Some(hook) = &self.inner.after_exit {
            hook(result.as_ref());
        }
        result
    }

    /// Waits for one notification from `trigger`, then runs [`exit`](Self::exit).
    pub async fn exit_on<T: ExitTrigger>(&self, mut trigger: T) -> Option<ExitReport> {
        trigger.triggered().await;
        info!(coordinator = %self.inner.name, "Exit triggered");
        self.exit().await
    }

    async fn run_round(&self) -> Option<ExitReport> {
        let (signals, timeout) = self.take_round();
        if signals.is_empty() {
            debug!("No actors registered");
            return None;
        }

        info!(actors = signals.len(), ?timeout, "Exiting");

        // Dropping the set aborts every handshake still in flight.
        let mut handshakes = JoinSet::new();
        let mut names = HashMap::with_capacity(signals.len());
        for (name, mut signal) in signals {
            signal.inherit_timeout(timeout);
            let span = info_span!("actor", actor = %name);
            let id = handshakes.spawn(signal.exit().instrument(span)).id();
            names.insert(id, name);
        }

        let report = ExitReport::new();
        while let Some(joined) = handshakes.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(e) => (e.id(), Err(ExitError::Panicked(e.to_string()))),
            };
            if let (Err(err), Some(name)) = (outcome, names.remove(&id)) {
                report.set(name, err);
            }
        }

        if report.is_empty() {
            info!("All actors exited cleanly");
            return None;
        }
        warn!(failed = report.len(), %report, "Exit finished with failures");
        Some(report)
    }

    /// Snapshots and clears the registry in one critical section.
    fn take_round(&self) -> (HashMap<String, ExitSignal>, Option<Duration>) {
        let mut registry = self.registry();
        (std::mem::take(&mut registry.signals), registry.timeout)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("Coordinator")
            .field("name", &self.inner.name)
            .field("timeout", &registry.timeout)
            .field("actors", &registry.signals.len())
            .finish()
    }
}

/// Builder for a [`Coordinator`] with a timeout or an `after_exit` hook.
#[derive(Default)]
pub struct CoordinatorBuilder {
    name: Option<String>,
    timeout: Option<Duration>,
    after_exit: Option<ExitHook>,
}

impl CoordinatorBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Default timeout for signals without their own. `None` or zero waits forever.
    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into().filter(|t| !t.is_zero());
        self
    }

    /// Hook run with the result of every exit round.
    pub fn after_exit<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&ExitReport>) + Send + Sync + 'static,
    {
        self.after_exit = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Coordinator {
        Coordinator {
            inner: Arc::new(Inner {
                name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
                registry: Mutex::new(Registry {
                    signals: HashMap::new(),
                    timeout: self.timeout,
                }),
                after_exit: self.after_exit,
            }),
        }
    }
}
