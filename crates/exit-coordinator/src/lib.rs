//! # Exit Coordinator
//!
//! Cooperative, timeout-bounded shutdown for Tokio applications.
//!
//! Long-running actors register with a [`Coordinator`] and poll the
//! [`ExitListener`] they get back. When it is time to stop, the coordinator
//! asks every actor at once, waits for each to answer through its [`Reply`],
//! and hands back an [`ExitReport`] naming the actors that failed or did not
//! answer in time.
//!
//! ## Actor Side
//!
//! ```rust
//! use exit_coordinator::Coordinator;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new("app");
//!     coordinator.set_timeout(Duration::from_secs(2));
//!
//!     let mut exit = coordinator.register("ticker").unwrap();
//!     tokio::spawn(async move {
//!         let mut ticks = 0u64;
//!         let mut interval = tokio::time::interval(Duration::from_millis(10));
//!         let reply = loop {
//!             tokio::select! {
//!                 Some(reply) = exit.recv() => break reply,
//!                 _ = interval.tick() => ticks += 1,
//!             }
//!         };
//!         println!("stopping after {ticks} ticks");
//!         reply.ok();
//!     });
//!
//!     assert!(coordinator.exit().await.is_none());
//! }
//! ```
//!
//! ## Coordinator Side
//!
//! - [`Coordinator::exit`] runs one round right away.
//! - [`Coordinator::exit_on`] waits for an [`ExitTrigger`] (for example
//!   [`OsSignals::terminate`]) first.
//!
//! Both return `None` for a clean shutdown, so the caller needs one check:
//!
//! ```rust,no_run
//! use exit_coordinator::{Coordinator, OsSignals};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let coordinator = Coordinator::new("app");
//!     // ... register actors ...
//!     if let Some(report) = coordinator.exit_on(OsSignals::terminate()?).await {
//!         report.write_to(std::io::stderr())?;
//!         std::process::exit(1);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Timeouts
//!
//! A timeout bounds each of the two handshake phases separately (delivering
//! the request, then waiting for the reply); see [`signal`] for details. The
//! coordinator's timeout applies to every signal that has none of its own.
//!
//! ## Testing
//!
//! The [`mock`] module provides scripted actors for exercising code that owns
//! a coordinator.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod mock;
pub mod reply;
pub mod report;
pub mod signal;
pub mod tracing;
pub mod trigger;

pub use config::{ConfigError, CoordinatorConfig};
pub use coordinator::{Coordinator, CoordinatorBuilder, ExitHook};
pub use error::ExitError;
pub use reply::{ExitOutcome, Reply};
pub use report::ExitReport;
pub use signal::{ExitListener, ExitSignal, SignalHook};
pub use trigger::{ExitTrigger, OsSignals};
