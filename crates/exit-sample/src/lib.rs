//! # Exit Sample
//!
//! A small application built on [`exit_coordinator`]: a handful of counter
//! workers tick in the background until the process receives `SIGINT` or
//! `SIGTERM`, then the coordinator asks each of them to stop.
//!
//! How a worker answers depends on its count when asked:
//!
//! - multiple of 5: never answers, so the coordinator's timeout kicks in
//! - odd: fails with [`WorkerError::OddCount`]
//! - otherwise: exits cleanly
//!
//! ```bash
//! RUST_LOG=info cargo run -p exit-sample
//! # press Ctrl-C after a few ticks
//! ```

pub mod worker;

pub use worker::{CounterWorker, WorkerError};
