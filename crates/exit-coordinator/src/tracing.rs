//! # Observability & Tracing
//!
//! Every exit round runs inside an `exit` span carrying the coordinator name,
//! and every handshake inside an `actor` span, so a single failing actor can
//! be picked out of a busy shutdown log.
//!
//! ```text
//! INFO exit: Exiting actors=3 timeout=Some(2s)
//! INFO exit:actor: Exited
//! WARN exit:actor: Exit failed error=timeout
//! WARN exit: Exit finished with failures failed=1 report=worker: timeout
//! ```
//!
//! Levels are controlled through `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run -p exit-sample
//! RUST_LOG=exit_coordinator=debug cargo run -p exit-sample
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
