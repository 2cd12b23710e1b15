//! # Exit Reports
//!
//! The aggregated result of one exit round. Only failures are recorded; an
//! actor that exited cleanly has no entry at all.
//!
//! Only the [`Coordinator`](crate::Coordinator) writes to a report; once a
//! round hands it back, callers can read and render it but not change it.
//!
//! Rendering is always sorted by actor name so the same round produces the
//! same text every time:
//!
//! ```rust
//! use exit_coordinator::mock::MockActor;
//! use exit_coordinator::Coordinator;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new("app");
//!     coordinator.set_timeout(Duration::from_millis(20));
//!     MockActor::register(&coordinator, "worker").unwrap().reply_err("still busy").spawn();
//!     MockActor::register(&coordinator, "db").unwrap().deaf().spawn();
//!
//!     let report = coordinator.exit().await.unwrap();
//!     assert_eq!(report.to_string(), "db: timeout / worker: still busy");
//!
//!     let mut out = Vec::new();
//!     report.write_to(&mut out).unwrap();
//!     assert_eq!(String::from_utf8(out).unwrap(), "db: timeout\nworker: still busy\n");
//! }
//! ```

use crate::error::ExitError;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Thread-safe map from actor name to the error it exited with.
///
/// Read-only outside this crate:
///
/// ```rust,compile_fail
/// use exit_coordinator::{ExitError, ExitReport};
///
/// fn tamper(report: &ExitReport) {
///     report.set("injected", ExitError::Timeout);
/// }
/// ```
pub struct ExitReport {
    errors: RwLock<BTreeMap<String, ExitError>>,
}

impl ExitReport {
    pub(crate) fn new() -> Self {
        Self {
            errors: RwLock::new(BTreeMap::new()),
        }
    }

    /// Records `err` for `name`, replacing any earlier entry.
    pub(crate) fn set(&self, name: impl Into<String>, err: ExitError) {
        self.errors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), err);
    }

    /// Returns the error recorded for `name`, or `None` if it exited cleanly.
    pub fn get(&self, name: &str) -> Option<ExitError> {
        self.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Names of all failed actors, sorted ascending.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of all entries, sorted by name.
    pub fn entries(&self) -> Vec<(String, ExitError)> {
        self.read()
            .iter()
            .map(|(name, err)| (name.clone(), err.clone()))
            .collect()
    }

    /// Writes one `name: error` line per entry and returns the number of bytes written.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<usize> {
        let mut total = 0;
        for (name, err) in self.read().iter() {
            let line = format!("{name}: {err}\n");
            writer.write_all(line.as_bytes())?;
            total += line.len();
        }
        writer.flush()?;
        Ok(total)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ExitError>> {
        self.errors.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for ExitReport {
    fn clone(&self) -> Self {
        Self {
            errors: RwLock::new(self.read().clone()),
        }
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, err)) in self.read().iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{name}: {err}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.read().iter()).finish()
    }
}

impl std::error::Error for ExitReport {}
