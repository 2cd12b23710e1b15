//! # Scripted Actors for Tests
//!
//! Code that owns a [`Coordinator`] usually needs actors that behave in a
//! specific way at exit time: answer cleanly, fail, stall, or never look at
//! their listener at all. [`MockActor`] scripts that behaviour in one line so
//! tests can focus on what the coordinator reports.
//!
//! This module is public instead of `#[cfg(test)]` so integration tests in
//! `tests/` and downstream crates can use it.
//!
//! ```rust
//! use exit_coordinator::mock::MockActor;
//! use exit_coordinator::Coordinator;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new("test");
//!     coordinator.set_timeout(Duration::from_millis(50));
//!
//!     let ok = MockActor::register(&coordinator, "ok").unwrap().reply_ok().spawn();
//!     MockActor::register(&coordinator, "bad").unwrap().reply_err("boom").spawn();
//!     MockActor::register(&coordinator, "deaf").unwrap().deaf().spawn();
//!
//!     let report = coordinator.exit().await.unwrap();
//!     assert_eq!(report.to_string(), "bad: boom / deaf: timeout");
//!     assert!(ok.was_asked());
//! }
//! ```

use crate::coordinator::Coordinator;
use crate::error::ExitError;
use crate::signal::ExitListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

/// Whether a [`MockActor`] ever polls its listener.
#[derive(Debug, Clone)]
enum Script {
    Answer(Response),
    /// Never polls the listener.
    Deaf,
}

/// What a polling [`MockActor`] does with its exit request.
#[derive(Debug, Clone)]
enum Response {
    Ok,
    Err(String),
    /// Takes the request and never resolves it.
    Hang,
    /// Takes the request and drops the reply unresolved.
    DropReply,
}

/// An actor that answers its exit request according to a script.
#[derive(Debug)]
pub struct MockActor {
    listener: ExitListener,
    script: Script,
    cleanup: Option<Duration>,
}

impl MockActor {
    /// Wraps an existing listener. Replies `ok` unless told otherwise.
    pub fn new(listener: ExitListener) -> Self {
        Self {
            listener,
            script: Script::Answer(Response::Ok),
            cleanup: None,
        }
    }

    /// Registers `name` with `coordinator` and wraps the resulting listener.
    pub fn register(coordinator: &Coordinator, name: &str) -> Result<Self, ExitError> {
        coordinator.register(name).map(Self::new)
    }

    pub fn reply_ok(mut self) -> Self {
        self.script = Script::Answer(Response::Ok);
        self
    }

    pub fn reply_err(mut self, message: impl Into<String>) -> Self {
        self.script = Script::Answer(Response::Err(message.into()));
        self
    }

    pub fn hang(mut self) -> Self {
        self.script = Script::Answer(Response::Hang);
        self
    }

    pub fn drop_reply(mut self) -> Self {
        self.script = Script::Answer(Response::DropReply);
        self
    }

    pub fn deaf(mut self) -> Self {
        self.script = Script::Deaf;
        self
    }

    /// Simulated cleanup time between taking the request and answering it.
    pub fn cleanup(mut self, duration: Duration) -> Self {
        self.cleanup = Some(duration);
        self
    }

    /// Runs the script in a background task.
    pub fn spawn(self) -> MockHandle {
        let asked = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(self.run(asked.clone()));
        MockHandle { asked, task }
    }

    async fn run(mut self, asked: Arc<AtomicBool>) {
        let response = match self.script {
            Script::Answer(response) => response,
            Script::Deaf => {
                // Keep the listener alive so the request is never refused outright.
                let _listener = self.listener;
                return std::future::pending().await;
            }
        };

        let Some(reply) = self.listener.recv().await else {
            return;
        };
        asked.store(true, Ordering::SeqCst);

        if let Some(cleanup) = self.cleanup {
            time::sleep(cleanup).await;
        }

        match response {
            Response::Ok => reply.ok(),
            Response::Err(message) => reply.err(message),
            Response::Hang => {
                let _reply = reply;
                std::future::pending::<()>().await;
            }
            Response::DropReply => drop(reply),
        }
    }
}

/// Handle to a spawned [`MockActor`].
#[derive(Debug)]
pub struct MockHandle {
    asked: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl MockHandle {
    /// Whether the actor has taken its exit request.
    pub fn was_asked(&self) -> bool {
        self.asked.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops a mock that would otherwise run forever (`hang`, `deaf`).
    pub fn abort(&self) {
        self.task.abort();
    }
}
