use exit_coordinator::{Coordinator, ExitError, ExitListener, Reply};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorkerError {
    #[error("exit on the odd counter {0}")]
    OddCount(u64),
}

/// Counts ticks until asked to exit.
#[derive(Debug)]
pub struct CounterWorker {
    listener: ExitListener,
    interval: Duration,
}

impl CounterWorker {
    pub fn new(listener: ExitListener, interval: Duration) -> Self {
        Self { listener, interval }
    }

    /// Registers a worker named `name` with the coordinator.
    pub fn register(
        coordinator: &Coordinator,
        name: &str,
        interval: Duration,
    ) -> Result<Self, ExitError> {
        let listener = coordinator.register(name)?;
        Ok(Self::new(listener, interval))
    }

    /// Ticks until an exit request arrives, answers it, and returns the final count.
    ///
    /// Also returns if the exit signal goes away without a request.
    pub async fn run(mut self) -> u64 {
        let name = self.listener.name().to_string();
        let mut ticker = time::interval(self.interval);
        // The first tick of an interval completes immediately.
        ticker.tick().await;
        let mut counter = 0u64;

        let reply = loop {
            tokio::select! {
                request = self.listener.recv() => match request {
                    Some(reply) => break reply,
                    None => {
                        debug!(worker = %name, counter, "Exit signal dropped");
                        return counter;
                    }
                },
                _ = ticker.tick() => {
                    counter += 1;
                    debug!(worker = %name, counter, "Tick");
                }
            }
        };

        info!(worker = %name, counter, "Stopping");
        answer(reply, counter);
        counter
    }
}

fn answer(reply: Reply, counter: u64) {
    match outcome(counter) {
        // Keep the reply alive without answering to simulate a stuck worker.
        None => {
            tokio::spawn(async move {
                let _reply = reply;
                std::future::pending::<()>().await;
            });
        }
        Some(Ok(())) => reply.ok(),
        Some(Err(e)) => reply.err(e),
    }
}

/// What a worker reports for a given count; `None` means it never answers.
pub fn outcome(counter: u64) -> Option<Result<(), WorkerError>> {
    if counter % 5 == 0 {
        None
    } else if counter % 2 == 1 {
        Some(Err(WorkerError::OddCount(counter)))
    } else {
        Some(Ok(()))
    }
}
