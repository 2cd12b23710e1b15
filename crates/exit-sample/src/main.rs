use exit_coordinator::tracing::setup_tracing;
use exit_coordinator::{Coordinator, CoordinatorConfig, OsSignals};
use exit_sample::CounterWorker;
use std::time::Duration;
use tracing::{error, info};

const WORKERS: usize = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = CoordinatorConfig::from_env().map_err(|e| e.to_string())?;
    let coordinator = Coordinator::from_config(&config);
    if coordinator.timeout().is_none() {
        coordinator.set_timeout(DEFAULT_TIMEOUT);
    }

    for i in 0..WORKERS {
        let name = format!("counter-{i}");
        let interval = Duration::from_millis(700 + 300 * i as u64);
        let worker = CounterWorker::register(&coordinator, &name, interval)
            .map_err(|e| e.to_string())?;
        tokio::spawn(worker.run());
    }

    info!(workers = WORKERS, "Running, press Ctrl-C to stop");
    let trigger = OsSignals::terminate().map_err(|e| e.to_string())?;

    if let Some(report) = coordinator.exit_on(trigger).await {
        error!(failed = report.len(), "Shutdown incomplete");
        if let Err(e) = report.write_to(std::io::stderr()) {
            error!(error = %e, "Failed to write exit report");
        }
        std::process::exit(1);
    }

    info!("Shutdown complete");
    Ok(())
}
