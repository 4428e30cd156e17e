use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use docsheet_tabular::sweep_expired;

/// Shortest pause between sweeps, whatever the TTL.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically delete generated files older than `ttl` from `output_dir`.
pub async fn run_output_sweeper(output_dir: PathBuf, ttl: Duration) {
    let interval = (ttl / 4).max(MIN_SWEEP_INTERVAL);
    info!(
        dir = %output_dir.display(),
        ttl_secs = ttl.as_secs(),
        interval_secs = interval.as_secs(),
        "Starting output sweeper"
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let dir = output_dir.clone();
        match tokio::task::spawn_blocking(move || sweep_expired(&dir, ttl)).await {
            Ok(Ok(0)) => {}
            Ok(Ok(removed)) => info!(removed, "Swept expired outputs"),
            Ok(Err(e)) => error!(error = %e, "Output sweep failed"),
            Err(e) => error!(error = %e, "Output sweep task panicked"),
        }
    }
}
