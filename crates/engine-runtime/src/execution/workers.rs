use crate::error::RuntimeError;
use engine_processing::producer::{CycleStats, DataProducer, live::PollingCycle};
use futures::future::try_join_all;
use tracing::{error, info};

/// Runs every cycle on its own task and waits for all of them.
///
/// A worker that fails does not stop the others; the first failure is
/// returned once every task has finished.
pub async fn spawn(cycles: Vec<PollingCycle>) -> Result<Vec<(String, CycleStats)>, RuntimeError> {
    info!(workers = cycles.len(), "Launching workers");

    let handles = cycles.into_iter().map(|mut cycle| {
        tokio::spawn(async move {
            let worker = cycle.worker().to_string();
            let result = cycle.run().await;
            (worker, result)
        })
    });

    let results = try_join_all(handles).await?;

    let mut stats = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (worker, result) in results {
        match result {
            Ok(worker_stats) => stats.push((worker, worker_stats)),
            Err(err) => {
                error!(worker = %worker, error = %err, "Worker failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(stats),
    }
}
