use std::{
    fmt,
    sync::{Arc, OnceLock},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Process signal that asked the connector to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopSignal::Interrupt => write!(f, "SIGINT"),
            StopSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Turns the first stop signal into cancellation of every polling worker.
/// In-flight requests and throttle waits observe the token and end the
/// current iteration without committing.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    workers: CancellationToken,
    received: Arc<OnceLock<StopSignal>>,
}

impl ShutdownCoordinator {
    pub fn new(workers: CancellationToken) -> Self {
        Self {
            workers,
            received: Arc::new(OnceLock::new()),
        }
    }

    /// Spawns the signal listener.
    pub fn listen(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let signal = next_signal().await;
            coordinator.stop(signal);
        });
    }

    fn stop(&self, signal: StopSignal) {
        if self.received.set(signal).is_ok() {
            info!(signal = %signal, "Stop requested, cancelling polling workers");
        }
        self.workers.cancel();
    }

    pub fn received(&self) -> Option<StopSignal> {
        self.received.get().copied()
    }

    pub fn worker_token(&self) -> CancellationToken {
        self.workers.clone()
    }
}

async fn next_signal() -> StopSignal {
    tokio::select! {
        _ = interrupt() => StopSignal::Interrupt,
        _ = terminate() => StopSignal::Terminate,
    }
}

async fn interrupt() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "Cannot listen for SIGINT");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(err) => {
            error!(error = %err, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_is_kept_and_workers_cancelled() {
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());
        let worker = coordinator.worker_token().child_token();
        assert_eq!(coordinator.received(), None);

        coordinator.stop(StopSignal::Terminate);
        coordinator.stop(StopSignal::Interrupt);

        assert_eq!(coordinator.received(), Some(StopSignal::Terminate));
        assert!(worker.is_cancelled());
    }
}
