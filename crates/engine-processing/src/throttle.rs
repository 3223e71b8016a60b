use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What the previous poll looked like.
#[derive(Debug, Clone, Copy)]
pub struct PollOutcome {
    pub started_at: Instant,
    /// Records handed to the log by that poll.
    pub records: usize,
}

impl PollOutcome {
    pub fn new(started_at: Instant, records: usize) -> Self {
        Self {
            started_at,
            records,
        }
    }
}

pub trait Throttler: Send {
    /// Interval between the start of the previous poll and the next one.
    fn poll_interval(&mut self, previous: &PollOutcome) -> Duration;
}

#[derive(Debug, Clone)]
pub struct FixedThrottler {
    interval: Duration,
}

impl FixedThrottler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Throttler for FixedThrottler {
    fn poll_interval(&mut self, _previous: &PollOutcome) -> Duration {
        self.interval
    }
}

/// Polls faster while the backend keeps returning data and backs off
/// geometrically while it does not, bounded by `[min, max]`.
#[derive(Debug, Clone)]
pub struct AdaptiveThrottler {
    min: Duration,
    max: Duration,
    factor: f64,
    current: Duration,
}

impl AdaptiveThrottler {
    pub fn new(min: Duration, max: Duration, factor: f64) -> Self {
        let max = max.max(min);
        Self {
            min,
            max,
            factor: factor.max(1.0),
            current: max,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

impl Throttler for AdaptiveThrottler {
    fn poll_interval(&mut self, previous: &PollOutcome) -> Duration {
        self.current = if previous.records > 0 {
            self.current.div_f64(self.factor).max(self.min)
        } else {
            self.current.mul_f64(self.factor).min(self.max)
        };
        self.current
    }
}

/// Sleeps for `interval` unless cancelled first. Returns `false` when the
/// wait was interrupted.
pub async fn wait(interval: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if interval.is_zero() {
        return true;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}
