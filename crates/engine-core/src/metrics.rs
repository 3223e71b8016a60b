use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    polls: AtomicU64,
    records_emitted: AtomicU64,
    records_filtered: AtomicU64,
    bytes_emitted: AtomicU64,
    batches_committed: AtomicU64,
    transport_failures: AtomicU64,
    parse_failures: AtomicU64,
    mapping_failures: AtomicU64,
    commit_failures: AtomicU64,
}

/// Counters shared by every worker of a connector.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub polls: u64,
    pub records_emitted: u64,
    pub records_filtered: u64,
    pub bytes_emitted: u64,
    pub batches_committed: u64,
    pub transport_failures: u64,
    pub parse_failures: u64,
    pub mapping_failures: u64,
    pub commit_failures: u64,
}

impl MetricsSnapshot {
    pub fn failures(&self) -> u64 {
        self.transport_failures + self.parse_failures + self.mapping_failures + self.commit_failures
    }
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_polls(&self) {
        self.inner.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records(&self, count: u64) {
        self.inner.records_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_filtered(&self, count: u64) {
        self.inner.records_filtered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner.bytes_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self) {
        self.inner.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transport_failures(&self) {
        self.inner.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_parse_failures(&self) {
        self.inner.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_mapping_failures(&self, count: u64) {
        self.inner.mapping_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_commit_failures(&self) {
        self.inner.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.inner.polls.load(Ordering::Relaxed),
            records_emitted: self.inner.records_emitted.load(Ordering::Relaxed),
            records_filtered: self.inner.records_filtered.load(Ordering::Relaxed),
            bytes_emitted: self.inner.bytes_emitted.load(Ordering::Relaxed),
            batches_committed: self.inner.batches_committed.load(Ordering::Relaxed),
            transport_failures: self.inner.transport_failures.load(Ordering::Relaxed),
            parse_failures: self.inner.parse_failures.load(Ordering::Relaxed),
            mapping_failures: self.inner.mapping_failures.load(Ordering::Relaxed),
            commit_failures: self.inner.commit_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
