use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    requests_summarized: AtomicU64,
    requests_failed: AtomicU64,
    chunks_summarized: AtomicU64,
    chunk_failures: AtomicU64,
    second_passes: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed request along with its per-chunk results.
    pub fn record_summary(&self, chunks_ok: u64, chunks_failed: u64, resummarized: bool) {
        self.requests_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunks_ok, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(chunks_failed, Ordering::Relaxed);
        if resummarized {
            self.second_passes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a request that ended in an error response.
    pub fn record_failure(&self, chunks_failed: u64) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.chunk_failures
            .fetch_add(chunks_failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_summarized: self.requests_summarized.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            second_passes: self.second_passes.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Requests that produced a summary since startup.
    pub requests_summarized: u64,
    /// Requests rejected or failed after validation.
    pub requests_failed: u64,
    /// Chunks the summarizer handled successfully.
    pub chunks_summarized: u64,
    /// Chunks skipped because the summarizer returned an error.
    pub chunk_failures: u64,
    /// Requests whose joined partial summaries needed a second pass.
    pub second_passes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_summaries_and_chunk_results() {
        let metrics = SummaryMetrics::new();
        metrics.record_summary(2, 1, false);
        metrics.record_summary(3, 0, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_summarized, 2);
        assert_eq!(snapshot.chunks_summarized, 5);
        assert_eq!(snapshot.chunk_failures, 1);
        assert_eq!(snapshot.second_passes, 1);
    }

    #[test]
    fn failures_count_separately() {
        let metrics = SummaryMetrics::new();
        metrics.record_failure(4);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_summarized, 0);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.chunk_failures, 4);
    }
}
