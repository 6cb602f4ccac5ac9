use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing request activity.
#[derive(Default)]
pub struct RequestMetrics {
    summaries_generated: AtomicU64,
    images_analyzed: AtomicU64,
    conversations_analyzed: AtomicU64,
}

impl RequestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed summarization request.
    pub fn record_summary(&self) {
        self.summaries_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed image analysis request.
    pub fn record_image(&self) {
        self.images_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed conversation analysis request.
    pub fn record_conversation(&self) {
        self.conversations_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            images_analyzed: self.images_analyzed.load(Ordering::Relaxed),
            conversations_analyzed: self.conversations_analyzed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of request counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of summaries generated since startup.
    pub summaries_generated: u64,
    /// Number of images analyzed since startup.
    pub images_analyzed: u64,
    /// Number of conversations analyzed since startup.
    pub conversations_analyzed: u64,
}
