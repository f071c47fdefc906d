use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::graph_data::MergeSummary;

/// Counters updated by the merge task and readable from anywhere.
#[derive(Debug, Default)]
pub struct MergeMetrics {
    extractions_merged: AtomicUsize,
    extractions_rejected: AtomicUsize,
    entities_added: AtomicUsize,
    relationships_added: AtomicUsize,

    // Timing (in microseconds)
    total_merge_time_us: AtomicU64,
}

impl MergeMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_merge(&self, duration: Duration, summary: &MergeSummary) {
        self.extractions_merged.fetch_add(1, Ordering::Relaxed);
        self.entities_added.fetch_add(summary.entities_added, Ordering::Relaxed);
        self.relationships_added
            .fetch_add(summary.relationships_added, Ordering::Relaxed);
        self.total_merge_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, duration: Duration) {
        self.extractions_rejected.fetch_add(1, Ordering::Relaxed);
        self.total_merge_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MergeMetricsSnapshot {
        let merged = self.extractions_merged.load(Ordering::Relaxed);
        let rejected = self.extractions_rejected.load(Ordering::Relaxed);
        let attempts = merged + rejected;
        let total_us = self.total_merge_time_us.load(Ordering::Relaxed) as f64;

        MergeMetricsSnapshot {
            extractions_merged: merged,
            extractions_rejected: rejected,
            entities_added: self.entities_added.load(Ordering::Relaxed),
            relationships_added: self.relationships_added.load(Ordering::Relaxed),
            avg_merge_time_ms: if attempts > 0 {
                total_us / attempts as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeMetricsSnapshot {
    pub extractions_merged: usize,
    pub extractions_rejected: usize,
    pub entities_added: usize,
    pub relationships_added: usize,
    pub avg_merge_time_ms: f64,
}
