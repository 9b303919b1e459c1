//! Metrics and observability for soma_findings

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde::{Deserialize, Serialize};

/// Global metrics collector
#[derive(Default)]
pub struct Metrics {
    pub total_requests: AtomicU64,
    pub successful_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub total_latency_ms: AtomicU64,

    // Per-operation counters
    pub extract_count: AtomicU64,
    pub format_date_count: AtomicU64,
    pub format_coordinates_count: AtomicU64,
    pub resolve_device_count: AtomicU64,
    pub score_authenticity_count: AtomicU64,

    // Extraction outcomes
    pub extractions: AtomicU64,
    pub enhanced_used: AtomicU64,
    pub fallback_used: AtomicU64,
    pub enhanced_failures: AtomicU64,
    pub enhanced_timeouts: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, op: &str, success: bool, latency_ms: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        // Increment operation-specific counter
        match op {
            "findings.extract" => self.extract_count.fetch_add(1, Ordering::Relaxed),
            "findings.format_date" => self.format_date_count.fetch_add(1, Ordering::Relaxed),
            "findings.format_coordinates" => self.format_coordinates_count.fetch_add(1, Ordering::Relaxed),
            "findings.resolve_device" => self.resolve_device_count.fetch_add(1, Ordering::Relaxed),
            "findings.score_authenticity" => self.score_authenticity_count.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };
    }

    /// Count one completed extraction and which path produced it
    pub fn record_extraction(&self, enhanced: bool) {
        self.extractions.fetch_add(1, Ordering::Relaxed);
        if enhanced {
            self.enhanced_used.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fallback_used.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_enhanced_failure(&self, timed_out: bool) {
        self.enhanced_failures.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.enhanced_timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let successful = self.successful_requests.load(Ordering::Relaxed);
        let failed = self.failed_requests.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            error_rate: if total > 0 { failed as f64 / total as f64 } else { 0.0 },
            avg_latency_ms: if total > 0 { total_latency / total } else { 0 },
            operations: OperationMetrics {
                extract: self.extract_count.load(Ordering::Relaxed),
                format_date: self.format_date_count.load(Ordering::Relaxed),
                format_coordinates: self.format_coordinates_count.load(Ordering::Relaxed),
                resolve_device: self.resolve_device_count.load(Ordering::Relaxed),
                score_authenticity: self.score_authenticity_count.load(Ordering::Relaxed),
            },
            extraction: ExtractionMetrics {
                total: self.extractions.load(Ordering::Relaxed),
                enhanced: self.enhanced_used.load(Ordering::Relaxed),
                fallback: self.fallback_used.load(Ordering::Relaxed),
                enhanced_failures: self.enhanced_failures.load(Ordering::Relaxed),
                enhanced_timeouts: self.enhanced_timeouts.load(Ordering::Relaxed),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: u64,
    pub operations: OperationMetrics,
    pub extraction: ExtractionMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub extract: u64,
    pub format_date: u64,
    pub format_coordinates: u64,
    pub resolve_device: u64,
    pub score_authenticity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetrics {
    pub total: u64,
    pub enhanced: u64,
    pub fallback: u64,
    pub enhanced_failures: u64,
    pub enhanced_timeouts: u64,
}
