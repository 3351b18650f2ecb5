//! Translation metrics and observability module.
//!
//! Counts engine calls, engine failures and chunks that fell back to their
//! original text, so degraded translations are visible without surfacing them
//! to callers.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global translation metrics singleton.
pub struct TranslationMetrics {
    /// Number of translation requests accepted by the chunked translator
    requests: AtomicUsize,

    /// Number of calls made to the translation engine
    engine_calls: AtomicUsize,

    /// Number of engine calls that failed
    engine_failures: AtomicUsize,

    /// Number of chunks whose original text was substituted for a translation
    degraded_chunks: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    /// Create a standalone set of counters, all at zero.
    pub fn new() -> Self {
        Self {
            requests: AtomicUsize::new(0),
            engine_calls: AtomicUsize::new(0),
            engine_failures: AtomicUsize::new(0),
            degraded_chunks: AtomicUsize::new(0),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_call(&self) {
        self.engine_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_engine_failure(&self) {
        self.engine_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded_chunk(&self) {
        self.degraded_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn engine_calls(&self) -> usize {
        self.engine_calls.load(Ordering::Relaxed)
    }

    pub fn engine_failures(&self) -> usize {
        self.engine_failures.load(Ordering::Relaxed)
    }

    pub fn degraded_chunks(&self) -> usize {
        self.degraded_chunks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.engine_calls();
        let failures = self.engine_failures();
        let engine_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            requests: self.requests(),
            engine_calls: calls,
            engine_failures: failures,
            engine_success_rate,
            degraded_chunks: self.degraded_chunks(),
        }
    }
}

impl Default for TranslationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub requests: usize,

    pub engine_calls: usize,

    pub engine_failures: usize,

    /// Engine success rate as a percentage (0-100)
    pub engine_success_rate: f64,

    pub degraded_chunks: usize,
}
