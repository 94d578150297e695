//! Observability for reconciliation runs
//!
//! Provides:
//! - Prometheus metrics (reconciliation latency, stability score, savings variation, item origins)
//! - Structured logging of reconciliation outcomes with tracing

use crate::models::{RecommendationOrigin, ReconciliationResult};
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram, register_int_counter,
    register_int_counter_vec, Encoder, Gauge, GaugeVec, Histogram, IntCounter, IntCounterVec,
    TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for reconciliation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1];

/// Stability scores below this are logged as warnings
pub const LOW_STABILITY_THRESHOLD: f64 = 0.5;

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ConsistencyMetricsInner> = OnceLock::new();

struct ConsistencyMetricsInner {
    reconciliations: IntCounter,
    reconcile_latency_seconds: Histogram,
    stability_score: Gauge,
    savings_variation_percent: GaugeVec,
    recommendations_changed: Gauge,
    recommendations_by_origin: IntCounterVec,
}

impl ConsistencyMetricsInner {
    fn new() -> Self {
        Self {
            reconciliations: register_int_counter!(
                "report_consistency_reconciliations_total",
                "Total number of reconciliation runs"
            )
            .expect("Failed to register reconciliations_total"),

            reconcile_latency_seconds: register_histogram!(
                "report_consistency_reconcile_latency_seconds",
                "Time spent reconciling a recommendation set",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register reconcile_latency_seconds"),

            stability_score: register_gauge!(
                "report_consistency_stability_score",
                "Stability score of the most recent reconciliation"
            )
            .expect("Failed to register stability_score"),

            savings_variation_percent: register_gauge_vec!(
                "report_consistency_savings_variation_percent",
                "Aggregate savings variation of the most recent reconciliation",
                &["category"]
            )
            .expect("Failed to register savings_variation_percent"),

            recommendations_changed: register_gauge!(
                "report_consistency_recommendations_changed",
                "Recommendations changed in the most recent reconciliation"
            )
            .expect("Failed to register recommendations_changed"),

            recommendations_by_origin: register_int_counter_vec!(
                "report_consistency_recommendations_total",
                "Reconciled recommendations by origin",
                &["origin"]
            )
            .expect("Failed to register recommendations_total"),
        }
    }
}

/// Reconciliation metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ConsistencyMetrics {
    _private: (),
}

impl Default for ConsistencyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsistencyMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ConsistencyMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ConsistencyMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the outcome of one reconciliation
    pub fn record(&self, result: &ReconciliationResult, duration_secs: f64) {
        let inner = self.inner();
        let report = &result.consistency_report;

        inner.reconciliations.inc();
        inner.reconcile_latency_seconds.observe(duration_secs);
        inner.stability_score.set(report.stability_score);
        inner
            .savings_variation_percent
            .with_label_values(&["storage"])
            .set(report.storage_savings_variation);
        inner
            .savings_variation_percent
            .with_label_values(&["compute"])
            .set(report.compute_savings_variation);
        inner
            .recommendations_changed
            .set(report.recommendations_changed as f64);

        for rec in result.recommendations() {
            inner
                .recommendations_by_origin
                .with_label_values(&[rec.origin().as_str()])
                .inc();
        }
    }

    /// Current stability score gauge value
    pub fn stability_score(&self) -> f64 {
        self.inner().stability_score.get()
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for reconciliation events
#[derive(Clone)]
pub struct StructuredLogger {
    account: String,
}

impl StructuredLogger {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    /// Log the start of a reconciliation
    pub fn log_reconciliation_started(&self, candidates: usize, has_previous: bool) {
        info!(
            event = "reconciliation_started",
            account = %self.account,
            candidates = candidates,
            has_previous = has_previous,
            "Applying consistency logic to recommendations"
        );
    }

    /// Log the outcome of a reconciliation, warning when the run was unstable
    pub fn log_reconciliation_completed(&self, result: &ReconciliationResult) {
        let report = &result.consistency_report;

        info!(
            event = "reconciliation_completed",
            account = %self.account,
            storage_variation_percent = report.storage_savings_variation,
            compute_variation_percent = report.compute_savings_variation,
            recommendations_changed = report.recommendations_changed,
            stability_score = report.stability_score,
            total_savings = result.total_savings,
            new = result.count_by_origin(RecommendationOrigin::New),
            persistent = result.count_by_origin(RecommendationOrigin::Persistent),
            smoothed = result.count_by_origin(RecommendationOrigin::Smoothed),
            "Consistency applied"
        );

        if report.stability_score < LOW_STABILITY_THRESHOLD {
            warn!(
                event = "low_stability",
                account = %self.account,
                stability_score = report.stability_score,
                recommendations_changed = report.recommendations_changed,
                "Recommendations diverged sharply from the previous analysis"
            );
        }
    }

    /// Log that the reconciled set was stored for the next run
    pub fn log_snapshot_written(&self, path: &str) {
        info!(
            event = "snapshot_written",
            account = %self.account,
            path = %path,
            "Stored reconciled recommendations"
        );
    }
}
