//! Consistency service: reconciles a run against the previous snapshot

use super::config::ConsistencyConfig;
use super::smoothing::{savings_variation, stability_score};
use super::{count_changed, stabilize, Stabilize};
use crate::models::{
    ComputeRecommendation, ConsistencyReport, CurrentRun, ReconciliationResult, ReportSnapshot,
    StorageRecommendation, VolumeRecommendation, PERSISTENT_MARKER,
};
use std::collections::HashSet;
use tracing::debug;

/// Stateless reconciler; one instance may be shared across accounts
#[derive(Debug, Clone, Default)]
pub struct ConsistencyService {
    config: ConsistencyConfig,
}

impl ConsistencyService {
    pub fn new() -> Self {
        Self {
            config: ConsistencyConfig::default(),
        }
    }

    pub fn with_config(config: ConsistencyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsistencyConfig {
        &self.config
    }

    /// Reconcile a loaded run against an optional previous snapshot
    pub fn reconcile_run(
        &self,
        run: &CurrentRun,
        previous: Option<&ReportSnapshot>,
    ) -> ReconciliationResult {
        self.reconcile(
            &run.storage_recommendations,
            &run.compute_recommendations,
            &run.volume_recommendations,
            previous,
        )
    }

    /// Reconcile new recommendations against the previous snapshot
    ///
    /// `previous` is `None` for the first analysis of an account; the inputs
    /// are then returned verbatim with a perfect stability score. A snapshot
    /// that lacks a storage or compute result is treated as an empty previous
    /// list for that category.
    pub fn reconcile(
        &self,
        new_storage: &[StorageRecommendation],
        new_compute: &[ComputeRecommendation],
        new_volume: &[VolumeRecommendation],
        previous: Option<&ReportSnapshot>,
    ) -> ReconciliationResult {
        let Some(snapshot) = previous else {
            debug!("No previous report, returning recommendations unchanged");
            let total_savings = sum_savings(new_storage)
                + sum_savings(new_compute)
                + sum_savings(new_volume);

            return ReconciliationResult {
                storage_recommendations: new_storage.to_vec(),
                compute_recommendations: new_compute.to_vec(),
                volume_recommendations: new_volume.to_vec(),
                total_savings,
                consistency_report: ConsistencyReport::baseline(),
            };
        };

        let config = &self.config;
        let previous_storage = snapshot.storage_recommendations();
        let previous_compute = snapshot.compute_recommendations();
        let previous_volume = snapshot.volume_recommendations();

        let mut storage = stabilize(
            new_storage,
            previous_storage,
            config.storage_max_variation,
            config,
        );
        storage.extend(self.persist_stale(new_storage, previous_storage));

        let compute = stabilize(
            new_compute,
            previous_compute,
            config.compute_max_variation,
            config,
        );
        let volume = stabilize(
            new_volume,
            previous_volume,
            config.volume_max_variation,
            config,
        );

        let storage_total = sum_savings(&storage);
        let compute_total = sum_savings(&compute) + sum_savings(&volume);

        let storage_savings_variation = savings_variation(storage_total, snapshot.storage_total());
        let compute_savings_variation = savings_variation(compute_total, snapshot.compute_total());

        // Volume churn does not feed the change count
        let recommendations_changed =
            count_changed(new_storage, previous_storage, config.change_threshold)
                + count_changed(new_compute, previous_compute, config.change_threshold);

        let stability_score = stability_score(
            storage_savings_variation,
            compute_savings_variation,
            recommendations_changed,
            config.variation_normalizer,
            config.change_normalizer,
        );

        debug!(
            storage_variation = storage_savings_variation,
            compute_variation = compute_savings_variation,
            recommendations_changed = recommendations_changed,
            stability_score = stability_score,
            "Consistency applied"
        );

        ReconciliationResult {
            storage_recommendations: storage,
            compute_recommendations: compute,
            volume_recommendations: volume,
            total_savings: storage_total + compute_total,
            consistency_report: ConsistencyReport {
                storage_savings_variation,
                compute_savings_variation,
                recommendations_changed,
                stability_score,
            },
        }
    }

    /// Previous storage findings missing from this run, kept at a discount when they were confident
    fn persist_stale(
        &self,
        new: &[StorageRecommendation],
        previous: &[StorageRecommendation],
    ) -> Vec<StorageRecommendation> {
        let present: HashSet<_> = new.iter().map(Stabilize::matching_key).collect();

        previous
            .iter()
            .filter(|last| !present.contains(&last.matching_key()))
            .filter(|last| last.confidence > self.config.persistence_confidence_threshold)
            .map(|last| {
                debug!(
                    resource = %last.resource_name,
                    category = %last.category,
                    confidence = last.confidence,
                    "Carrying forward stale recommendation"
                );
                StorageRecommendation {
                    potential_savings: last.potential_savings
                        * self.config.persistence_savings_factor,
                    justification: format!("{}{}", PERSISTENT_MARKER, last.justification),
                    ..last.clone()
                }
            })
            .collect()
    }
}

fn sum_savings<T: Stabilize>(recs: &[T]) -> f64 {
    recs.iter().map(Stabilize::potential_savings).sum()
}
