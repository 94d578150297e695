//! Recommendation consistency reconciler
//!
//! Reconciles a freshly computed recommendation set against the previous
//! analysis run:
//! - Matched recommendations have large savings swings damped
//! - Unmatched recommendations are tagged as new
//! - Confident storage findings that were not re-detected are carried forward
//! - A stability score summarizes the run-to-run drift

mod config;
mod service;
mod smoothing;

#[cfg(test)]
mod tests;

pub use config::{
    ConsistencyConfig, COMPUTE_MAX_VARIATION, SMOOTHING_FACTOR, STORAGE_MAX_VARIATION,
    VOLUME_MAX_VARIATION,
};
pub use service::ConsistencyService;
pub use smoothing::{savings_variation, smooth_confidence, smooth_savings, stability_score};

use crate::models::{
    Category, ComputeRecommendation, ResourceKind, StorageRecommendation, VolumeRecommendation,
    NEW_MARKER, SMOOTHED_NOTE,
};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Per-category seam of the stabilization pass
pub trait Stabilize: Clone {
    /// Equality key pairing a new recommendation with its previous counterpart
    type Key: Eq + Hash;

    const KIND: ResourceKind;

    fn matching_key(&self) -> Self::Key;

    fn resource_id(&self) -> &str;

    fn potential_savings(&self) -> f64;

    fn set_potential_savings(&mut self, savings: f64);

    fn justification_mut(&mut self) -> &mut String;

    /// Merge non-savings fields with the matched previous entry
    fn blend_with_previous(&mut self, _previous: &Self, _config: &ConsistencyConfig) {}
}

impl Stabilize for StorageRecommendation {
    type Key = (String, Category);

    const KIND: ResourceKind = ResourceKind::Storage;

    fn matching_key(&self) -> Self::Key {
        (self.resource_name.clone(), self.category)
    }

    fn resource_id(&self) -> &str {
        &self.resource_name
    }

    fn potential_savings(&self) -> f64 {
        self.potential_savings
    }

    fn set_potential_savings(&mut self, savings: f64) {
        self.potential_savings = savings;
    }

    fn justification_mut(&mut self) -> &mut String {
        &mut self.justification
    }

    fn blend_with_previous(&mut self, previous: &Self, config: &ConsistencyConfig) {
        self.confidence =
            smooth_confidence(self.confidence, previous.confidence, config.confidence_bias);
    }
}

impl Stabilize for ComputeRecommendation {
    type Key = (String, String);

    const KIND: ResourceKind = ResourceKind::Compute;

    fn matching_key(&self) -> Self::Key {
        (self.resource_id.clone(), self.recommendation_type.clone())
    }

    fn resource_id(&self) -> &str {
        &self.resource_id
    }

    fn potential_savings(&self) -> f64 {
        self.potential_savings
    }

    fn set_potential_savings(&mut self, savings: f64) {
        self.potential_savings = savings;
    }

    fn justification_mut(&mut self) -> &mut String {
        &mut self.justification
    }
}

impl Stabilize for VolumeRecommendation {
    type Key = String;

    const KIND: ResourceKind = ResourceKind::Volume;

    fn matching_key(&self) -> Self::Key {
        self.resource_id.clone()
    }

    fn resource_id(&self) -> &str {
        &self.resource_id
    }

    fn potential_savings(&self) -> f64 {
        self.potential_savings
    }

    fn set_potential_savings(&mut self, savings: f64) {
        self.potential_savings = savings;
    }

    fn justification_mut(&mut self) -> &mut String {
        &mut self.justification
    }
}

/// Index previous recommendations by matching key; the first entry wins on duplicates
fn index_previous<T: Stabilize>(previous: &[T]) -> HashMap<T::Key, &T> {
    let mut index = HashMap::with_capacity(previous.len());
    for rec in previous {
        index.entry(rec.matching_key()).or_insert(rec);
    }
    index
}

/// Stabilize one category of new recommendations against its previous list
pub(crate) fn stabilize<T: Stabilize>(
    new: &[T],
    previous: &[T],
    max_variation: f64,
    config: &ConsistencyConfig,
) -> Vec<T> {
    let index = index_previous(previous);
    let mut stabilized = Vec::with_capacity(new.len());

    for new_rec in new {
        let mut rec = new_rec.clone();

        match index.get(&new_rec.matching_key()) {
            Some(last) => {
                let smoothed = smooth_savings(
                    new_rec.potential_savings(),
                    last.potential_savings(),
                    max_variation,
                    config.smoothing_factor,
                );
                rec.blend_with_previous(last, config);
                rec.set_potential_savings(smoothed);

                if smoothed != new_rec.potential_savings() {
                    debug!(
                        kind = %T::KIND,
                        resource = %new_rec.resource_id(),
                        new_savings = new_rec.potential_savings(),
                        previous_savings = last.potential_savings(),
                        smoothed_savings = smoothed,
                        "Smoothed savings estimate"
                    );
                    rec.justification_mut().push_str(SMOOTHED_NOTE);
                }
            }
            None => {
                debug!(kind = %T::KIND, resource = %new_rec.resource_id(), "New recommendation");
                rec.justification_mut().insert_str(0, NEW_MARKER);
            }
        }

        stabilized.push(rec);
    }

    stabilized
}

/// Count new recommendations that are unmatched or moved more than `change_threshold`
///
/// Works on the pre-smoothing values.
pub(crate) fn count_changed<T: Stabilize>(new: &[T], previous: &[T], change_threshold: f64) -> usize {
    let index = index_previous(previous);

    new.iter()
        .filter(|new_rec| match index.get(&new_rec.matching_key()) {
            Some(last) => {
                (new_rec.potential_savings() - last.potential_savings()).abs()
                    > last.potential_savings() * change_threshold
            }
            None => true,
        })
        .count()
}
