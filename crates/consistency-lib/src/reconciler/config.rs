//! Reconciler tunables

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Max relative savings move before storage estimates are damped (30%)
pub const STORAGE_MAX_VARIATION: f64 = 0.30;

/// Max relative savings move before compute estimates are damped (25%)
pub const COMPUTE_MAX_VARIATION: f64 = 0.25;

/// Max relative savings move before volume estimates are damped (20%)
pub const VOLUME_MAX_VARIATION: f64 = 0.20;

/// Weight of the new value when damping (70% new, 30% old)
pub const SMOOTHING_FACTOR: f64 = 0.7;

/// Configuration for the consistency reconciler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub storage_max_variation: f64,
    pub compute_max_variation: f64,
    pub volume_max_variation: f64,
    /// Weight of the new savings value in a damped blend
    pub smoothing_factor: f64,
    /// Weight of the higher confidence when blending storage confidences
    pub confidence_bias: f64,
    /// Stale storage findings above this previous confidence are carried forward
    pub persistence_confidence_threshold: f64,
    /// Discount applied to carried-forward savings
    pub persistence_savings_factor: f64,
    /// Relative savings move that counts a matched recommendation as changed
    pub change_threshold: f64,
    /// Summed percent variation at which the variation sub-score reaches 0
    pub variation_normalizer: f64,
    /// Changed-recommendation count at which the churn sub-score reaches 0
    pub change_normalizer: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            storage_max_variation: STORAGE_MAX_VARIATION,
            compute_max_variation: COMPUTE_MAX_VARIATION,
            volume_max_variation: VOLUME_MAX_VARIATION,
            smoothing_factor: SMOOTHING_FACTOR,
            confidence_bias: 0.7,
            persistence_confidence_threshold: 0.6,
            persistence_savings_factor: 0.9,
            change_threshold: 0.2,
            variation_normalizer: 200.0,
            change_normalizer: 10.0,
        }
    }
}

impl ConsistencyConfig {
    /// Reject values that would make the blend or score formulas meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("storage_max_variation", self.storage_max_variation),
            ("compute_max_variation", self.compute_max_variation),
            ("volume_max_variation", self.volume_max_variation),
            ("change_threshold", self.change_threshold),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let unit = [
            ("smoothing_factor", self.smoothing_factor),
            ("confidence_bias", self.confidence_bias),
            (
                "persistence_confidence_threshold",
                self.persistence_confidence_threshold,
            ),
            ("persistence_savings_factor", self.persistence_savings_factor),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }

        let positive = [
            ("variation_normalizer", self.variation_normalizer),
            ("change_normalizer", self.change_normalizer),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        Ok(())
    }
}
