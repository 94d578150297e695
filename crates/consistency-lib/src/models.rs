//! Core data models for recommendation reconciliation
//!
//! Wire names follow the persisted analysis JSON (`bucketName`,
//! `aiGeneratedReport`, ...); the resource-neutral names are accepted as
//! aliases on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Prefix for recommendations with no counterpart in the previous run
pub const NEW_MARKER: &str = "[NEW] ";

/// Prefix for stale storage recommendations carried forward from the previous run
pub const PERSISTENT_MARKER: &str = "[PERSISTENT] ";

/// Suffix appended when a savings estimate was damped
pub const SMOOTHED_NOTE: &str =
    " [Note: Savings estimate smoothed for consistency with previous analysis]";

/// Default confidence for compute recommendations that carry none
pub const DEFAULT_COMPUTE_CONFIDENCE: f64 = 0.85;

/// Recommendation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cost,
    Security,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cost => "cost",
            Category::Security => "security",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object-storage (bucket) recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecommendation {
    #[serde(rename = "bucketName", alias = "resourceName")]
    pub resource_name: String,
    pub category: Category,
    #[serde(default)]
    pub object_count: u64,
    #[serde(rename = "currentStorageClass", alias = "currentTier")]
    pub current_tier: String,
    #[serde(rename = "recommendedStorageClass", alias = "recommendedTier")]
    pub recommended_tier: String,
    /// Monthly savings estimate
    pub potential_savings: f64,
    /// Confidence in the finding, 0.0-1.0
    pub confidence: f64,
    #[serde(rename = "aiGeneratedReport", alias = "justification")]
    pub justification: String,
}

/// Compute-instance recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRecommendation {
    #[serde(rename = "instanceId", alias = "resourceId")]
    pub resource_id: String,
    #[serde(rename = "instanceType", alias = "resourceType")]
    pub resource_type: String,
    /// Free-form label such as "downsize"
    pub recommendation_type: String,
    pub category: Category,
    pub potential_savings: f64,
    /// Carried through untouched; never smoothed
    #[serde(default = "default_compute_confidence")]
    pub confidence: f64,
    #[serde(rename = "aiGeneratedReport", alias = "justification")]
    pub justification: String,
}

fn default_compute_confidence() -> f64 {
    DEFAULT_COMPUTE_CONFIDENCE
}

/// Block-volume recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRecommendation {
    #[serde(rename = "volumeId", alias = "resourceId")]
    pub resource_id: String,
    /// Volume size in GiB
    pub size: u64,
    pub volume_type: String,
    pub category: Category,
    pub potential_savings: f64,
    #[serde(rename = "aiGeneratedReport", alias = "justification")]
    pub justification: String,
}

/// Resource category a recommendation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Storage,
    Compute,
    Volume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Storage => f.write_str("storage"),
            ResourceKind::Compute => f.write_str("compute"),
            ResourceKind::Volume => f.write_str("volume"),
        }
    }
}

/// Where a reconciled recommendation came from, read back from its justification markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationOrigin {
    /// No counterpart in the previous run
    New,
    /// Not re-detected, carried forward from the previous run
    Persistent,
    /// Matched, with the savings estimate damped
    Smoothed,
    /// Matched, passed through unchanged
    Carried,
}

impl RecommendationOrigin {
    pub fn from_justification(justification: &str) -> Self {
        if justification.starts_with(PERSISTENT_MARKER) {
            RecommendationOrigin::Persistent
        } else if justification.starts_with(NEW_MARKER) {
            RecommendationOrigin::New
        } else if justification.ends_with(SMOOTHED_NOTE) {
            RecommendationOrigin::Smoothed
        } else {
            RecommendationOrigin::Carried
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationOrigin::New => "new",
            RecommendationOrigin::Persistent => "persistent",
            RecommendationOrigin::Smoothed => "smoothed",
            RecommendationOrigin::Carried => "carried",
        }
    }
}

/// Any recommendation, tagged by resource kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recommendation {
    Storage(StorageRecommendation),
    Compute(ComputeRecommendation),
    Volume(VolumeRecommendation),
}

impl Recommendation {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Recommendation::Storage(_) => ResourceKind::Storage,
            Recommendation::Compute(_) => ResourceKind::Compute,
            Recommendation::Volume(_) => ResourceKind::Volume,
        }
    }

    /// Bucket name, instance id or volume id
    pub fn resource_id(&self) -> &str {
        match self {
            Recommendation::Storage(r) => &r.resource_name,
            Recommendation::Compute(r) => &r.resource_id,
            Recommendation::Volume(r) => &r.resource_id,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Recommendation::Storage(r) => r.category,
            Recommendation::Compute(r) => r.category,
            Recommendation::Volume(r) => r.category,
        }
    }

    pub fn potential_savings(&self) -> f64 {
        match self {
            Recommendation::Storage(r) => r.potential_savings,
            Recommendation::Compute(r) => r.potential_savings,
            Recommendation::Volume(r) => r.potential_savings,
        }
    }

    /// Confidence, where the category carries one
    pub fn confidence(&self) -> Option<f64> {
        match self {
            Recommendation::Storage(r) => Some(r.confidence),
            Recommendation::Compute(r) => Some(r.confidence),
            Recommendation::Volume(_) => None,
        }
    }

    pub fn justification(&self) -> &str {
        match self {
            Recommendation::Storage(r) => &r.justification,
            Recommendation::Compute(r) => &r.justification,
            Recommendation::Volume(r) => &r.justification,
        }
    }

    pub fn origin(&self) -> RecommendationOrigin {
        RecommendationOrigin::from_justification(self.justification())
    }
}

/// Candidate recommendations produced by the current analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRun {
    #[serde(default, alias = "s3Recommendations")]
    pub storage_recommendations: Vec<StorageRecommendation>,
    #[serde(default, alias = "ec2Recommendations")]
    pub compute_recommendations: Vec<ComputeRecommendation>,
    #[serde(default, alias = "ebsRecommendations")]
    pub volume_recommendations: Vec<VolumeRecommendation>,
}

impl CurrentRun {
    pub fn len(&self) -> usize {
        self.storage_recommendations.len()
            + self.compute_recommendations.len()
            + self.volume_recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stored storage analysis of a previous run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageResult {
    #[serde(default, alias = "totalStorageGB")]
    pub total_storage_gb: Option<f64>,
    #[serde(default)]
    pub total_object_count: Option<u64>,
    /// Stored aggregate; persisted as a decimal string
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub potential_savings: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<StorageRecommendation>,
    pub created_at: DateTime<Utc>,
}

impl StorageResult {
    /// Aggregate savings of the run: the stored figure, else the sum of its recommendations
    pub fn savings_total(&self) -> f64 {
        self.potential_savings
            .unwrap_or_else(|| self.recommendations.iter().map(|r| r.potential_savings).sum())
    }
}

/// Stored compute analysis of a previous run, covering instances and volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResult {
    #[serde(default)]
    pub total_instances: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub potential_savings: Option<f64>,
    #[serde(default, alias = "utilizationRecommendations")]
    pub instance_recommendations: Vec<ComputeRecommendation>,
    #[serde(default, alias = "unusedEBSVolumes")]
    pub volume_recommendations: Vec<VolumeRecommendation>,
    pub created_at: DateTime<Utc>,
}

impl ComputeResult {
    /// Pooled instance + volume savings: the stored figure, else the sum of both lists
    pub fn savings_total(&self) -> f64 {
        self.potential_savings.unwrap_or_else(|| {
            self.instance_recommendations
                .iter()
                .map(|r| r.potential_savings)
                .sum::<f64>()
                + self
                    .volume_recommendations
                    .iter()
                    .map(|r| r.potential_savings)
                    .sum::<f64>()
        })
    }
}

/// Output of the most recently completed analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    #[serde(default)]
    pub analysis_run_id: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "s3Results")]
    pub storage_result: Option<StorageResult>,
    #[serde(default, alias = "ec2Results")]
    pub compute_result: Option<ComputeResult>,
}

impl ReportSnapshot {
    pub fn storage_total(&self) -> f64 {
        self.storage_result
            .as_ref()
            .map(StorageResult::savings_total)
            .unwrap_or(0.0)
    }

    pub fn compute_total(&self) -> f64 {
        self.compute_result
            .as_ref()
            .map(ComputeResult::savings_total)
            .unwrap_or(0.0)
    }

    pub fn storage_recommendations(&self) -> &[StorageRecommendation] {
        self.storage_result
            .as_ref()
            .map(|r| r.recommendations.as_slice())
            .unwrap_or(&[])
    }

    pub fn compute_recommendations(&self) -> &[ComputeRecommendation] {
        self.compute_result
            .as_ref()
            .map(|r| r.instance_recommendations.as_slice())
            .unwrap_or(&[])
    }

    pub fn volume_recommendations(&self) -> &[VolumeRecommendation] {
        self.compute_result
            .as_ref()
            .map(|r| r.volume_recommendations.as_slice())
            .unwrap_or(&[])
    }

    /// Newest creation timestamp among the stored results
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let storage = self.storage_result.as_ref().map(|r| r.created_at);
        let compute = self.compute_result.as_ref().map(|r| r.created_at);
        storage.max(compute).or(self.completed_at)
    }
}

/// Run-to-run drift of a reconciled recommendation set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyReport {
    /// Percent change of aggregate storage savings
    #[serde(alias = "s3SavingsVariation")]
    pub storage_savings_variation: f64,
    /// Percent change of pooled compute + volume savings
    #[serde(alias = "ec2SavingsVariation")]
    pub compute_savings_variation: f64,
    pub recommendations_changed: usize,
    /// 0-1, where 1 is most stable
    pub stability_score: f64,
}

impl ConsistencyReport {
    /// Report for a first-ever run
    pub fn baseline() -> Self {
        Self {
            storage_savings_variation: 0.0,
            compute_savings_variation: 0.0,
            recommendations_changed: 0,
            stability_score: 1.0,
        }
    }
}

/// Reconciled recommendations plus consistency metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub storage_recommendations: Vec<StorageRecommendation>,
    pub compute_recommendations: Vec<ComputeRecommendation>,
    pub volume_recommendations: Vec<VolumeRecommendation>,
    pub total_savings: f64,
    pub consistency_report: ConsistencyReport,
}

impl ReconciliationResult {
    pub fn storage_total(&self) -> f64 {
        self.storage_recommendations
            .iter()
            .map(|r| r.potential_savings)
            .sum()
    }

    /// Compute and volume savings, pooled the way the compute variation is measured
    pub fn compute_total(&self) -> f64 {
        self.compute_recommendations
            .iter()
            .map(|r| r.potential_savings)
            .sum::<f64>()
            + self
                .volume_recommendations
                .iter()
                .map(|r| r.potential_savings)
                .sum::<f64>()
    }

    /// All reconciled recommendations, storage first, then compute, then volume
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.storage_recommendations
            .iter()
            .cloned()
            .map(Recommendation::Storage)
            .chain(
                self.compute_recommendations
                    .iter()
                    .cloned()
                    .map(Recommendation::Compute),
            )
            .chain(
                self.volume_recommendations
                    .iter()
                    .cloned()
                    .map(Recommendation::Volume),
            )
            .collect()
    }

    pub fn count_by_origin(&self, origin: RecommendationOrigin) -> usize {
        self.recommendations()
            .iter()
            .filter(|r| r.origin() == origin)
            .count()
    }

    /// Snapshot to hand to the next run
    pub fn to_snapshot(&self, analysis_run_id: Option<String>, now: DateTime<Utc>) -> ReportSnapshot {
        let object_count = self
            .storage_recommendations
            .iter()
            .map(|r| r.object_count)
            .sum();

        ReportSnapshot {
            analysis_run_id,
            completed_at: Some(now),
            storage_result: Some(StorageResult {
                total_storage_gb: None,
                total_object_count: Some(object_count),
                potential_savings: Some(self.storage_total()),
                recommendations: self.storage_recommendations.clone(),
                created_at: now,
            }),
            compute_result: Some(ComputeResult {
                total_instances: Some(self.compute_recommendations.len() as u32),
                potential_savings: Some(self.compute_total()),
                instance_recommendations: self.compute_recommendations.clone(),
                volume_recommendations: self.volume_recommendations.clone(),
                created_at: now,
            }),
        }
    }
}

/// Accepts a savings aggregate stored either as a number or a decimal string
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Number(value)) => Ok(Some(value)),
        Some(Amount::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e))),
    }
}
