//! Scenario tests for the reconciler
//!
//! Mirrors a realistic two-run sequence: a first analysis with no history,
//! then a second analysis reconciled against the stored first run.

use crate::models::{
    Category, ComputeRecommendation, ComputeResult, CurrentRun, RecommendationOrigin,
    ReportSnapshot, StorageRecommendation, StorageResult, VolumeRecommendation, NEW_MARKER,
    PERSISTENT_MARKER, SMOOTHED_NOTE,
};
use crate::reconciler::ConsistencyService;
use chrono::{TimeZone, Utc};

fn current_storage() -> Vec<StorageRecommendation> {
    vec![
        StorageRecommendation {
            resource_name: "test-bucket-1".to_string(),
            category: Category::Cost,
            object_count: 1000,
            current_tier: "STANDARD".to_string(),
            recommended_tier: "STANDARD_IA".to_string(),
            potential_savings: 150.50,
            confidence: 0.85,
            justification: "This bucket has objects older than 30 days that could benefit from Infrequent Access storage class.".to_string(),
        },
        StorageRecommendation {
            resource_name: "test-bucket-2".to_string(),
            category: Category::Cost,
            object_count: 0,
            current_tier: "EMPTY".to_string(),
            recommended_tier: "DELETE".to_string(),
            potential_savings: 0.50,
            confidence: 0.95,
            justification: "Empty bucket that can be safely deleted.".to_string(),
        },
    ]
}

fn current_compute() -> Vec<ComputeRecommendation> {
    vec![ComputeRecommendation {
        resource_id: "i-1234567890abcdef0".to_string(),
        resource_type: "t3.large".to_string(),
        recommendation_type: "downsize".to_string(),
        category: Category::Cost,
        potential_savings: 45.20,
        confidence: 0.85,
        justification: "Instance shows low CPU utilization and could be downsized to t3.medium.".to_string(),
    }]
}

fn current_volume() -> Vec<VolumeRecommendation> {
    vec![VolumeRecommendation {
        resource_id: "vol-1234567890abcdef0".to_string(),
        size: 100,
        volume_type: "gp2".to_string(),
        category: Category::Cost,
        potential_savings: 8.00,
        justification: "Unused EBS volume that can be deleted.".to_string(),
    }]
}

fn previous_snapshot() -> ReportSnapshot {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    ReportSnapshot {
        analysis_run_id: Some("run-1".to_string()),
        completed_at: Some(created_at),
        storage_result: Some(StorageResult {
            total_storage_gb: Some(1.0),
            total_object_count: Some(1000),
            potential_savings: Some(140.00),
            recommendations: vec![StorageRecommendation {
                resource_name: "test-bucket-1".to_string(),
                category: Category::Cost,
                object_count: 1000,
                current_tier: "STANDARD".to_string(),
                recommended_tier: "STANDARD_IA".to_string(),
                potential_savings: 140.00,
                confidence: 0.80,
                justification: "Previous analysis of this bucket.".to_string(),
            }],
            created_at,
        }),
        compute_result: Some(ComputeResult {
            total_instances: Some(1),
            potential_savings: Some(50.00),
            instance_recommendations: vec![ComputeRecommendation {
                resource_id: "i-1234567890abcdef0".to_string(),
                resource_type: "t3.large".to_string(),
                recommendation_type: "downsize".to_string(),
                category: Category::Cost,
                potential_savings: 40.00,
                confidence: 0.85,
                justification: "Previous analysis of this instance.".to_string(),
            }],
            volume_recommendations: vec![VolumeRecommendation {
                resource_id: "vol-1234567890abcdef0".to_string(),
                size: 100,
                volume_type: "gp2".to_string(),
                category: Category::Cost,
                potential_savings: 10.00,
                justification: "Previous analysis of this volume.".to_string(),
            }],
            created_at,
        }),
    }
}

#[test]
fn test_first_analysis_is_identity() {
    let service = ConsistencyService::new();
    let storage = current_storage();
    let compute = current_compute();
    let volume = current_volume();

    let result = service.reconcile(&storage, &compute, &volume, None);

    assert_eq!(result.storage_recommendations, storage);
    assert_eq!(result.compute_recommendations, compute);
    assert_eq!(result.volume_recommendations, volume);
    assert!((result.total_savings - 204.2).abs() < 1e-9);
    assert_eq!(result.consistency_report.storage_savings_variation, 0.0);
    assert_eq!(result.consistency_report.compute_savings_variation, 0.0);
    assert_eq!(result.consistency_report.recommendations_changed, 0);
    assert_eq!(result.consistency_report.stability_score, 1.0);
}

#[test]
fn test_second_analysis_against_previous_run() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    let result = service.reconcile(
        &current_storage(),
        &current_compute(),
        &current_volume(),
        Some(&snapshot),
    );

    // 150.50 vs 140.00 is a 7.5% move, under the 30% storage threshold
    let bucket_1 = &result.storage_recommendations[0];
    assert_eq!(bucket_1.potential_savings, 150.50);
    assert!(!bucket_1.justification.ends_with(SMOOTHED_NOTE));
    assert!(!bucket_1.justification.starts_with(NEW_MARKER));

    let bucket_2 = &result.storage_recommendations[1];
    assert!(bucket_2.justification.starts_with(NEW_MARKER));
    assert_eq!(bucket_2.potential_savings, 0.50);

    // 45.20 vs 40.00 is 13% (< 25%); 8.00 vs 10.00 is exactly 20% (<= 20%)
    assert_eq!(result.compute_recommendations[0].potential_savings, 45.20);
    assert_eq!(result.volume_recommendations[0].potential_savings, 8.00);

    assert_eq!(result.storage_recommendations.len(), 2);
    assert!((result.total_savings - 204.2).abs() < 1e-9);

    let report = result.consistency_report;
    // (151.0 - 140.0) / 140.0
    assert!((report.storage_savings_variation - 7.857142857).abs() < 1e-6);
    // (53.2 - 50.0) / 50.0, instance and volume pooled
    assert!((report.compute_savings_variation - 6.4).abs() < 1e-6);
    // Only the new bucket counts as changed
    assert_eq!(report.recommendations_changed, 1);

    let expected = ((1.0 - (7.857142857 + 6.4) / 200.0) + 0.9) / 2.0;
    assert!((report.stability_score - expected).abs() < 1e-6);
}

#[test]
fn test_compute_and_volume_damping_thresholds() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    let mut compute = current_compute();
    compute[0].potential_savings = 60.0; // 50% over 40.00
    let mut volume = current_volume();
    volume[0].potential_savings = 13.0; // 30% over 10.00

    let result = service.reconcile(&[], &compute, &volume, Some(&snapshot));

    let instance = &result.compute_recommendations[0];
    assert!((instance.potential_savings - (60.0 * 0.7 + 40.0 * 0.3)).abs() < 1e-9);
    assert!(instance.justification.ends_with(SMOOTHED_NOTE));

    let vol = &result.volume_recommendations[0];
    assert!((vol.potential_savings - (13.0 * 0.7 + 10.0 * 0.3)).abs() < 1e-9);
    assert!(vol.justification.ends_with(SMOOTHED_NOTE));

    // The previous bucket was confident, so it is carried forward
    assert_eq!(result.storage_recommendations.len(), 1);
    let carried = &result.storage_recommendations[0];
    assert!(carried.justification.starts_with(PERSISTENT_MARKER));
    assert!((carried.potential_savings - 126.0).abs() < 1e-9);
}

#[test]
fn test_compute_and_volume_never_persist() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    let result = service.reconcile(&current_storage(), &[], &[], Some(&snapshot));

    assert!(result.compute_recommendations.is_empty());
    assert!(result.volume_recommendations.is_empty());
}

#[test]
fn test_change_count_ignores_volumes() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    let mut volume = current_volume();
    volume[0].potential_savings = 100.0;
    let unmatched = VolumeRecommendation {
        resource_id: "vol-new".to_string(),
        ..volume[0].clone()
    };
    volume.push(unmatched);

    let result = service.reconcile(&[], &[], &volume, Some(&snapshot));

    assert_eq!(result.consistency_report.recommendations_changed, 0);
    assert!(result.volume_recommendations[1]
        .justification
        .starts_with(NEW_MARKER));
}

#[test]
fn test_change_count_uses_pre_smoothing_values() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    // 25% over 140.00: counts as changed (> 20%) but is not smoothed (<= 30%)
    let mut storage = current_storage();
    storage.truncate(1);
    storage[0].potential_savings = 175.0;

    let result = service.reconcile(&storage, &[], &[], Some(&snapshot));

    assert_eq!(result.storage_recommendations[0].potential_savings, 175.0);
    assert_eq!(result.consistency_report.recommendations_changed, 1);
}

#[test]
fn test_missing_sub_result_treated_as_empty() {
    let service = ConsistencyService::new();
    let snapshot = ReportSnapshot {
        compute_result: None,
        ..previous_snapshot()
    };

    let result = service.reconcile(&[], &current_compute(), &current_volume(), Some(&snapshot));

    assert!(result.compute_recommendations[0].justification.starts_with(NEW_MARKER));
    assert!(result.volume_recommendations[0].justification.starts_with(NEW_MARKER));
    assert_eq!(result.compute_recommendations[0].potential_savings, 45.20);
    assert_eq!(result.consistency_report.compute_savings_variation, 0.0);
    assert_eq!(result.consistency_report.recommendations_changed, 1);
}

#[test]
fn test_zero_previous_storage_total() {
    let service = ConsistencyService::new();
    let snapshot = ReportSnapshot {
        storage_result: Some(StorageResult {
            total_storage_gb: None,
            total_object_count: None,
            potential_savings: None,
            recommendations: vec![],
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }),
        compute_result: None,
        ..Default::default()
    };

    let result = service.reconcile(&current_storage(), &[], &[], Some(&snapshot));

    let report = result.consistency_report;
    assert_eq!(report.storage_savings_variation, 0.0);
    assert!(report.stability_score.is_finite());
    assert!((0.0..=1.0).contains(&report.stability_score));
}

#[test]
fn test_stability_score_bounded_under_heavy_churn() {
    let service = ConsistencyService::new();
    let snapshot = previous_snapshot();

    let storage: Vec<StorageRecommendation> = (0..25)
        .map(|i| StorageRecommendation {
            resource_name: format!("bucket-{}", i),
            potential_savings: 1000.0,
            ..current_storage()[0].clone()
        })
        .collect();

    let result = service.reconcile(&storage, &[], &[], Some(&snapshot));

    assert_eq!(result.consistency_report.recommendations_changed, 25);
    assert_eq!(result.consistency_report.stability_score, 0.0);
}

#[test]
fn test_reconciled_set_feeds_next_run() {
    let service = ConsistencyService::new();
    let run = CurrentRun {
        storage_recommendations: current_storage(),
        compute_recommendations: current_compute(),
        volume_recommendations: current_volume(),
    };

    let first = service.reconcile_run(&run, None);
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let snapshot = first.to_snapshot(Some("run-2".to_string()), now);

    assert_eq!(snapshot.storage_total(), first.storage_total());
    assert_eq!(snapshot.compute_total(), first.compute_total());
    assert_eq!(snapshot.created_at(), Some(now));

    // An identical rerun matches everything and is perfectly stable
    let second = service.reconcile_run(&run, Some(&snapshot));
    assert_eq!(second.consistency_report.recommendations_changed, 0);
    assert_eq!(second.consistency_report.stability_score, 1.0);
    assert_eq!(second.count_by_origin(RecommendationOrigin::Carried), 4);
}
