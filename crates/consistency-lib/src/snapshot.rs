//! Run and snapshot files
//!
//! JSON files stand in for the persistence layer: the current run's
//! candidates are read from one file, the previous completed run from
//! another, and the reconciled set is written back as the next snapshot.

use crate::error::SnapshotError;
use crate::models::{
    ComputeRecommendation, CurrentRun, ReportSnapshot, StorageRecommendation,
    VolumeRecommendation,
};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load the current run's candidate recommendations
pub fn load_current_run(path: &Path) -> Result<CurrentRun, SnapshotError> {
    let run: CurrentRun = read_json(path)?;
    validate_run(&run)?;

    debug!(
        path = %path.display(),
        storage = run.storage_recommendations.len(),
        compute = run.compute_recommendations.len(),
        volume = run.volume_recommendations.len(),
        "Loaded current run"
    );
    Ok(run)
}

/// Load the last completed report
///
/// A missing file means no analysis has completed yet and yields `None`.
pub fn load_previous_snapshot(path: &Path) -> Result<Option<ReportSnapshot>, SnapshotError> {
    let snapshot: ReportSnapshot = match std::fs::read_to_string(path) {
        Ok(content) => parse_json(path, &content)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No previous completed analysis found");
            return Ok(None);
        }
        Err(source) => {
            return Err(SnapshotError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    validate_snapshot(&snapshot)?;

    if let Some(created_at) = snapshot.created_at() {
        info!(path = %path.display(), created_at = %created_at.to_rfc3339(), "Found last completed analysis");
    }
    Ok(Some(snapshot))
}

/// Write a snapshot as pretty JSON, creating parent directories
pub fn write_snapshot(path: &Path, snapshot: &ReportSnapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let content = serde_json::to_string_pretty(snapshot)?;

    // Write to a temp file and rename so readers never see a partial snapshot
    let temp_path = temp_path_for(path);
    std::fs::write(&temp_path, content).map_err(|source| SnapshotError::Write {
        path: temp_path.clone(),
        source,
    })?;
    if let Err(source) = std::fs::rename(&temp_path, path) {
        if let Err(e) = std::fs::remove_file(&temp_path) {
            warn!(path = %temp_path.display(), error = %e, "Failed to remove temp snapshot");
        }
        return Err(SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    debug!(path = %path.display(), "Wrote snapshot");
    Ok(())
}

/// `<file>.tmp` next to the target; never the target itself
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(path, &content)
}

fn parse_json<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T, SnapshotError> {
    serde_json::from_str(content).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_run(run: &CurrentRun) -> Result<(), SnapshotError> {
    validate_storage(&run.storage_recommendations)?;
    validate_compute(&run.compute_recommendations)?;
    validate_volume(&run.volume_recommendations)
}

fn validate_snapshot(snapshot: &ReportSnapshot) -> Result<(), SnapshotError> {
    validate_storage(snapshot.storage_recommendations())?;
    validate_compute(snapshot.compute_recommendations())?;
    validate_volume(snapshot.volume_recommendations())
}

fn validate_storage(recs: &[StorageRecommendation]) -> Result<(), SnapshotError> {
    for rec in recs {
        check_savings("storage", &rec.resource_name, rec.potential_savings)?;
        check_confidence("storage", &rec.resource_name, rec.confidence)?;
    }
    Ok(())
}

fn validate_compute(recs: &[ComputeRecommendation]) -> Result<(), SnapshotError> {
    for rec in recs {
        check_savings("compute", &rec.resource_id, rec.potential_savings)?;
        check_confidence("compute", &rec.resource_id, rec.confidence)?;
    }
    Ok(())
}

fn validate_volume(recs: &[VolumeRecommendation]) -> Result<(), SnapshotError> {
    for rec in recs {
        check_savings("volume", &rec.resource_id, rec.potential_savings)?;
    }
    Ok(())
}

fn check_savings(kind: &'static str, resource: &str, savings: f64) -> Result<(), SnapshotError> {
    if savings.is_finite() && savings >= 0.0 {
        return Ok(());
    }
    Err(SnapshotError::InvalidRecommendation {
        kind,
        resource: resource.to_string(),
        reason: format!("potential savings must be a non-negative amount, got {}", savings),
    })
}

fn check_confidence(kind: &'static str, resource: &str, confidence: f64) -> Result<(), SnapshotError> {
    if (0.0..=1.0).contains(&confidence) {
        return Ok(());
    }
    Err(SnapshotError::InvalidRecommendation {
        kind,
        resource: resource.to_string(),
        reason: format!("confidence must be within [0, 1], got {}", confidence),
    })
}
