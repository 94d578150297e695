//! Recommendation consistency library
//!
//! This crate provides the core functionality for:
//! - Reconciling a new cost-optimization run against the previous report
//! - Smoothing savings estimates and scoring run-to-run stability
//! - Reading and writing run snapshots
//! - Metrics and structured logging of reconciliation outcomes

pub mod error;
pub mod models;
pub mod observability;
pub mod reconciler;
pub mod snapshot;

pub use error::{ConfigError, SnapshotError};
pub use models::*;
pub use observability::{ConsistencyMetrics, StructuredLogger};
pub use reconciler::{ConsistencyConfig, ConsistencyService};
