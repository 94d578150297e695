//! Reconcile a run against the previous snapshot

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use consistency_lib::{
    snapshot, ConsistencyConfig, ConsistencyMetrics, ConsistencyService, ReconciliationResult,
    StructuredLogger,
};
use std::path::PathBuf;
use std::time::Instant;
use tabled::Tabled;

use crate::output::{
    color_origin, color_stability, format_confidence, format_currency, format_percent,
    print_info, print_success, print_warning, OutputFormat,
};

/// Inputs of a reconcile invocation
pub struct ReconcileArgs {
    pub current: PathBuf,
    pub previous: Option<PathBuf>,
    pub account: String,
    pub run_id: Option<String>,
    pub write_snapshot: Option<PathBuf>,
    pub metrics: bool,
}

/// Row for reconciled recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Savings/mo")]
    savings: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Origin")]
    origin: String,
}

/// Load inputs, reconcile, report, and optionally store the next snapshot
pub fn reconcile(config: ConsistencyConfig, args: ReconcileArgs, format: OutputFormat) -> Result<()> {
    let run = snapshot::load_current_run(&args.current)
        .with_context(|| format!("Failed to load current run from {}", args.current.display()))?;

    let previous = match &args.previous {
        Some(path) => snapshot::load_previous_snapshot(path)
            .with_context(|| format!("Failed to load previous snapshot from {}", path.display()))?,
        None => None,
    };

    let logger = StructuredLogger::new(&args.account);
    logger.log_reconciliation_started(run.len(), previous.is_some());

    let service = ConsistencyService::with_config(config);
    let started = Instant::now();
    let result = service.reconcile_run(&run, previous.as_ref());
    let elapsed = started.elapsed().as_secs_f64();

    let metrics = ConsistencyMetrics::new();
    metrics.record(&result, elapsed);
    logger.log_reconciliation_completed(&result);

    if let Some(path) = &args.write_snapshot {
        let now = Utc::now();
        let run_id = args
            .run_id
            .clone()
            .unwrap_or_else(|| format!("run-{}", now.format("%Y%m%dT%H%M%SZ")));
        snapshot::write_snapshot(path, &result.to_snapshot(Some(run_id), now))
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
        logger.log_snapshot_written(&path.display().to_string());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Table => print_result(&result, previous.is_some()),
    }

    if let Some(path) = &args.write_snapshot {
        if matches!(format, OutputFormat::Table) {
            print_success(&format!("Snapshot written to {}", path.display()));
        }
    }

    // Metrics go to stderr so JSON output stays parseable
    if args.metrics {
        eprint!("{}", metrics.render());
    }

    Ok(())
}

fn print_result(result: &ReconciliationResult, has_previous: bool) {
    let recommendations = result.recommendations();

    if recommendations.is_empty() {
        print_warning("No recommendations");
    } else {
        let rows: Vec<RecommendationRow> = recommendations
            .iter()
            .map(|r| RecommendationRow {
                kind: r.kind().to_string(),
                resource: r.resource_id().to_string(),
                category: r.category().to_string(),
                savings: format_currency(r.potential_savings()),
                confidence: format_confidence(r.confidence()),
                origin: color_origin(r.origin()),
            })
            .collect();

        let table = tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string();
        println!("{}", table);
    }

    let report = &result.consistency_report;
    println!();
    println!("{}", "Consistency Report".bold());
    println!("{}", "-".repeat(50));
    println!(
        "Total savings:          {}",
        format_currency(result.total_savings).green()
    );
    println!(
        "Storage variation:      {}",
        format_percent(report.storage_savings_variation)
    );
    println!(
        "Compute variation:      {}",
        format_percent(report.compute_savings_variation)
    );
    println!("Changed:                {}", report.recommendations_changed);
    println!(
        "Stability score:        {}",
        color_stability(report.stability_score)
    );

    if !has_previous {
        println!();
        print_info("No previous analysis; recommendations returned as-is");
    }
}
