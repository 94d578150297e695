//! Inspect a stored snapshot

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use consistency_lib::snapshot;
use std::path::Path;
use tabled::Tabled;

use crate::output::{format_age, format_currency, print_warning, OutputFormat};

/// Row for snapshot sections table
#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Recommendations")]
    recommendations: String,
    #[tabled(rename = "Savings/mo")]
    savings: String,
}

/// Show a summary of a stored snapshot
pub fn show_snapshot(path: &Path, format: OutputFormat) -> Result<()> {
    let loaded = snapshot::load_previous_snapshot(path)
        .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;

    let Some(snapshot) = loaded else {
        match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Table => print_warning(&format!("No snapshot at {}", path.display())),
        }
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            let now = Utc::now();
            let mut rows = Vec::new();

            if let Some(storage) = &snapshot.storage_result {
                rows.push(SectionRow {
                    section: "storage".to_string(),
                    created: format_timestamp(storage.created_at),
                    age: format_age(now - storage.created_at),
                    recommendations: storage.recommendations.len().to_string(),
                    savings: format_currency(storage.savings_total()),
                });
            }

            if let Some(compute) = &snapshot.compute_result {
                rows.push(SectionRow {
                    section: "compute".to_string(),
                    created: format_timestamp(compute.created_at),
                    age: format_age(now - compute.created_at),
                    recommendations: format!(
                        "{} instance / {} volume",
                        compute.instance_recommendations.len(),
                        compute.volume_recommendations.len()
                    ),
                    savings: format_currency(compute.savings_total()),
                });
            }

            if let Some(run_id) = &snapshot.analysis_run_id {
                println!("Run:                    {}", run_id.cyan());
            }

            if rows.is_empty() {
                print_warning("Snapshot has no stored results");
                return Ok(());
            }

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
