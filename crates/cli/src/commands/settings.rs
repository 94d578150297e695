//! Show the effective reconciler configuration

use anyhow::Result;
use colored::Colorize;
use consistency_lib::ConsistencyConfig;

use crate::output::OutputFormat;

/// Print the configuration after file and environment overrides
pub fn show_config(config: &ConsistencyConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            println!("{}", "Smoothing".bold());
            println!("{}", "-".repeat(50));
            println!("Storage max variation:  {:.2}", config.storage_max_variation);
            println!("Compute max variation:  {:.2}", config.compute_max_variation);
            println!("Volume max variation:   {:.2}", config.volume_max_variation);
            println!("Smoothing factor:       {:.2}", config.smoothing_factor);
            println!("Confidence bias:        {:.2}", config.confidence_bias);
            println!();
            println!("{}", "Persistence".bold());
            println!("{}", "-".repeat(50));
            println!(
                "Confidence threshold:   {:.2}",
                config.persistence_confidence_threshold
            );
            println!("Savings factor:         {:.2}", config.persistence_savings_factor);
            println!();
            println!("{}", "Stability".bold());
            println!("{}", "-".repeat(50));
            println!("Change threshold:       {:.2}", config.change_threshold);
            println!("Variation normalizer:   {:.1}", config.variation_normalizer);
            println!("Change normalizer:      {:.1}", config.change_normalizer);
        }
    }

    Ok(())
}
