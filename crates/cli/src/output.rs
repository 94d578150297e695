//! Output formatting utilities

use chrono::Duration;
use clap::ValueEnum;
use colored::Colorize;
use consistency_lib::RecommendationOrigin;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a monthly savings amount in USD
pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format confidence as percentage
pub fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!("{:.0}%", c * 100.0),
        None => "-".to_string(),
    }
}

/// Format a percentage value that is already scaled to 0-100
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Color a recommendation origin
pub fn color_origin(origin: RecommendationOrigin) -> String {
    let label = origin.as_str();
    match origin {
        RecommendationOrigin::New => label.cyan().to_string(),
        RecommendationOrigin::Persistent => label.magenta().to_string(),
        RecommendationOrigin::Smoothed => label.yellow().to_string(),
        RecommendationOrigin::Carried => label.green().to_string(),
    }
}

/// Color stability score based on value
pub fn color_stability(score: f64) -> String {
    let formatted = format!("{:.2}", score);
    if score >= 0.8 {
        formatted.green().to_string()
    } else if score >= 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Format an elapsed duration as a coarse human-readable age
pub fn format_age(age: Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{}m ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(150.5), "$150.50");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(Some(0.85)), "85%");
        assert_eq!(format_confidence(None), "-");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::days(3)), "3d ago");
        assert_eq!(format_age(Duration::hours(5)), "5h ago");
        assert_eq!(format_age(Duration::seconds(10)), "just now");
    }
}
