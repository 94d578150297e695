//! Configuration loading for the CLI

use anyhow::{Context, Result};
use consistency_lib::ConsistencyConfig;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CONSISTENCY_STORAGE_MAX_VARIATION=0.4`
pub const ENV_PREFIX: &str = "CONSISTENCY";

/// Load reconciler configuration
///
/// Sources, lowest precedence first: the config file (the explicit path,
/// which must exist, or the default path, which may be absent), then
/// environment variables.
pub fn load(path: Option<&Path>) -> Result<ConsistencyConfig> {
    load_with_env(path, None)
}

/// Load configuration with `env` standing in for the process environment when set
fn load_with_env(
    path: Option<&Path>,
    env: Option<config::Map<String, String>>,
) -> Result<ConsistencyConfig> {
    let mut builder = config::Config::builder();

    builder = match path {
        Some(path) => builder.add_source(config::File::from(path).required(true)),
        None => match default_config_path() {
            Some(default) => builder.add_source(config::File::from(default).required(false)),
            None => builder,
        },
    };

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
        .build()
        .context("Failed to load configuration")?;

    let config: ConsistencyConfig = settings
        .try_deserialize()
        .context("Failed to parse configuration")?;
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

/// Get the default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("consistency").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "storage_max_variation = 0.5\nchange_normalizer = 20.0\n");

        let config = load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(config.storage_max_variation, 0.5);
        assert_eq!(config.change_normalizer, 20.0);
        assert_eq!(config.volume_max_variation, 0.20);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "storage_max_variation = 0.5\n");

        let config = load_with_env(
            Some(&path),
            env(&[
                ("CONSISTENCY_STORAGE_MAX_VARIATION", "0.4"),
                ("OTHER_CHANGE_NORMALIZER", "99.0"),
            ]),
        )
        .unwrap();
        assert_eq!(config.storage_max_variation, 0.4);
        assert_eq!(config.change_normalizer, ConsistencyConfig::default().change_normalizer);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_with_env(Some(&dir.path().join("absent.toml")), env(&[])).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "smoothing_factor = 2.0\n");

        let err = load_with_env(Some(&path), env(&[])).unwrap_err();
        assert!(format!("{:#}", err).contains("smoothing_factor"));
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, "");

        let err = load_with_env(Some(&path), env(&[("CONSISTENCY_SMOOTHING_FACTOR", "2.0")])).unwrap_err();
        assert!(format!("{:#}", err).contains("smoothing_factor"));
    }
}
