//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::PlacerConfig;
use std::path::Path;

/// Loads and validates a `tessera.toml` configuration file.
pub fn load_config(path: &Path) -> Result<PlacerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `tessera.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<PlacerConfig, ConfigError> {
    let config: PlacerConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that every value is within its allowed range.
///
/// Called by the loaders, and again by the CLI after flags are applied.
pub fn validate_config(config: &PlacerConfig) -> Result<(), ConfigError> {
    let anneal = &config.anneal;
    if !(anneal.cooling_rate > 0.0 && anneal.cooling_rate < 1.0) {
        return Err(ConfigError::invalid(
            "anneal.cooling_rate",
            format!("{} is not in (0, 1)", anneal.cooling_rate),
        ));
    }
    for (field, value) in [
        ("anneal.coarse_steps", anneal.coarse_steps),
        ("anneal.steps_per_block", anneal.steps_per_block),
        ("anneal.min_steps", anneal.min_steps),
        ("anneal.moves_per_temperature", anneal.moves_per_temperature),
        ("anneal.fallback_multiplier", anneal.fallback_multiplier),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid(field, "must be at least 1"));
        }
    }

    if config.dispatch.workers == Some(0) {
        return Err(ConfigError::invalid("dispatch.workers", "must be at least 1"));
    }

    let remote = &config.remote;
    if remote.timeout_secs == 0 {
        return Err(ConfigError::invalid("remote.timeout_secs", "must be at least 1"));
    }
    if let Some(url) = &remote.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "remote.url",
                format!("'{url}' is not an http(s) URL"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClusterCount;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, PlacerConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[placer]
seed = 42
fold_registers = false
clusters = 6

[anneal]
coarse_steps = 1000
steps_per_block = 50
min_steps = 500
cooling_rate = 0.9
moves_per_temperature = 20
fallback_multiplier = 3

[dispatch]
workers = 4

[remote]
url = "http://10.0.0.5:8080"
timeout_secs = 60
retries = 0
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.placer.seed, 42);
        assert!(!config.placer.fold_registers);
        assert_eq!(config.placer.clusters, ClusterCount::Fixed(6));
        assert_eq!(config.anneal.cooling_rate, 0.9);
        assert_eq!(config.anneal.fallback_multiplier, 3);
        assert_eq!(config.dispatch.workers, Some(4));
        assert_eq!(config.remote.url.as_deref(), Some("http://10.0.0.5:8080"));
        assert_eq!(config.remote.retries, 0);
    }

    #[test]
    fn clusters_auto_string() {
        let config = load_config_from_str("[placer]\nclusters = \"auto\"\n").unwrap();
        assert_eq!(config.placer.clusters, ClusterCount::Auto);
    }

    #[test]
    fn clusters_bad_string_errors() {
        let err = load_config_from_str("[placer]\nclusters = \"many\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_clusters_skip_clustering() {
        let config = load_config_from_str("[placer]\nclusters = 0\n").unwrap();
        assert_eq!(config.placer.clusters, ClusterCount::Fixed(0));
        assert_eq!(config.placer.clusters.resolve(50, 0), 0);
    }

    #[test]
    fn clusters_kernels_string() {
        let config = load_config_from_str("[placer]\nclusters = \"kernels\"\n").unwrap();
        assert_eq!(config.placer.clusters, ClusterCount::Kernels);
    }

    #[test]
    fn clusters_numeric_string_errors() {
        let err = load_config_from_str("[placer]\nclusters = \"3\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn cooling_rate_out_of_range() {
        for rate in ["0.0", "1.0", "1.5", "-0.2"] {
            let toml = format!("[anneal]\ncooling_rate = {rate}\n");
            let err = load_config_from_str(&toml).unwrap_err();
            match err {
                ConfigError::ValidationError { field, .. } => {
                    assert_eq!(field, "anneal.cooling_rate")
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn zero_step_counts_rejected() {
        let err = load_config_from_str("[anneal]\nmin_steps = 0\n").unwrap_err();
        assert!(err.to_string().contains("anneal.min_steps"));
        let err = load_config_from_str("[anneal]\nfallback_multiplier = 0\n").unwrap_err();
        assert!(err.to_string().contains("anneal.fallback_multiplier"));
    }

    #[test]
    fn bad_remote_url_rejected() {
        let err = load_config_from_str("[remote]\nurl = \"ftp://host\"\n").unwrap_err();
        assert!(err.to_string().contains("remote.url"));
    }

    #[test]
    fn unknown_field_errors() {
        let err = load_config_from_str("[placer]\nseeed = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tessera.toml");
        std::fs::write(&path, "[placer]\nseed = 7\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.placer.seed, 7);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/tessera.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
