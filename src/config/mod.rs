//! Configuration file loading.
//!
//! Lookup order: an explicit `--config` path, then `.cfn-audit.toml` in the
//! working directory, then in the home directory, else built-in defaults.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::analyzer::cfnlint::{KeywordError, SeverityClassifier};

pub use types::Config;

const CONFIG_FILE_NAME: &str = ".cfn-audit.toml";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid severity keywords: {0}")]
    InvalidKeywords(#[from] KeywordError),
}

/// Get the global config file path (~/.cfn-audit.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (<dir>/.cfn-audit.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist; discovered files are used only when present.
/// Keyword sets are validated before the configuration is returned.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let candidates = std::env::current_dir()
        .ok()
        .map(|cwd| local_config_path(&cwd))
        .into_iter()
        .chain(global_config_path());

    for candidate in candidates {
        if candidate.is_file() {
            return load_from_path(&candidate);
        }
    }

    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
    Ok(Config::default())
}

/// Load and validate one configuration file.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    SeverityClassifier::new(&config.severity)?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::{OutputFormat, RuleCode, ScanTier, Severity};
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.scan.tier, ScanTier::Deep);
        assert_eq!(config.scan.threshold, Severity::Low);
        assert!(config.severity.high.contains(&"public".to_string()));
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
[rules]
ignore = ["w12", "E06"]

[scan]
tier = "quick"
threshold = "medium"
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(config.scan.tier, ScanTier::Quick);
        assert_eq!(config.scan.format, OutputFormat::Json);

        let engine = config.to_cfnlint_config();
        assert!(engine.is_rule_ignored(&RuleCode::new("W12")));
        assert!(engine.is_rule_ignored(&RuleCode::new("E06")));
        assert_eq!(engine.threshold, Severity::Medium);
        // Untouched section keeps the built-in keyword sets.
        assert!(!engine.keywords.medium.is_empty());
    }

    #[test]
    fn test_load_from_path_rejects_overlapping_keywords() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[severity]\nhigh = [\"tag\"]\nmedium = []\nlow = [\"tag\"]").unwrap();
        assert!(matches!(
            load_from_path(file.path()),
            Err(ConfigError::InvalidKeywords(_))
        ));
    }

    #[test]
    fn test_load_from_path_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scan\ntier = ").unwrap();
        assert!(matches!(
            load_from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(Some(&dir.path().join("nope.toml"))),
            Err(ConfigError::Io { .. })
        ));
    }
}
