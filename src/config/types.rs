use serde::{Deserialize, Serialize};

use crate::analyzer::cfnlint::{CfnlintConfig, KeywordSets, OutputFormat, ScanTier, Severity};

/// Main configuration structure (`.cfn-audit.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Severity keyword sets
    pub severity: KeywordSets,
    pub rules: RulesConfig,
    pub scan: ScanConfig,
}

/// Rule selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule codes excluded from evaluation
    pub ignore: Vec<String>,
}

/// Scan defaults, overridable from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub tier: ScanTier,
    /// Minimum severity to report
    pub threshold: Severity,
    pub format: OutputFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tier: ScanTier::Deep,
            threshold: Severity::Low,
            format: OutputFormat::Stylish,
        }
    }
}

impl Config {
    /// Engine configuration for the scanner.
    pub fn to_cfnlint_config(&self) -> CfnlintConfig {
        self.rules.ignore.iter().fold(
            CfnlintConfig::new()
                .with_threshold(self.scan.threshold)
                .with_keywords(self.severity.clone()),
            |config, code| config.ignore(code.trim().to_uppercase()),
        )
    }
}
