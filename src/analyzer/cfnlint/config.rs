//! Configuration for the cfnlint scanner.
//!
//! This is the engine-level view the orchestrator receives; the TOML file
//! layer lives in `crate::config` and converts into it.

use std::collections::HashSet;

use crate::analyzer::cfnlint::severity::{KeywordError, KeywordSets, SeverityClassifier};
use crate::analyzer::cfnlint::types::{RuleCode, Severity};

/// Main configuration for cfnlint.
#[derive(Debug, Clone)]
pub struct CfnlintConfig {
    /// Rules excluded from evaluation.
    pub ignore_rules: HashSet<RuleCode>,
    /// Minimum severity threshold for reporting.
    pub threshold: Severity,
    /// Severity keyword sets.
    pub keywords: KeywordSets,
}

impl Default for CfnlintConfig {
    fn default() -> Self {
        Self {
            ignore_rules: HashSet::new(),
            threshold: Severity::Low,
            keywords: KeywordSets::default(),
        }
    }
}

impl CfnlintConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore a rule.
    pub fn ignore(mut self, code: impl Into<RuleCode>) -> Self {
        self.ignore_rules.insert(code.into());
        self
    }

    /// Set the severity threshold.
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace the keyword sets.
    pub fn with_keywords(mut self, keywords: KeywordSets) -> Self {
        self.keywords = keywords;
        self
    }

    /// Check if a rule is ignored.
    pub fn is_rule_ignored(&self, code: &RuleCode) -> bool {
        self.ignore_rules.contains(code)
    }

    /// Check if a severity should be reported based on threshold.
    pub fn should_report(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Validate the keyword sets and freeze them into a classifier.
    pub fn classifier(&self) -> Result<SeverityClassifier, KeywordError> {
        SeverityClassifier::new(&self.keywords)
    }
}
