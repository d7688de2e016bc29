//! Output formatters for cfnlint results.
//!
//! - JSON - Machine-readable report envelope
//! - Stylish - Colored terminal output (default)

pub mod json;
pub mod stylish;

use serde::{Deserialize, Serialize};

use crate::analyzer::cfnlint::lint::ScanResult;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for machine processing
    Json,
    /// Stylish colored terminal output (default)
    #[default]
    Stylish,
}

impl OutputFormat {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "stylish" | "text" => Some(Self::Stylish),
            _ => None,
        }
    }
}

/// Format a scan result according to the specified format.
pub fn format_result(result: &ScanResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format(result),
        OutputFormat::Stylish => stylish::format(result),
    }
}

/// Format a fatal scan error (the input could not be parsed).
pub fn format_error(path: &str, message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_error(message),
        OutputFormat::Stylish => stylish::format_error(path, message),
    }
}
