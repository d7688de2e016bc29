//! Crate-level error types.

use thiserror::Error;

use crate::analyzer::cfnlint::{KeywordError, ParseError};
use crate::common::staging::StagingError;
use crate::config::ConfigError;

/// Errors that abort a command.
#[derive(Debug, Error)]
pub enum CfnAuditError {
    /// The template could not be parsed
    #[error("Failed to parse template: {0}")]
    Parse(#[from] ParseError),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Severity keyword sets are invalid
    #[error("Invalid severity keywords: {0}")]
    Keywords(#[from] KeywordError),

    /// Standard input could not be staged for the scan
    #[error("Failed to stage input: {0}")]
    Staging(#[from] StagingError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cfn-audit operations
pub type Result<T> = std::result::Result<T, CfnAuditError>;
