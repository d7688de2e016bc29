//! # cfn-audit
//!
//! Scans CloudFormation templates for security and operational
//! misconfigurations.
//!
//! ## Features
//!
//! - **Two tiers**: a quick heuristic pass and a deep pass over the full rule catalog
//! - **Source positions**: deep findings carry the line and column of the offending node
//! - **Severity ranking**: keyword-driven High / Medium / Low classification, configurable per project
//! - **Deterministic reports**: findings grouped by resource and property, stably sorted
//!
//! ## Example
//!
//! ```rust,no_run
//! use cfn_audit::analyzer::cfnlint::{CfnlintConfig, ScanTier, Scanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("template.yaml")?;
//! let scanner = Scanner::new(CfnlintConfig::default())?;
//! let result = scanner.scan_with_path(ScanTier::Deep, &bytes, "template.yaml")?;
//! println!("{}", serde_json::to_string_pretty(&result.report)?);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod handlers;

// Re-export commonly used types and functions
pub use error::{CfnAuditError, Result};
pub use handlers::*;
use cli::Commands;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a parsed command and return the process exit code.
pub fn run_command(command: Commands, config: &config::Config) -> Result<i32> {
    match command {
        Commands::Scan {
            file,
            quick,
            format,
            output,
            threshold,
            fail_on_findings,
        } => {
            let options = ScanOptions {
                file,
                quick,
                format: format.map(Into::into),
                output,
                threshold: threshold.map(Into::into),
                fail_on_findings,
            };
            handle_scan(options, config).map(|outcome| outcome.exit_code())
        }
        Commands::Rules { quick, json } => handle_rules(quick, json).map(|_| 0),
    }
}
