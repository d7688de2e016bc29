use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analyzer::cfnlint::{OutputFormat, Severity};

#[derive(Parser)]
#[command(name = "cfn-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan CloudFormation templates for security misconfigurations")]
#[command(
    long_about = "Scans CloudFormation templates (JSON or YAML) for security and operational misconfigurations and reports findings grouped by resource and property, ranked by severity."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "CFN_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a template and report findings
    Scan {
        /// Template file, or `-` to read standard input
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Run only the quick rule subset (no source positions)
        #[arg(long)]
        quick: bool,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Minimum severity to report
        #[arg(long, value_enum)]
        threshold: Option<SeverityThreshold>,

        /// Exit with a non-zero status when any finding is reported
        #[arg(long)]
        fail_on_findings: bool,
    },

    /// List the rule catalog
    Rules {
        /// Show only quick-tier rules
        #[arg(long)]
        quick: bool,

        /// Output rule definitions as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Stylish,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Stylish => OutputFormat::Stylish,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityThreshold {
    Low,
    Medium,
    High,
}

impl From<SeverityThreshold> for Severity {
    fn from(threshold: SeverityThreshold) -> Self {
        match threshold {
            SeverityThreshold::Low => Severity::Low,
            SeverityThreshold::Medium => Severity::Medium,
            SeverityThreshold::High => Severity::High,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_args() {
        let cli = Cli::parse_from([
            "cfn-audit",
            "scan",
            "template.yaml",
            "--quick",
            "--format",
            "json",
            "--threshold",
            "medium",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan {
                quick,
                format,
                threshold,
                ..
            } => {
                assert!(quick);
                assert_eq!(format, Some(FormatArg::Json));
                assert_eq!(threshold.map(Severity::from), Some(Severity::Medium));
            }
            Commands::Rules { .. } => panic!("expected scan"),
        }
    }
}
