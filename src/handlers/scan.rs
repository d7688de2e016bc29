use std::path::{Path, PathBuf};

use log::info;

use crate::analyzer::cfnlint::{
    OutputFormat, ScanResult, ScanTier, Scanner, Severity, format_error, format_result,
};
use crate::common::staging::StagedDocument;
use crate::config::Config;

/// Command-line overrides for one scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Template path; `-` reads standard input.
    pub file: PathBuf,
    pub quick: bool,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub threshold: Option<Severity>,
    pub fail_on_findings: bool,
}

/// How a scan ended, for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Report produced; nothing that fails the run.
    Passed,
    /// Report produced and `--fail-on-findings` tripped.
    FindingsReported,
    /// The template could not be parsed; an error was reported instead.
    InputRejected,
}

impl ScanOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::InputRejected => 1,
            Self::FindingsReported => 2,
        }
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub fn handle_scan(options: ScanOptions, config: &Config) -> crate::Result<ScanOutcome> {
    let tier = if options.quick {
        ScanTier::Quick
    } else {
        config.scan.tier
    };
    let format = options.format.unwrap_or(config.scan.format);

    let mut engine = config.to_cfnlint_config();
    if let Some(threshold) = options.threshold {
        engine = engine.with_threshold(threshold);
    }
    let threshold = engine.threshold;
    let scanner = Scanner::new(engine)?;

    let (label, scanned) = if is_stdin(&options.file) {
        let staged = StagedDocument::from_reader("stdin.template", std::io::stdin().lock())?;
        let bytes = staged.read()?;
        let scanned = scanner.scan_with_path(tier, &bytes, "<stdin>");
        staged.release();
        ("<stdin>".to_string(), scanned)
    } else {
        let label = options.file.display().to_string();
        let bytes = std::fs::read(&options.file)?;
        let scanned = scanner.scan_with_path(tier, &bytes, &label);
        (label, scanned)
    };

    let result: ScanResult = match scanned {
        Ok(result) => result,
        Err(err) => {
            let rendered = format_error(&label, &err.to_string(), format);
            match (&options.output, format) {
                (Some(path), _) => std::fs::write(path, &rendered)?,
                (None, OutputFormat::Json) => println!("{}", rendered),
                (None, OutputFormat::Stylish) => eprint!("{}", rendered),
            }
            return Ok(ScanOutcome::InputRejected);
        }
    };

    let rendered = format_result(&result, format);
    if let Some(output_path) = &options.output {
        std::fs::write(output_path, &rendered)?;
        info!("Report saved to: {}", output_path.display());
        if format == OutputFormat::Stylish {
            println!("Report saved to: {}", output_path.display());
        }
    } else if format == OutputFormat::Json {
        println!("{}", rendered);
    } else {
        print!("{}", rendered);
    }

    if options.fail_on_findings && result.should_fail(threshold) {
        return Ok(ScanOutcome::FindingsReported);
    }
    Ok(ScanOutcome::Passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn options(file: PathBuf) -> ScanOptions {
        ScanOptions {
            file,
            quick: false,
            format: Some(OutputFormat::Json),
            output: None,
            threshold: None,
            fail_on_findings: true,
        }
    }

    #[test]
    fn test_scan_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("vol.yaml");
        std::fs::File::create(&template)
            .unwrap()
            .write_all(b"Resources:\n  Vol:\n    Type: AWS::EC2::Volume\n    Properties: {}\n")
            .unwrap();
        let report = dir.path().join("report.json");

        let outcome = handle_scan(
            ScanOptions {
                output: Some(report.clone()),
                ..options(template)
            },
            &Config::default(),
        )
        .unwrap();

        assert_eq!(outcome, ScanOutcome::FindingsReported);
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(parsed["findings"]["Vol"]["Encrypted"][0]["rule"], "E18");
    }

    #[test]
    fn test_unparseable_template_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("bad.json");
        std::fs::write(&template, "{\"Resources\": ").unwrap();
        let report = dir.path().join("report.json");

        let outcome = handle_scan(
            ScanOptions {
                output: Some(report.clone()),
                ..options(template)
            },
            &Config::default(),
        )
        .unwrap();

        assert_eq!(outcome, ScanOutcome::InputRejected);
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
        assert!(parsed["error"].is_string());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(handle_scan(options(dir.path().join("absent.yaml")), &Config::default()).is_err());
    }
}
