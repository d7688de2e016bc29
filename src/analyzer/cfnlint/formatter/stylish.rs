//! Stylish (colored terminal) output formatter for cfnlint.

use colored::*;

use crate::analyzer::cfnlint::lint::ScanResult;
use crate::analyzer::cfnlint::types::Severity;

fn paint(severity: Severity) -> ColoredString {
    let label = severity.as_str().to_lowercase();
    match severity {
        Severity::High => label.red().bold(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.blue(),
    }
}

/// Format a scan result in stylish format.
pub fn format(result: &ScanResult) -> String {
    let mut output = String::new();

    if !result.report.is_empty() {
        output.push_str(&format!("\n{}\n", result.file_path.underline()));
    }

    for (resource, property, findings) in result.report.buckets() {
        output.push_str(&format!("  {} {}\n", resource.bold(), property.dimmed()));
        for finding in findings {
            output.push_str(&format!(
                "    {:<9}  {:<6}  {}  {}\n",
                finding.location.to_string(),
                paint(finding.severity),
                finding.message,
                finding.rule.as_str().dimmed()
            ));
        }
    }

    if !result.diagnostics.is_empty() {
        output.push_str(&format!("\n  {}\n", "diagnostics".dimmed()));
        for diagnostic in &result.diagnostics {
            output.push_str(&format!("    {}\n", diagnostic));
        }
    }

    let total = result.report.len();
    if total > 0 {
        let parts: Vec<String> = Severity::ALL
            .iter()
            .map(|s| (s, result.report.count(*s)))
            .filter(|(_, n)| *n > 0)
            .map(|(s, n)| format!("{} {}", n, s.as_str().to_lowercase()))
            .collect();
        output.push_str(&format!(
            "\n  {} finding{} ({})\n",
            total,
            if total == 1 { "" } else { "s" },
            parts.join(", ")
        ));
    } else {
        output.push_str(&format!(
            "{} {}: no findings ({} rules, {} resources)\n",
            "✓".green(),
            result.file_path,
            result.rules_run,
            result.resources_scanned
        ));
    }

    output
}

/// Format a fatal error for the terminal.
pub fn format_error(path: &str, message: &str) -> String {
    format!("{} {}: {}\n", "error".red().bold(), path, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::config::CfnlintConfig;
    use crate::analyzer::cfnlint::lint::{ScanTier, Scanner};

    fn scan(yaml: &str) -> ScanResult {
        Scanner::new(CfnlintConfig::default())
            .unwrap()
            .scan_with_path(ScanTier::Deep, yaml.as_bytes(), "template.yaml")
            .unwrap()
    }

    #[test]
    fn test_stylish_format() {
        let yaml = "Resources:\n  Vol:\n    Type: AWS::EC2::Volume\n    Properties:\n      Encrypted: false\n";
        let output = format(&scan(yaml));
        assert!(output.contains("template.yaml"));
        assert!(output.contains("5:7"));
        assert!(output.contains("E18"));
        assert!(output.contains("1 finding"));
        assert!(output.contains("1 medium"));
    }

    #[test]
    fn test_stylish_format_empty() {
        let output = format(&scan("Resources: {}\n"));
        assert!(output.contains("no findings"));
    }

    #[test]
    fn test_stylish_error() {
        assert!(format_error("t.yaml", "bad").contains("t.yaml: bad"));
    }
}
