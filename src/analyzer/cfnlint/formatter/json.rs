//! JSON output formatter for cfnlint.

use serde_json::json;

use crate::analyzer::cfnlint::lint::ScanResult;

/// Format a scan result as JSON.
///
/// `findings` is the report itself: `{resource: {property: [finding, ..]}}`,
/// an empty object when nothing was found.
pub fn format(result: &ScanResult) -> String {
    let output = json!({
        "file": result.file_path,
        "tier": result.tier,
        "findings": result.report,
        "diagnostics": result.diagnostics,
        "summary": {
            "rules": result.rules_run,
            "resources": result.resources_scanned,
            "findings": result.report.len(),
        }
    });

    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Single top-level error object, distinct from an empty report.
pub fn format_error(message: &str) -> String {
    serde_json::to_string_pretty(&json!({ "error": message }))
        .unwrap_or_else(|_| r#"{"error": "unknown"}"#.to_string())
}
