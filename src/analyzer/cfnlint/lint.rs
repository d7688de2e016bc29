//! Main scan orchestration for cfnlint.
//!
//! Ties together parsing, rule evaluation, position resolution and
//! aggregation. The orchestrator is the only place that knows which tier is
//! active.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analyzer::cfnlint::aggregate::{Report, aggregate};
use crate::analyzer::cfnlint::config::CfnlintConfig;
use crate::analyzer::cfnlint::evaluate::{Catalog, evaluate};
use crate::analyzer::cfnlint::parser::{ParseError, PositionIndex, Template, parse_template};
use crate::analyzer::cfnlint::severity::{KeywordError, SeverityClassifier};
use crate::analyzer::cfnlint::types::{Diagnostic, Severity};

/// Which subset of the catalog runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanTier {
    /// Small fixed rule subset, structural locations only.
    Quick,
    /// Full catalog with source positions.
    #[default]
    Deep,
}

impl ScanTier {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quick" => Some(Self::Quick),
            "deep" | "full" => Some(Self::Deep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for ScanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of scanning one template.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// The file path that was scanned.
    pub file_path: String,
    pub tier: ScanTier,
    /// Grouped findings.
    pub report: Report,
    /// Schema problems, rule faults and unclassified findings.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of rules selected for this scan.
    pub rules_run: usize,
    /// Number of resources in the template.
    pub resources_scanned: usize,
}

impl ScanResult {
    /// Check if there are any findings.
    pub fn has_findings(&self) -> bool {
        !self.report.is_empty()
    }

    /// Get the maximum severity in the report.
    pub fn max_severity(&self) -> Option<Severity> {
        self.report.max_severity()
    }

    /// Check if the results should cause a non-zero exit.
    pub fn should_fail(&self, threshold: Severity) -> bool {
        self.max_severity().is_some_and(|max| max >= threshold)
    }
}

/// Scans templates with one immutable configuration.
///
/// The catalog and classifier are built once and shared by every scan the
/// scanner runs.
#[derive(Debug, Clone)]
pub struct Scanner {
    catalog: &'static Catalog,
    classifier: SeverityClassifier,
    config: CfnlintConfig,
}

impl Scanner {
    /// Validate the configuration and build a scanner over the built-in
    /// catalog.
    pub fn new(config: CfnlintConfig) -> Result<Self, KeywordError> {
        Ok(Self {
            catalog: Catalog::builtin(),
            classifier: config.classifier()?,
            config,
        })
    }

    pub fn config(&self) -> &CfnlintConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SeverityClassifier {
        &self.classifier
    }

    /// Scan template bytes.
    pub fn scan(&self, tier: ScanTier, bytes: &[u8]) -> Result<ScanResult, ParseError> {
        self.scan_with_path(tier, bytes, "<inline>")
    }

    /// Scan template bytes with a path for reporting.
    ///
    /// The same bytes feed both the document model and the position index.
    pub fn scan_with_path(
        &self,
        tier: ScanTier,
        bytes: &[u8],
        path: &str,
    ) -> Result<ScanResult, ParseError> {
        let template = parse_template(bytes)?;
        let source = std::str::from_utf8(bytes).ok();
        Ok(self.scan_template(tier, &template, source, path))
    }

    /// Scan an already parsed template.
    ///
    /// Deep scans resolve locations against `source` when it is given;
    /// without it every location is structural.
    pub fn scan_template(
        &self,
        tier: ScanTier,
        template: &Template,
        source: Option<&str>,
        path: &str,
    ) -> ScanResult {
        let rules = self.catalog.select(tier, &self.config);
        info!(
            "Scanning {} ({} tier, {} rules, {} resources)",
            path,
            tier,
            rules.len(),
            template.len()
        );

        let evaluation = evaluate(template, &rules);

        let mut index_fault = None;
        let index = match (tier, source) {
            (ScanTier::Deep, Some(text)) => Some(PositionIndex::build(text).unwrap_or_else(|err| {
                warn!("Could not index source positions for {}: {}", path, err);
                index_fault = Some(Diagnostic::PositionIndex {
                    message: err.to_string(),
                });
                PositionIndex::default()
            })),
            _ => None,
        };
        if let Some(idx) = &index {
            debug!("Indexed {} source positions", idx.len());
        }

        let aggregation = aggregate(
            &evaluation.findings,
            &self.classifier,
            index.as_ref(),
            self.config.threshold,
        );

        let mut diagnostics = template.diagnostics().to_vec();
        diagnostics.extend(index_fault);
        diagnostics.extend(evaluation.faults);
        diagnostics.extend(aggregation.diagnostics);

        info!(
            "Finished {}: {} findings, {} diagnostics",
            path,
            aggregation.report.len(),
            diagnostics.len()
        );

        ScanResult {
            file_path: path.to_string(),
            tier,
            report: aggregation.report,
            diagnostics,
            rules_run: rules.len(),
            resources_scanned: template.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::parser::parse_template_str;
    use crate::analyzer::cfnlint::types::{Location, Position};

    const PUBLIC_BUCKET: &str = r#"
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Properties:
      PublicAccessBlockConfiguration:
        BlockPublicAcls: false
        IgnorePublicAcls: true
        BlockPublicPolicy: true
        RestrictPublicBuckets: true
      BucketEncryption:
        ServerSideEncryptionConfiguration:
          - ServerSideEncryptionByDefault:
              SSEAlgorithm: AES256
      VersioningConfiguration:
        Status: Enabled
      LoggingConfiguration:
        DestinationBucketName: access-logs
"#;

    fn scanner() -> Scanner {
        Scanner::new(CfnlintConfig::default()).unwrap()
    }

    #[test]
    fn test_public_access_block_single_finding() {
        let result = scanner().scan(ScanTier::Deep, PUBLIC_BUCKET.as_bytes()).unwrap();
        assert_eq!(result.report.len(), 1);
        let bucket = result.report.findings_for("Bucket", "BlockPublicAcls");
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket[0].severity, Severity::High);
        assert_eq!(bucket[0].location, Location::Resolved(Position::new(7, 9)));
    }

    #[test]
    fn test_quick_tier_has_structural_locations() {
        let result = scanner().scan(ScanTier::Quick, PUBLIC_BUCKET.as_bytes()).unwrap();
        let bucket = result.report.findings_for("Bucket", "BlockPublicAcls");
        assert_eq!(bucket[0].location, Location::Structural);
        assert_eq!(result.rules_run, 5);
    }

    #[test]
    fn test_security_group_world_vs_private() {
        let open = r#"{"Resources": {"Sg": {"Type": "AWS::EC2::SecurityGroup", "Properties": {
            "GroupDescription": "ssh",
            "SecurityGroupIngress": [{"IpProtocol": "tcp", "CidrIp": "0.0.0.0/0", "FromPort": 22, "ToPort": 22}]
        }}}}"#;
        let result = scanner().scan(ScanTier::Deep, open.as_bytes()).unwrap();
        let sg = result.report.findings_for("Sg", "SecurityGroupIngress");
        assert_eq!(sg.len(), 1);
        assert_eq!(sg[0].rule.as_str(), "E04");

        let private = open.replace("0.0.0.0/0", "10.0.0.0/8");
        let result = scanner().scan(ScanTier::Deep, private.as_bytes()).unwrap();
        assert!(result.report.findings_for("Sg", "SecurityGroupIngress").is_empty());
    }

    #[test]
    fn test_rds_storage_encrypted_is_medium() {
        let yaml = "Resources:\n  Db:\n    Type: AWS::RDS::DBInstance\n    Properties:\n      Engine: postgres\n";
        let result = scanner().scan(ScanTier::Deep, yaml.as_bytes()).unwrap();
        let db = result.report.findings_for("Db", "StorageEncrypted");
        assert_eq!(db.len(), 1);
        assert_eq!(db[0].severity, Severity::Medium);
        assert_eq!(db[0].location, Location::NotFound);
    }

    #[test]
    fn test_zero_resources_empty_report() {
        let result = scanner().scan(ScanTier::Deep, b"Resources: {}\n").unwrap();
        assert!(result.report.is_empty());
        assert!(!result.has_findings());
        assert!(!result.should_fail(Severity::Low));
        assert_eq!(serde_json::to_string(&result.report).unwrap(), "{}");
    }

    #[test]
    fn test_parse_error_is_fatal() {
        assert!(scanner().scan(ScanTier::Deep, b"Resources: [unclosed").is_err());
        assert!(matches!(
            scanner().scan(ScanTier::Deep, b"   \n"),
            Err(ParseError::EmptyDocument)
        ));
    }

    #[test]
    fn test_schema_problem_is_diagnostic() {
        let yaml = "Resources:\n  Broken:\n    Properties: {}\n";
        let result = scanner().scan(ScanTier::Deep, yaml.as_bytes()).unwrap();
        assert!(result.report.is_empty());
        assert!(matches!(result.diagnostics[0], Diagnostic::Schema { .. }));
    }

    #[test]
    fn test_unindexable_source_is_reported() {
        let yaml = "Resources:\n  Db:\n    Type: AWS::RDS::DBInstance\n    Properties:\n      MultiAZ: false\n";
        let template = parse_template_str(yaml).unwrap();
        let result = scanner().scan_template(ScanTier::Deep, &template, Some("a: [1, 2\n"), "db.yaml");

        let multi_az = result.report.findings_for("Db", "MultiAZ");
        assert_eq!(multi_az[0].location, Location::NotFound);
        assert!(matches!(
            result.diagnostics.as_slice(),
            [Diagnostic::PositionIndex { .. }]
        ));

        let indexed = scanner().scan_template(ScanTier::Deep, &template, Some(yaml), "db.yaml");
        assert!(indexed.diagnostics.is_empty());
        assert!(indexed.report.findings_for("Db", "MultiAZ")[0].location.is_resolved());
    }

    #[test]
    fn test_ignored_rule_not_run() {
        let config = CfnlintConfig::default().ignore("E01");
        let result = Scanner::new(config)
            .unwrap()
            .scan(ScanTier::Deep, PUBLIC_BUCKET.as_bytes())
            .unwrap();
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_deep_scan_deterministic() {
        let yaml = include_str!("../../../tests/fixtures/mixed.yaml");
        let a = scanner().scan(ScanTier::Deep, yaml.as_bytes()).unwrap();
        let b = scanner().scan(ScanTier::Deep, yaml.as_bytes()).unwrap();
        assert_eq!(
            serde_json::to_string(&a.report).unwrap(),
            serde_json::to_string(&b.report).unwrap()
        );
        assert!(a.report.len() > 5);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(ScanTier::parse("QUICK"), Some(ScanTier::Quick));
        assert_eq!(ScanTier::parse("deep"), Some(ScanTier::Deep));
        assert_eq!(ScanTier::parse("slow"), None);
    }
}
