//! Cfnlint: CloudFormation template misconfiguration scanner
//!
//! # Features
//!
//! - JSON and YAML templates, including short-form intrinsics (`!Ref`, `!GetAtt`, ...)
//! - Source positions for every finding on the deep tier
//! - Keyword-driven severity classification (High / Medium / Low)
//! - Parallel rule evaluation with per-rule fault isolation
//! - JSON and stylish output
//!
//! # Example
//!
//! ```rust,ignore
//! use cfn_audit::analyzer::cfnlint::{CfnlintConfig, ScanTier, Scanner};
//!
//! let template = br#"
//! Resources:
//!   Db:
//!     Type: AWS::RDS::DBInstance
//!     Properties:
//!       Engine: postgres
//! "#;
//!
//! let scanner = Scanner::new(CfnlintConfig::default())?;
//! let result = scanner.scan(ScanTier::Deep, template)?;
//!
//! for (resource, property, findings) in result.report.buckets() {
//!     for f in findings {
//!         println!("{resource}.{property}: {} {} - {}", f.location, f.severity, f.message);
//!     }
//! }
//! ```
//!
//! # Rules
//!
//! | Code | Name                         | Quick | Description                                     |
//! |------|------------------------------|-------|-------------------------------------------------|
//! | E01  | s3-public-access-block       | Yes   | Public access block flags must not be false     |
//! | E02  | s3-bucket-encryption         | Yes   | Buckets need AES256 or KMS default encryption   |
//! | E03  | iam-wildcard-action          | Yes   | Policy statements must not allow `*` actions    |
//! | E04  | security-group-open-to-world | Yes   | No SSH/RDP/all ports from 0.0.0.0/0 or ::/0     |
//! | E05  | rds-storage-encrypted        | Yes   | RDS storage must be encrypted                   |
//! | E06  | s3-versioning-enabled        | No    | Bucket versioning must be enabled               |
//! | E07  | s3-access-logging            | No    | Bucket access logging must be configured        |
//! | E08  | ec2-no-public-ip             | No    | Instances must not request a public IP          |
//! | W09  | lambda-vpc-config            | No    | Functions should run inside a VPC               |
//! | W10  | rds-multi-az                 | No    | RDS instances should be Multi-AZ                |
//! | E11  | cloudfront-https-only        | No    | Viewers must be redirected to HTTPS             |
//! | W12  | log-group-retention          | No    | Log groups should set a retention period        |
//! | W13  | vpc-flow-logs                | No    | VPCs should have a flow log                     |
//! | W16  | lambda-env-secrets           | No    | No secrets in Lambda environment variables      |
//! | W17  | ec2-name-tag                 | No    | Instances should carry a Name tag               |
//! | E18  | ebs-encryption               | No    | EBS volumes must be encrypted                   |
//! | W19  | ecr-image-scanning           | No    | Repositories should scan images on push         |
//! | W20  | rds-deletion-protection      | No    | RDS instances should enable deletion protection |
//! | W21  | iam-user-inline-policies     | No    | Users should not carry inline policies          |
//! | E22  | sns-topic-policy-wildcard    | No    | Topic policies must not allow any principal     |
//! | W23  | cloudfront-waf               | No    | Distributions should be behind a WAF            |
//! | E24  | cloudtrail-kms               | No    | Trails must be KMS encrypted                    |
//! | W25  | secret-rotation              | No    | Secrets should rotate                           |
//! | E26  | s3-public-acl                | No    | No PublicRead/PublicReadWrite canned ACLs       |
//! | W28  | apigateway-caching           | No    | Stages should enable caching                    |
//! | E29  | dynamodb-encryption          | No    | Tables must enable server-side encryption       |
//! | W30  | iam-policy-users             | No    | Attach policies to groups or roles, not users   |

pub mod aggregate;
pub mod config;
pub mod evaluate;
pub mod formatter;
pub mod lint;
pub mod parser;
pub mod rules;
pub mod severity;
pub mod types;

// Re-export main types and functions
pub use aggregate::{Report, aggregate};
pub use config::CfnlintConfig;
pub use evaluate::{Catalog, evaluate};
pub use formatter::{OutputFormat, format_error, format_result};
pub use lint::{ScanResult, ScanTier, Scanner};
pub use parser::{ParseError, PositionIndex, Template, parse_template};
pub use severity::{KeywordError, KeywordSets, SeverityClassifier};
pub use types::{Diagnostic, Finding, Location, RuleCode, RuleMeta, Severity, StructuralPath};
