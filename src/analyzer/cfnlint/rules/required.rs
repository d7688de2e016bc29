//! Required-property rules.
//!
//! Most catalog checks share one shape: "resources of this type must set this
//! (possibly nested) property to an acceptable value". They are declared as
//! rows of [`REQUIRED_PROPERTIES`] rather than as individual functions.

use serde_json::Value;

use crate::analyzer::cfnlint::parser::{Resource, is_intrinsic};
use crate::analyzer::cfnlint::rules::{LintContext, Rule, TypeFilter, is_set, is_true};
use crate::analyzer::cfnlint::types::{RuleCode, RuleMeta, Violation};

/// Predicate a property value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Must be literally `true`.
    True,
    /// Must be present and non-empty.
    NonEmpty,
    /// Must equal the given string.
    Equals(&'static str),
    /// Must be one of the given strings.
    OneOf(&'static [&'static str]),
    /// May be absent, but must not be one of the given strings.
    NoneOf(&'static [&'static str]),
    /// Must be absent or empty.
    Empty,
}

impl Requirement {
    /// Whether a (known) value violates the requirement.
    pub fn violated_by(&self, value: Option<&Value>) -> bool {
        let text = value.and_then(Value::as_str);
        match self {
            Self::True => !is_true(value),
            Self::NonEmpty => !is_set(value),
            Self::Equals(expected) => text != Some(*expected),
            Self::OneOf(allowed) => !text.is_some_and(|t| allowed.iter().any(|a| *a == t)),
            Self::NoneOf(denied) => text.is_some_and(|t| denied.iter().any(|d| *d == t)),
            Self::Empty => is_set(value),
        }
    }
}

/// Which node a finding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The checked property itself.
    Leaf,
    /// The top-level property that contains it.
    Root,
}

/// One row of the required-property table.
#[derive(Debug, Clone)]
pub struct RequiredProperty {
    pub code: RuleCode,
    pub name: &'static str,
    pub scope: TypeFilter,
    /// Keys below `Properties`.
    pub path: &'static [&'static str],
    pub requirement: Requirement,
    pub anchor: Anchor,
    pub keyword: &'static str,
    /// Message template; `{resource}` and `{value}` are substituted.
    pub message: &'static str,
    pub meta: RuleMeta,
    pub quick: bool,
}

enum Lookup<'a> {
    Known(Option<&'a Value>),
    /// An intrinsic function sits on the path.
    Unknown,
}

impl RequiredProperty {
    fn lookup<'a>(&self, resource: &'a Resource) -> Lookup<'a> {
        let mut node = &resource.properties;
        for key in self.path {
            if is_intrinsic(node) {
                return Lookup::Unknown;
            }
            match node.get(*key) {
                Some(next) => node = next,
                None => return Lookup::Known(None),
            }
        }
        if is_intrinsic(node) {
            Lookup::Unknown
        } else {
            Lookup::Known(Some(node))
        }
    }

    fn render(&self, resource: &Resource, value: Option<&Value>) -> String {
        let shown = match value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "absent".to_string(),
        };
        self.message
            .replace("{resource}", &resource.name)
            .replace("{value}", &shown)
    }
}

impl Rule for RequiredProperty {
    fn code(&self) -> &RuleCode {
        &self.code
    }

    fn name(&self) -> &str {
        self.name
    }

    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn keyword(&self) -> &str {
        self.keyword
    }

    fn scope(&self) -> &TypeFilter {
        &self.scope
    }

    fn in_quick_tier(&self) -> bool {
        self.quick
    }

    fn check(&self, _context: &LintContext, resource: &Resource) -> Vec<Violation> {
        let value = match self.lookup(resource) {
            Lookup::Unknown => return Vec::new(),
            Lookup::Known(value) => value,
        };
        if !self.requirement.violated_by(value) {
            return Vec::new();
        }

        let keys = match self.anchor {
            Anchor::Leaf => self.path,
            Anchor::Root => &self.path[..self.path.len().min(1)],
        };
        vec![Violation::new(
            resource.properties_path().keys(keys),
            self.render(resource, value),
        )]
    }
}

const RDS: TypeFilter = TypeFilter::new("RDS", &["AWS::RDS::DBInstance", "AWS::RDS::DBCluster"]);
const RDS_INSTANCE: TypeFilter = TypeFilter::new("RDS", &["AWS::RDS::DBInstance"]);
const S3_BUCKET: TypeFilter = TypeFilter::new("S3", &["AWS::S3::Bucket"]);
const CLOUDFRONT: TypeFilter = TypeFilter::new("CloudFront", &["AWS::CloudFront::Distribution"]);

/// The declarative part of the catalog.
pub static REQUIRED_PROPERTIES: &[RequiredProperty] = &[
    RequiredProperty {
        code: RuleCode::from_static("E05"),
        name: "rds-storage-encrypted",
        scope: RDS,
        path: &["StorageEncrypted"],
        requirement: Requirement::True,
        anchor: Anchor::Leaf,
        keyword: "encrypted",
        message: "{resource}: StorageEncrypted is not set to true",
        meta: RuleMeta::new(
            "RDS instances and clusters must encrypt storage at rest",
            "Set StorageEncrypted: true (optionally with a KmsKeyId)",
        ),
        quick: true,
    },
    RequiredProperty {
        code: RuleCode::from_static("E06"),
        name: "s3-versioning-enabled",
        scope: S3_BUCKET,
        path: &["VersioningConfiguration", "Status"],
        requirement: Requirement::Equals("Enabled"),
        anchor: Anchor::Root,
        keyword: "versioning",
        message: "{resource}: S3 bucket versioning is not enabled",
        meta: RuleMeta::new(
            "S3 buckets should have versioning enabled",
            "Set VersioningConfiguration.Status to Enabled",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E07"),
        name: "s3-access-logging",
        scope: S3_BUCKET,
        path: &["LoggingConfiguration", "DestinationBucketName"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Root,
        keyword: "logging",
        message: "{resource}: S3 bucket access logging is not configured",
        meta: RuleMeta::new(
            "S3 buckets should have access logging enabled",
            "Set LoggingConfiguration.DestinationBucketName to a log bucket",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W09"),
        name: "lambda-vpc-config",
        scope: TypeFilter::new("Lambda", &["AWS::Lambda::Function"]),
        path: &["VpcConfig"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Leaf,
        keyword: "vpc",
        message: "{resource}: Lambda function is not configured for a VPC",
        meta: RuleMeta::new(
            "Lambda functions handling sensitive workloads should run in a VPC",
            "Add VpcConfig with SubnetIds and SecurityGroupIds",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W10"),
        name: "rds-multi-az",
        scope: RDS_INSTANCE,
        path: &["MultiAZ"],
        requirement: Requirement::True,
        anchor: Anchor::Leaf,
        keyword: "multiaz",
        message: "{resource}: RDS DBInstance should be Multi-AZ for high availability",
        meta: RuleMeta::new(
            "RDS instances should use Multi-AZ deployments",
            "Set MultiAZ: true",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E11"),
        name: "cloudfront-https-only",
        scope: CLOUDFRONT,
        path: &["DistributionConfig", "DefaultCacheBehavior", "ViewerProtocolPolicy"],
        requirement: Requirement::OneOf(&["redirect-to-https", "https-only"]),
        anchor: Anchor::Leaf,
        keyword: "policy",
        message: "{resource}: CloudFront viewer protocol policy is {value}, not HTTPS-only",
        meta: RuleMeta::new(
            "CloudFront distributions should only serve viewers over HTTPS",
            "Set DefaultCacheBehavior.ViewerProtocolPolicy to redirect-to-https or https-only",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W12"),
        name: "log-group-retention",
        scope: TypeFilter::new("Logs", &["AWS::Logs::LogGroup"]),
        path: &["RetentionInDays"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Leaf,
        keyword: "retention",
        message: "{resource}: CloudWatch Log Group should have a retention period set",
        meta: RuleMeta::new(
            "CloudWatch log groups should not retain logs forever",
            "Set RetentionInDays",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E18"),
        name: "ebs-encryption",
        scope: TypeFilter::new("EC2", &["AWS::EC2::Volume"]),
        path: &["Encrypted"],
        requirement: Requirement::True,
        anchor: Anchor::Leaf,
        keyword: "encrypted",
        message: "{resource}: EBS volume is not encrypted",
        meta: RuleMeta::new("EBS volumes must be encrypted", "Set Encrypted: true"),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W19"),
        name: "ecr-image-scanning",
        scope: TypeFilter::new("ECR", &["AWS::ECR::Repository"]),
        path: &["ImageScanningConfiguration", "ScanOnPush"],
        requirement: Requirement::True,
        anchor: Anchor::Root,
        keyword: "scanning",
        message: "{resource}: ECR repository does not scan images on push",
        meta: RuleMeta::new(
            "ECR repositories should scan images on push",
            "Set ImageScanningConfiguration.ScanOnPush: true",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W20"),
        name: "rds-deletion-protection",
        scope: RDS_INSTANCE,
        path: &["DeletionProtection"],
        requirement: Requirement::True,
        anchor: Anchor::Leaf,
        keyword: "deletion",
        message: "{resource}: RDS DBInstance deletion protection is not enabled",
        meta: RuleMeta::new(
            "RDS instances should be protected from accidental deletion",
            "Set DeletionProtection: true",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W21"),
        name: "iam-user-inline-policies",
        scope: TypeFilter::new("IAM", &["AWS::IAM::User"]),
        path: &["Policies"],
        requirement: Requirement::Empty,
        anchor: Anchor::Leaf,
        keyword: "policy",
        message: "{resource}: IAM user should not have inline policies",
        meta: RuleMeta::new(
            "IAM users should use managed policies, not inline policies",
            "Move the statements into a managed policy attached to a group",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W23"),
        name: "cloudfront-waf",
        scope: CLOUDFRONT,
        path: &["DistributionConfig", "WebACLId"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Leaf,
        keyword: "webacl",
        message: "{resource}: CloudFront distribution should have a WAF WebACL configured",
        meta: RuleMeta::new(
            "CloudFront distributions should be fronted by a WAF WebACL",
            "Set DistributionConfig.WebACLId",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E24"),
        name: "cloudtrail-kms",
        scope: TypeFilter::new("CloudTrail", &["AWS::CloudTrail::Trail"]),
        path: &["KMSKeyId"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Leaf,
        keyword: "kms",
        message: "{resource}: CloudTrail logs should be encrypted with a KMS key",
        meta: RuleMeta::new(
            "CloudTrail trails should encrypt logs with KMS",
            "Set KMSKeyId",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W25"),
        name: "secret-rotation",
        scope: TypeFilter::new("SecretsManager", &["AWS::SecretsManager::Secret"]),
        path: &["RotationLambdaARN"],
        requirement: Requirement::NonEmpty,
        anchor: Anchor::Leaf,
        keyword: "rotation",
        message: "{resource}: Secrets Manager secret should have rotation enabled",
        meta: RuleMeta::new(
            "Secrets Manager secrets should rotate automatically",
            "Set RotationLambdaARN to a rotation function",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E26"),
        name: "s3-public-acl",
        scope: S3_BUCKET,
        path: &["AccessControl"],
        requirement: Requirement::NoneOf(&["PublicRead", "PublicReadWrite"]),
        anchor: Anchor::Leaf,
        keyword: "public",
        message: "{resource}: S3 bucket ACL '{value}' is too permissive",
        meta: RuleMeta::new(
            "S3 buckets should not use public canned ACLs",
            "Remove AccessControl or use Private",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("E29"),
        name: "dynamodb-encryption",
        scope: TypeFilter::new("DynamoDB", &["AWS::DynamoDB::Table"]),
        path: &["SSESpecification", "SSEEnabled"],
        requirement: Requirement::True,
        anchor: Anchor::Root,
        keyword: "encryption",
        message: "{resource}: DynamoDB table should have server-side encryption enabled",
        meta: RuleMeta::new(
            "DynamoDB tables should enable server-side encryption",
            "Set SSESpecification.SSEEnabled: true",
        ),
        quick: false,
    },
    RequiredProperty {
        code: RuleCode::from_static("W30"),
        name: "iam-policy-users",
        scope: TypeFilter::new("IAM", &["AWS::IAM::Policy"]),
        path: &["Users"],
        requirement: Requirement::Empty,
        anchor: Anchor::Leaf,
        keyword: "policy",
        message: "{resource}: IAM policies should be attached to groups, not users",
        meta: RuleMeta::new(
            "IAM policies should be attached to groups or roles",
            "Replace Users with Groups or Roles",
        ),
        quick: false,
    },
];
