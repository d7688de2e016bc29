//! S3 bucket checks.
//!
//! E01 `s3-public-access-block`: public access block flags must not be `false`.
//! E02 `s3-bucket-encryption`: buckets need AES256 or KMS default encryption.

use serde_json::Value;

use crate::analyzer::cfnlint::parser::Resource;
use crate::analyzer::cfnlint::rules::{LintContext, Rule, SimpleRule, TypeFilter, is_false, is_set};
use crate::analyzer::cfnlint::types::{RuleMeta, Violation};

const PUBLIC_ACCESS_FLAGS: [&str; 4] = [
    "BlockPublicAcls",
    "IgnorePublicAcls",
    "BlockPublicPolicy",
    "RestrictPublicBuckets",
];

pub fn public_access_block() -> impl Rule {
    SimpleRule::new(
        "E01",
        "s3-public-access-block",
        "public",
        TypeFilter::new(
            "S3",
            &["AWS::S3::Bucket", "AWS::S3::BucketPublicAccessBlock"],
        ),
        RuleMeta::new(
            "S3 public access block flags must not be disabled",
            "Set all four PublicAccessBlockConfiguration flags to true",
        ),
        check_public_access_block,
    )
    .quick()
}

fn check_public_access_block(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let Some(block) = resource
        .property("PublicAccessBlockConfiguration")
        .filter(|v| v.is_object())
    else {
        return Vec::new();
    };

    PUBLIC_ACCESS_FLAGS
        .iter()
        .filter(|flag| is_false(block.get(**flag)))
        .map(|flag| {
            Violation::new(
                resource
                    .properties_path()
                    .keys(&["PublicAccessBlockConfiguration", *flag]),
                format!("{}: {} is false", resource.name, flag),
            )
        })
        .collect()
}

pub fn bucket_encryption() -> impl Rule {
    SimpleRule::new(
        "E02",
        "s3-bucket-encryption",
        "encryption",
        TypeFilter::new("S3", &["AWS::S3::Bucket"]),
        RuleMeta::new(
            "S3 buckets must use AES256 or aws:kms server-side encryption",
            "Add BucketEncryption with SSEAlgorithm AES256, or aws:kms with a KMSMasterKeyID",
        ),
        check_bucket_encryption,
    )
    .quick()
}

/// An entry is acceptable when it uses AES256, or aws:kms with a key id.
fn is_acceptable_encryption(entry: &Value) -> bool {
    let Some(default) = entry.get("ServerSideEncryptionByDefault") else {
        return false;
    };
    match default.get("SSEAlgorithm").and_then(Value::as_str) {
        Some("AES256") => true,
        Some("aws:kms") => is_set(default.get("KMSMasterKeyID")),
        _ => false,
    }
}

fn check_bucket_encryption(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let entries = resource
        .property_at(&["BucketEncryption", "ServerSideEncryptionConfiguration"])
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if entries.iter().any(is_acceptable_encryption) {
        return Vec::new();
    }

    vec![Violation::new(
        resource.properties_path().key("BucketEncryption"),
        format!(
            "{} has no AES256/aws:kms server-side encryption",
            resource.name
        ),
    )]
}
