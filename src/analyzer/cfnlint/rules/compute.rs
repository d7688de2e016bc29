//! EC2 instance and Lambda checks.

use serde_json::Value;

use crate::analyzer::cfnlint::parser::Resource;
use crate::analyzer::cfnlint::rules::{LintContext, Rule, SimpleRule, TypeFilter, is_true};
use crate::analyzer::cfnlint::types::{RuleMeta, Violation};

const EC2_INSTANCE: TypeFilter = TypeFilter::new("EC2", &["AWS::EC2::Instance"]);

/// Substrings of environment variable names that suggest a secret value.
const SECRET_MARKERS: [&str; 4] = ["PASSWORD", "SECRET", "API_KEY", "TOKEN"];

/// E08: no network interface may request a public IP.
pub fn instance_public_ip() -> impl Rule {
    SimpleRule::new(
        "E08",
        "ec2-no-public-ip",
        "public",
        EC2_INSTANCE,
        RuleMeta::new(
            "EC2 instances should not be assigned a public IP at launch",
            "Set AssociatePublicIpAddress: false and reach the instance through a load balancer or bastion",
        ),
        check_instance_public_ip,
    )
}

fn check_instance_public_ip(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    resource
        .property_list("NetworkInterfaces")
        .iter()
        .enumerate()
        .filter(|(_, nic)| is_true(nic.get("AssociatePublicIpAddress")))
        .map(|(i, _)| {
            Violation::new(
                resource
                    .properties_path()
                    .key("NetworkInterfaces")
                    .index(i)
                    .key("AssociatePublicIpAddress"),
                format!(
                    "{}: EC2 instance should not have a public IP address",
                    resource.name
                ),
            )
        })
        .collect()
}

/// W16: environment variable names that look like secrets.
///
/// Findings sit on the `Variables` node; variable names are user data and
/// only appear in the message.
pub fn lambda_env_secrets() -> impl Rule {
    SimpleRule::new(
        "W16",
        "lambda-env-secrets",
        "secret",
        TypeFilter::new("Lambda", &["AWS::Lambda::Function"]),
        RuleMeta::new(
            "Lambda environment variables should not carry secrets",
            "Read the value from Secrets Manager or SSM Parameter Store at runtime",
        ),
        check_lambda_env_secrets,
    )
}

fn looks_secret(name: &str) -> bool {
    let upper = name.to_uppercase();
    SECRET_MARKERS.iter().any(|m| upper.contains(m))
}

fn check_lambda_env_secrets(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let Some(Value::Object(variables)) = resource.property_at(&["Environment", "Variables"]) else {
        return Vec::new();
    };

    variables
        .keys()
        .filter(|name| looks_secret(name))
        .map(|name| {
            Violation::new(
                resource.properties_path().keys(&["Environment", "Variables"]),
                format!(
                    "{}: Lambda environment variable '{}' may contain a secret",
                    resource.name, name
                ),
            )
        })
        .collect()
}

/// W17: instances need a `Name` tag.
pub fn instance_name_tag() -> impl Rule {
    SimpleRule::new(
        "W17",
        "ec2-name-tag",
        "tag",
        EC2_INSTANCE,
        RuleMeta::new(
            "EC2 instances should have a Name tag",
            "Add a Tags entry with Key: Name",
        ),
        check_instance_name_tag,
    )
}

fn check_instance_name_tag(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let named = resource
        .property_list("Tags")
        .iter()
        .any(|tag| tag.get("Key").and_then(Value::as_str) == Some("Name"));
    if named {
        return Vec::new();
    }
    vec![Violation::new(
        resource.properties_path().key("Tags"),
        format!("{}: EC2 instance is missing a 'Name' tag", resource.name),
    )]
}
