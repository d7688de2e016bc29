//! Policy document checks.
//!
//! E03 `iam-wildcard-action`: statements must not grant wildcard actions.
//! E22 `sns-topic-policy-wildcard`: topic policies must not allow any principal.

use serde_json::Value;

use crate::analyzer::cfnlint::parser::Resource;
use crate::analyzer::cfnlint::rules::{LintContext, Rule, SimpleRule, TypeFilter, string_members};
use crate::analyzer::cfnlint::types::{RuleMeta, StructuralPath, Violation};

/// Statements of a policy document with their paths. `Statement` may be a
/// single mapping or a sequence of mappings.
fn statements<'a>(document: &'a Value, base: &StructuralPath) -> Vec<(StructuralPath, &'a Value)> {
    let base = base.clone().key("Statement");
    match document.get("Statement") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, st)| (base.clone().index(i), st))
            .collect(),
        Some(single @ Value::Object(_)) => vec![(base, single)],
        _ => Vec::new(),
    }
}

/// Every policy document carried by a resource, with its path.
fn policy_documents(resource: &Resource) -> Vec<(StructuralPath, &Value)> {
    let mut docs = Vec::new();
    if let Some(doc) = resource.property("PolicyDocument") {
        docs.push((resource.properties_path().key("PolicyDocument"), doc));
    }
    for (i, policy) in resource.property_list("Policies").iter().enumerate() {
        if let Some(doc) = policy.get("PolicyDocument") {
            docs.push((
                resource
                    .properties_path()
                    .key("Policies")
                    .index(i)
                    .key("PolicyDocument"),
                doc,
            ));
        }
    }
    docs
}

fn is_wildcard_action(action: &str) -> bool {
    action == "*" || action == "*:*" || action.ends_with(":*")
}

pub fn wildcard_action() -> impl Rule {
    SimpleRule::new(
        "E03",
        "iam-wildcard-action",
        "*",
        TypeFilter::new(
            "IAM",
            &[
                "AWS::IAM::Policy",
                "AWS::IAM::ManagedPolicy",
                "AWS::IAM::Role",
                "AWS::IAM::User",
                "AWS::IAM::Group",
            ],
        ),
        RuleMeta::new(
            "IAM policies should not grant wildcard actions",
            "List the specific actions the principal needs",
        ),
        check_wildcard_action,
    )
    .quick()
}

fn check_wildcard_action(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (doc_path, doc) in policy_documents(resource) {
        for (st_path, statement) in statements(doc, &doc_path) {
            let Some(actions) = statement.get("Action") else {
                continue;
            };
            for (index, action) in string_members(actions) {
                if !is_wildcard_action(action) {
                    continue;
                }
                let path = match index {
                    Some(i) => st_path.clone().key("Action").index(i),
                    None => st_path.clone().key("Action"),
                };
                violations.push(Violation::new(
                    path,
                    format!("{} policy Action uses wildcard: {}", resource.name, action),
                ));
            }
        }
    }

    violations
}

fn is_wildcard_principal(principal: &Value) -> bool {
    match principal {
        Value::String(s) => s == "*",
        Value::Object(map) => map
            .get("AWS")
            .is_some_and(|aws| string_members(aws).iter().any(|(_, p)| *p == "*")),
        _ => false,
    }
}

pub fn sns_wildcard_principal() -> impl Rule {
    SimpleRule::new(
        "E22",
        "sns-topic-policy-wildcard",
        "*",
        TypeFilter::new("SNS", &["AWS::SNS::TopicPolicy"]),
        RuleMeta::new(
            "SNS topic policies should not allow any principal",
            "Restrict Principal to specific accounts, roles or services",
        ),
        check_sns_wildcard_principal,
    )
}

fn check_sns_wildcard_principal(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let Some(doc) = resource.property("PolicyDocument") else {
        return Vec::new();
    };
    let doc_path = resource.properties_path().key("PolicyDocument");

    statements(doc, &doc_path)
        .into_iter()
        .filter(|(_, st)| st.get("Principal").is_some_and(is_wildcard_principal))
        .map(|(path, _)| {
            Violation::new(
                path.key("Principal"),
                format!(
                    "{}: SNS topic policy is overly permissive with a wildcard principal",
                    resource.name
                ),
            )
        })
        .collect()
}
