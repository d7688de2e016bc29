//! W28 `apigateway-caching`: stages should enable caching on at least one
//! method setting.

use crate::analyzer::cfnlint::parser::Resource;
use crate::analyzer::cfnlint::rules::{LintContext, Rule, SimpleRule, TypeFilter, is_true};
use crate::analyzer::cfnlint::types::{RuleMeta, Violation};

pub fn stage_caching() -> impl Rule {
    SimpleRule::new(
        "W28",
        "apigateway-caching",
        "caching",
        TypeFilter::new("ApiGateway", &["AWS::ApiGateway::Stage"]),
        RuleMeta::new(
            "API Gateway stages should have caching enabled",
            "Add a MethodSettings entry with CachingEnabled: true",
        ),
        check,
    )
}

fn check(_ctx: &LintContext, resource: &Resource) -> Vec<Violation> {
    let cached = resource
        .property_list("MethodSettings")
        .iter()
        .any(|setting| is_true(setting.get("CachingEnabled")));
    if cached {
        return Vec::new();
    }
    vec![Violation::new(
        resource.properties_path().key("MethodSettings"),
        format!("{}: API Gateway stage should have caching enabled", resource.name),
    )]
}
