//! Rule system framework for cfnlint.
//!
//! Provides the infrastructure for declaring CloudFormation checks:
//! - `Rule` trait for all rules
//! - `SimpleRule` for checks written as a function
//! - `RequiredProperty` (in [`required`]) for the declarative
//!   "this property must be set" table that covers most of the catalog

use serde_json::Value;

use crate::analyzer::cfnlint::parser::{Resource, Template, is_intrinsic};
use crate::analyzer::cfnlint::types::{RuleCode, RuleMeta, Violation};

// Rule modules
pub mod apigateway;
pub mod compute;
pub mod iam;
pub mod network;
pub mod required;
pub mod s3;

/// Context for evaluating rules against one template.
#[derive(Debug, Clone, Copy)]
pub struct LintContext<'a> {
    /// The parsed template.
    pub template: &'a Template,
}

impl<'a> LintContext<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }
}

/// Resource-type filter: a coarse family substring gate, then exact types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFilter {
    /// Family substring, e.g. `"S3"`.
    pub family: &'static str,
    /// Exact resource types within the family.
    pub kinds: &'static [&'static str],
}

impl TypeFilter {
    pub const fn new(family: &'static str, kinds: &'static [&'static str]) -> Self {
        Self { family, kinds }
    }

    /// Whether a resource type passes both the family gate and the exact filter.
    pub fn matches(&self, resource_type: &str) -> bool {
        resource_type.contains(self.family) && self.kinds.iter().any(|k| *k == resource_type)
    }
}

/// A rule that can check CloudFormation resources.
///
/// Rules are stateless. `check` is called once per resource that passes
/// [`Rule::scope`]; cross-resource rules read the rest of the template
/// through the context.
pub trait Rule: Send + Sync {
    /// Get the rule code (e.g., "E01").
    fn code(&self) -> &RuleCode;

    /// Get the human-readable rule name (e.g., "s3-public-access-block").
    fn name(&self) -> &str;

    /// Get the rule metadata (description, remediation).
    fn meta(&self) -> &RuleMeta;

    /// Identifying keyword used for severity when a finding path names no
    /// classifiable property.
    fn keyword(&self) -> &str;

    /// Resource types this rule applies to.
    fn scope(&self) -> &TypeFilter;

    /// Whether the rule belongs to the quick tier.
    fn in_quick_tier(&self) -> bool {
        false
    }

    /// Check one matching resource and return any violations.
    fn check(&self, context: &LintContext, resource: &Resource) -> Vec<Violation>;
}

/// Base implementation for a rule backed by a check function.
pub struct SimpleRule<F>
where
    F: Fn(&LintContext, &Resource) -> Vec<Violation> + Send + Sync,
{
    code: RuleCode,
    name: String,
    keyword: String,
    scope: TypeFilter,
    quick: bool,
    meta: RuleMeta,
    check_fn: F,
}

impl<F> SimpleRule<F>
where
    F: Fn(&LintContext, &Resource) -> Vec<Violation> + Send + Sync,
{
    pub fn new(
        code: impl Into<RuleCode>,
        name: impl Into<String>,
        keyword: impl Into<String>,
        scope: TypeFilter,
        meta: RuleMeta,
        check_fn: F,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            keyword: keyword.into(),
            scope,
            quick: false,
            meta,
            check_fn,
        }
    }

    /// Include the rule in the quick tier.
    pub fn quick(mut self) -> Self {
        self.quick = true;
        self
    }
}

impl<F> Rule for SimpleRule<F>
where
    F: Fn(&LintContext, &Resource) -> Vec<Violation> + Send + Sync,
{
    fn code(&self) -> &RuleCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn keyword(&self) -> &str {
        &self.keyword
    }

    fn scope(&self) -> &TypeFilter {
        &self.scope
    }

    fn in_quick_tier(&self) -> bool {
        self.quick
    }

    fn check(&self, context: &LintContext, resource: &Resource) -> Vec<Violation> {
        (self.check_fn)(context, resource)
    }
}

/// Read a port that is a number or a decimal string.
///
/// Intrinsic functions and anything else non-numeric yield `None`; callers
/// must treat that as "unknown" and not as a match.
pub fn numeric_port(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }
}

/// Whether a value is literally boolean `true` (or the string `"true"`).
pub fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Whether a value is literally boolean `false` (or the string `"false"`).
pub fn is_false(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => !*b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("false"),
        _ => false,
    }
}

/// Whether a value counts as set: present, not null, not an empty string,
/// sequence or mapping. Intrinsics count as set.
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    }
}

/// Whether the value's truth cannot be known statically.
pub fn is_unknown(value: Option<&Value>) -> bool {
    value.is_some_and(is_intrinsic)
}

/// Iterate the string members of a value that is a string or a sequence of
/// strings, with the member index (`None` for a bare string).
pub fn string_members(value: &Value) -> Vec<(Option<usize>, &str)> {
    match value {
        Value::String(s) => vec![(None, s.as_str())],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_str().map(|s| (Some(i), s)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Get all enabled rules.
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = vec![
        Box::new(s3::public_access_block()),
        Box::new(s3::bucket_encryption()),
        Box::new(iam::wildcard_action()),
        Box::new(network::open_to_world()),
        Box::new(compute::instance_public_ip()),
        Box::new(network::vpc_flow_logs()),
        Box::new(compute::lambda_env_secrets()),
        Box::new(compute::instance_name_tag()),
        Box::new(iam::sns_wildcard_principal()),
        Box::new(apigateway::stage_caching()),
    ];
    rules.extend(
        required::REQUIRED_PROPERTIES
            .iter()
            .map(|r| Box::new(r.clone()) as Box<dyn Rule>),
    );
    // Numeric order regardless of the E/W class prefix.
    rules.sort_by(|a, b| a.code().as_str().get(1..).cmp(&b.code().as_str().get(1..)));
    rules
}

/// Get rule definitions for documentation.
pub fn rule_definitions() -> Vec<RuleDefinition> {
    all_rules()
        .iter()
        .map(|r| RuleDefinition::from_rule(r.as_ref()))
        .collect()
}

/// Rule definition for documentation/introspection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuleDefinition {
    pub code: RuleCode,
    pub name: String,
    pub keyword: String,
    pub resource_types: Vec<&'static str>,
    pub description: &'static str,
    pub remediation: &'static str,
    pub quick: bool,
}

impl RuleDefinition {
    pub fn from_rule(rule: &dyn Rule) -> Self {
        Self {
            code: rule.code().clone(),
            name: rule.name().to_string(),
            keyword: rule.keyword().to_string(),
            resource_types: rule.scope().kinds.to_vec(),
            description: rule.meta().description,
            remediation: rule.meta().remediation,
            quick: rule.in_quick_tier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::cfnlint::severity::SeverityClassifier;
    use serde_json::json;

    #[test]
    fn test_rule_codes_unique() {
        let rules = all_rules();
        let mut codes: Vec<String> = rules.iter().map(|r| r.code().to_string()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 27, "Rule codes should be unique");
    }

    #[test]
    fn test_all_rules_count() {
        let rules = all_rules();
        assert_eq!(rules.len(), 27, "Expected 27 rules");
    }

    #[test]
    fn test_rule_names_unique() {
        let rules = all_rules();
        let mut names: Vec<String> = rules.iter().map(|r| r.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 27, "Rule names should be unique");
    }

    #[test]
    fn test_quick_tier_is_the_first_five_codes() {
        let quick: Vec<String> = all_rules()
            .iter()
            .filter(|r| r.in_quick_tier())
            .map(|r| r.code().to_string())
            .collect();
        assert_eq!(quick, vec!["E01", "E02", "E03", "E04", "E05"]);
    }

    #[test]
    fn test_every_rule_keyword_classifies() {
        let classifier = SeverityClassifier::default();
        for rule in all_rules() {
            assert!(
                classifier.classify(rule.keyword()).is_some(),
                "keyword '{}' of {} matches no severity set",
                rule.keyword(),
                rule.code()
            );
        }
    }

    #[test]
    fn test_type_filter() {
        let filter = TypeFilter::new("S3", &["AWS::S3::Bucket"]);
        assert!(filter.matches("AWS::S3::Bucket"));
        assert!(!filter.matches("AWS::S3::BucketPolicy"));
        assert!(!filter.matches("AWS::EC2::Instance"));
    }

    #[test]
    fn test_numeric_port() {
        assert_eq!(numeric_port(&json!(22)), Some(22));
        assert_eq!(numeric_port(&json!("3389")), Some(3389));
        assert_eq!(numeric_port(&json!("-1")), None);
        assert_eq!(numeric_port(&json!({"Ref": "Port"})), None);
        assert_eq!(numeric_port(&json!("ssh")), None);
    }

    #[test]
    fn test_value_predicates() {
        assert!(is_true(Some(&json!(true))));
        assert!(is_true(Some(&json!("True"))));
        assert!(!is_true(None));
        assert!(is_false(Some(&json!(false))));
        assert!(!is_false(None));
        assert!(is_set(Some(&json!({"Ref": "Key"}))));
        assert!(!is_set(Some(&json!(""))));
        assert!(!is_set(Some(&json!([]))));
        assert!(is_unknown(Some(&json!({"Fn::If": ["C", true, false]}))));
    }
}
