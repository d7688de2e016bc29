//! Rule catalog and parallel evaluation.
//!
//! Work is split into (rule, resource) units. Units share nothing but the
//! immutable template, so they run on the rayon pool; a unit that panics is
//! recorded as a fault and contributes no findings.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::analyzer::cfnlint::config::CfnlintConfig;
use crate::analyzer::cfnlint::lint::ScanTier;
use crate::analyzer::cfnlint::parser::{Resource, Template};
use crate::analyzer::cfnlint::rules::{LintContext, Rule, all_rules};
use crate::analyzer::cfnlint::types::{Diagnostic, RawFinding};

/// Read-only set of registered rules.
pub struct Catalog {
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("rules", &self.len()).finish()
    }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog::new(all_rules()));

impl Catalog {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// The process-wide built-in catalog.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by code.
    pub fn get(&self, code: &str) -> Option<&dyn Rule> {
        self.rules().find(|r| r.code().as_str() == code)
    }

    /// Rules for a tier, minus ignored ones. Quick is a subset of deep.
    pub fn select(&self, tier: ScanTier, config: &CfnlintConfig) -> Vec<&dyn Rule> {
        self.rules()
            .filter(|r| tier == ScanTier::Deep || r.in_quick_tier())
            .filter(|r| !config.is_rule_ignored(r.code()))
            .collect()
    }
}

/// Output of one evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Raw findings in (rule, resource) unit order.
    pub findings: Vec<RawFinding>,
    /// Units that faulted.
    pub faults: Vec<Diagnostic>,
    /// Number of units evaluated.
    pub units: usize,
}

/// Evaluate rules against every resource they apply to.
pub fn evaluate(template: &Template, rules: &[&dyn Rule]) -> Evaluation {
    let ctx = LintContext::new(template);

    let units: Vec<(&dyn Rule, &Resource)> = rules
        .iter()
        .flat_map(|rule| {
            template
                .resources_of_type(rule.scope().family)
                .into_values()
                .filter(move |res| rule.scope().matches(&res.resource_type))
                .map(move |res| (*rule, res))
        })
        .collect();

    debug!(
        "Evaluating {} rules over {} resources ({} units)",
        rules.len(),
        template.len(),
        units.len()
    );

    let outcomes: Vec<Result<Vec<RawFinding>, Diagnostic>> = units
        .par_iter()
        .map(|(rule, resource)| run_unit(&ctx, *rule, resource))
        .collect();

    let mut evaluation = Evaluation {
        units: units.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(findings) => evaluation.findings.extend(findings),
            Err(fault) => evaluation.faults.push(fault),
        }
    }
    evaluation
}

fn run_unit(
    ctx: &LintContext,
    rule: &dyn Rule,
    resource: &Resource,
) -> Result<Vec<RawFinding>, Diagnostic> {
    let violations = panic::catch_unwind(AssertUnwindSafe(|| rule.check(ctx, resource)))
        .map_err(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(
                "Rule {} faulted on resource {}: {}",
                rule.code(),
                resource.name,
                message
            );
            Diagnostic::RuleFault {
                rule: rule.code().clone(),
                resource: resource.name.clone(),
                message,
            }
        })?;

    Ok(violations
        .into_iter()
        .map(|v| RawFinding {
            rule: rule.code().clone(),
            keyword: rule.keyword().to_string(),
            description: rule.meta().description.to_string(),
            path: v.path,
            message: v.message,
        })
        .collect())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}
