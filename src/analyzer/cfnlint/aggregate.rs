//! Finding aggregation.
//!
//! Raw findings are classified, located and grouped into a report keyed by
//! resource logical name, then property name. Within a bucket findings are
//! ordered by descending severity; ties keep evaluation order.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::analyzer::cfnlint::parser::PositionIndex;
use crate::analyzer::cfnlint::severity::SeverityClassifier;
use crate::analyzer::cfnlint::types::{
    Diagnostic, Finding, Location, RawFinding, Severity, UNKNOWN_PROPERTY,
};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<Finding>>>;

/// Grouped, sorted findings of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    resources: Buckets,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Total number of findings.
    pub fn len(&self) -> usize {
        self.findings().count()
    }

    /// Resource names with at least one finding.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Property buckets of one resource.
    pub fn properties(&self, resource: &str) -> Option<&BTreeMap<String, Vec<Finding>>> {
        self.resources.get(resource)
    }

    /// Findings of one (resource, property) bucket, in report order.
    pub fn findings_for(&self, resource: &str, property: &str) -> &[Finding] {
        self.resources
            .get(resource)
            .and_then(|props| props.get(property))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every finding, in report order.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.resources
            .values()
            .flat_map(|props| props.values())
            .flatten()
    }

    /// Iterate `(resource, property, findings)` buckets.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &str, &[Finding])> {
        self.resources.iter().flat_map(|(resource, props)| {
            props
                .iter()
                .map(move |(property, findings)| {
                    (resource.as_str(), property.as_str(), findings.as_slice())
                })
        })
    }

    pub fn max_severity(&self) -> Option<Severity> {
        self.findings().map(|f| f.severity).max()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings().filter(|f| f.severity == severity).count()
    }
}

/// Report plus the non-finding conditions met while building it.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub report: Report,
    pub diagnostics: Vec<Diagnostic>,
}

/// Identifier a finding is classified and grouped by.
pub fn property_label(raw: &RawFinding) -> &str {
    raw.path.property_name().unwrap_or(UNKNOWN_PROPERTY)
}

/// Classify, locate, filter and group raw findings.
///
/// Severity comes from the property label, falling back to the rule's
/// keyword. Findings matching neither are reported as
/// [`Diagnostic::Unclassified`] and kept out of the report. Without an index
/// every location is [`Location::Structural`].
pub fn aggregate(
    raw: &[RawFinding],
    classifier: &SeverityClassifier,
    index: Option<&PositionIndex>,
    threshold: Severity,
) -> Aggregation {
    let mut buckets = Buckets::new();
    let mut diagnostics = Vec::new();
    let mut below_threshold = 0usize;

    for finding in raw {
        let property = property_label(finding);

        let Some(severity) = classifier
            .classify(property)
            .or_else(|| classifier.classify(&finding.keyword))
        else {
            warn!(
                "No severity keyword matches '{}' or '{}' (rule {})",
                property, finding.keyword, finding.rule
            );
            diagnostics.push(Diagnostic::Unclassified {
                rule: finding.rule.clone(),
                identifier: property.to_string(),
                path: finding.path.canonical(),
                message: finding.message.clone(),
            });
            continue;
        };

        if severity < threshold {
            below_threshold += 1;
            continue;
        }

        let location = index.map_or(Location::Structural, |idx| idx.resolve(&finding.path));

        buckets
            .entry(finding.path.resource_name().to_string())
            .or_default()
            .entry(property.to_string())
            .or_default()
            .push(Finding {
                rule: finding.rule.clone(),
                severity,
                message: finding.message.clone(),
                path: finding.path.clone(),
                location,
                description: finding.description.clone(),
            });
    }

    for findings in buckets.values_mut().flat_map(|props| props.values_mut()) {
        // `sort_by` is stable: equal severities keep evaluation order.
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    }

    if below_threshold > 0 {
        debug!("{} findings below the {} threshold", below_threshold, threshold);
    }

    Aggregation {
        report: Report { resources: buckets },
        diagnostics,
    }
}
