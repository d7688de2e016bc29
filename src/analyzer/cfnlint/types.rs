//! Core types for the cfnlint template scanner.
//!
//! - `Severity` - Finding severity tiers
//! - `RuleCode` - Rule identifiers (e.g., "E01")
//! - `StructuralPath` - Addresses a node inside a template
//! - `Violation` / `RawFinding` / `Finding` - A rule hit before and after aggregation

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Label used when a finding path is too shallow to name a property.
pub const UNKNOWN_PROPERTY: &str = "UnknownProperty";

/// Severity tiers for findings.
///
/// Totally ordered: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl Severity {
    /// All tiers in classification priority order.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Parse a severity from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" | "critical" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Numeric rank used for ordering (High=3, Medium=2, Low=1).
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A rule code identifier (e.g., "E01", "W12").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCode(pub Cow<'static, str>);

impl RuleCode {
    /// Create a new rule code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    /// Create a rule code from a static string (usable in const tables).
    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the rule is error-class (`E..`) rather than warning-class (`W..`).
    pub fn is_error_class(&self) -> bool {
        self.0.starts_with('E')
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RuleCode {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

/// One step of a structural path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{}", k),
            Self::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        Self::Key(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        Self::Key(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Join raw segment strings into the canonical path format shared by the
/// position index and the finding locator.
pub fn join_canonical<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: fmt::Display,
{
    let mut out = String::new();
    for (i, seg) in segments.into_iter().enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&seg.to_string());
    }
    out
}

/// Ordered sequence of segments addressing one node in a template.
///
/// The first segment is always the resource logical name; the implicit
/// `Resources` root is added by [`StructuralPath::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralPath(Vec<PathSegment>);

impl StructuralPath {
    /// Path of a resource node.
    pub fn resource(name: &str) -> Self {
        Self(vec![PathSegment::Key(name.to_string())])
    }

    /// Path of a resource's `Properties` node.
    pub fn properties(name: &str) -> Self {
        Self::resource(name).key("Properties")
    }

    /// Append a mapping key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Append a sequence index.
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathSegment::Index(index));
        self
    }

    /// Append several keys in order.
    pub fn keys(mut self, keys: &[&str]) -> Self {
        self.0
            .extend(keys.iter().map(|k| PathSegment::Key((*k).to_string())));
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Logical name of the resource this path points into.
    pub fn resource_name(&self) -> &str {
        self.0.first().and_then(|s| s.as_key()).unwrap_or_default()
    }

    /// Deepest conventionally-named property segment.
    ///
    /// A conventional name is a key (not an index) that starts with an ASCII
    /// uppercase letter. The resource name and the `Properties` wrapper never
    /// count.
    pub fn property_name(&self) -> Option<&str> {
        self.0
            .iter()
            .skip(1)
            .rev()
            .filter_map(|s| s.as_key())
            .find(|k| *k != "Properties" && k.starts_with(|c: char| c.is_ascii_uppercase()))
    }

    /// Canonical `Resources/<name>/...` string used as the position index key.
    pub fn canonical(&self) -> String {
        join_canonical(
            std::iter::once(&PathSegment::Key("Resources".to_string())).chain(self.0.iter()),
        )
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl Serialize for StructuralPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

/// Position in the source file (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Where a finding sits in the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Resolved to a 1-based line and column.
    Resolved(Position),
    /// The path has no verbatim counterpart in the source.
    NotFound,
    /// No position resolution was attempted (quick tier).
    Structural,
}

impl Location {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Resolved(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(p) => write!(f, "{}:{}", p.line, p.column),
            Self::NotFound => write!(f, "not found"),
            Self::Structural => write!(f, "-"),
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Descriptive metadata for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    /// Short description.
    pub description: &'static str,
    /// How to fix a violation.
    pub remediation: &'static str,
}

impl RuleMeta {
    pub const fn new(description: &'static str, remediation: &'static str) -> Self {
        Self {
            description,
            remediation,
        }
    }
}

/// What a rule emits: a location in the template and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: StructuralPath,
    pub message: String,
}

impl Violation {
    pub fn new(path: StructuralPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// A violation stamped with the identity of the rule that produced it.
/// Severity is not attached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFinding {
    pub rule: RuleCode,
    /// The rule's identifying keyword, used when the path names no
    /// classifiable property.
    pub keyword: String,
    pub description: String,
    pub path: StructuralPath,
    pub message: String,
}

/// A located, classified finding as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule: RuleCode,
    pub severity: Severity,
    pub message: String,
    pub path: StructuralPath,
    #[serde(skip_serializing_if = "is_structural")]
    pub location: Location,
    pub description: String,
}

fn is_structural(location: &Location) -> bool {
    matches!(location, Location::Structural)
}

/// Non-finding conditions reported beside the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// Structural/schema problem reported by the template normaliser.
    Schema { path: String, message: String },
    /// A rule faulted on one resource and contributed nothing for it.
    RuleFault {
        rule: RuleCode,
        resource: String,
        message: String,
    },
    /// The source position index could not be built; every location in
    /// this scan is `not found`.
    PositionIndex { message: String },
    /// No keyword set matched the finding's identifier.
    Unclassified {
        rule: RuleCode,
        identifier: String,
        path: String,
        message: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { path, message } => write!(f, "schema: {}: {}", path, message),
            Self::RuleFault {
                rule,
                resource,
                message,
            } => write!(f, "rule {} faulted on {}: {}", rule, resource, message),
            Self::PositionIndex { message } => {
                write!(f, "source positions unavailable: {}", message)
            }
            Self::Unclassified {
                rule,
                identifier,
                path,
                ..
            } => write!(
                f,
                "rule {} at {}: no severity keyword matches '{}'",
                rule, path, identifier
            ),
        }
    }
}
