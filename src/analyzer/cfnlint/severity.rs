//! Keyword-driven severity classification.
//!
//! An identifier (a property name or a rule keyword) is lower-cased and
//! checked against three disjoint keyword sets in priority order
//! High, Medium, Low. The first set with a keyword contained in the
//! identifier decides the tier. No match means no tier.

use serde::{Deserialize, Serialize};

use crate::analyzer::cfnlint::types::Severity;

/// The three keyword sets, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

const DEFAULT_HIGH: &[&str] = &[
    "open", "public", "*", "0.0.0.0", "ssh", "rdp", "internet", "admin", "fromport", "toport",
    "master", "password", "secret", "ingress", "egress",
];

const DEFAULT_MEDIUM: &[&str] = &[
    "encryption",
    "unencrypted",
    "policy",
    "role",
    "privilege",
    "logging",
    "audit",
    "kms",
    "encrypted",
    "group",
    "vpc",
    "scanning",
    "webacl",
    "rotation",
];

const DEFAULT_LOW: &[&str] = &[
    "naming",
    "tag",
    "versioning",
    "backup",
    "idle",
    "default",
    "description",
    "engine",
    "multiaz",
    "retention",
    "deletion",
    "caching",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            high: owned(DEFAULT_HIGH),
            medium: owned(DEFAULT_MEDIUM),
            low: owned(DEFAULT_LOW),
        }
    }
}

impl KeywordSets {
    fn tiers(&self) -> [(Severity, &[String]); 3] {
        [
            (Severity::High, &self.high),
            (Severity::Medium, &self.medium),
            (Severity::Low, &self.low),
        ]
    }
}

/// Keyword set validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeywordError {
    #[error("empty keyword in the {0} set")]
    Empty(Severity),
    #[error("keyword '{keyword}' appears in both the {first} and {second} sets")]
    Overlap {
        keyword: String,
        first: Severity,
        second: Severity,
    },
}

/// Immutable classifier built once from validated keyword sets.
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    tiers: Vec<(Severity, Vec<String>)>,
}

impl SeverityClassifier {
    /// Validate and freeze keyword sets. Keywords are lower-cased; sets must
    /// not share a keyword and no keyword may be blank.
    pub fn new(sets: &KeywordSets) -> Result<Self, KeywordError> {
        let mut tiers: Vec<(Severity, Vec<String>)> = Vec::with_capacity(3);

        for (severity, words) in sets.tiers() {
            let mut lowered = Vec::with_capacity(words.len());
            for word in words {
                let word = word.trim().to_lowercase();
                if word.is_empty() {
                    return Err(KeywordError::Empty(severity));
                }
                if let Some((first, _)) = tiers.iter().find(|(_, seen)| seen.contains(&word)) {
                    return Err(KeywordError::Overlap {
                        keyword: word,
                        first: *first,
                        second: severity,
                    });
                }
                if !lowered.contains(&word) {
                    lowered.push(word);
                }
            }
            tiers.push((severity, lowered));
        }

        Ok(Self { tiers })
    }

    /// Classify an identifier. `None` means no keyword set matched, which
    /// callers report rather than defaulting.
    pub fn classify(&self, identifier: &str) -> Option<Severity> {
        let id = identifier.to_lowercase();
        self.tiers
            .iter()
            .find(|(_, words)| words.iter().any(|w| id.contains(w.as_str())))
            .map(|(severity, _)| *severity)
    }

    /// Keywords of one tier, lower-cased.
    pub fn keywords(&self, severity: Severity) -> &[String] {
        self.tiers
            .iter()
            .find(|(s, _)| *s == severity)
            .map(|(_, words)| words.as_slice())
            .unwrap_or_default()
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        // Built-in sets are disjoint and non-blank (checked in tests).
        let sets = KeywordSets::default();
        Self {
            tiers: sets
                .tiers()
                .into_iter()
                .map(|(severity, words)| (severity, words.to_vec()))
                .collect(),
        }
    }
}
