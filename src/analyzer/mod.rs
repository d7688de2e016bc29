//! # Analyzer Module
//!
//! Template analyzers. Currently a single engine, [`cfnlint`], for
//! CloudFormation templates.

pub mod cfnlint;
