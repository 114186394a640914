//! Structured validation and repair report

use std::fmt;

use serde::{Deserialize, Serialize};

/// What an issue is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // Ledger structure
    EmptyExpression,
    UnknownStatus,
    MissingTimestamp,
    OutOfOrder,
    DuplicateDate,
    DuplicateExpression,
    // Cross-reference consistency
    Orphaned,
    WrongScene,
    MultipleScenes,
    MissingInConversation,
    InvalidDictionaryReference,
    // Warnings
    MissingCoverage,
    Relocated,
    Canonicalized,
    Merged,
    Pruned,
    Backfilled,
    DictionaryReferenceStripped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Ledger or corpus file the issue was found in
    pub file: String,
    /// Path inside the file, e.g. `[0].scenes[1].expressions[3]`
    pub location: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationIssue {
    pub fn new(
        kind: IssueKind,
        file: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            file: file.into(),
            location: location.into(),
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.file, self.location, self.message)
    }
}

/// Findings of a check or fix pass, partitioned by bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub structure_errors: Vec<ValidationIssue>,
    pub consistency_errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.structure_errors.is_empty() || !self.consistency_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.structure_errors.len() + self.consistency_errors.len()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && self.warnings.is_empty()
    }

    /// Every issue of a kind, across buckets
    pub fn of_kind(&self, kind: IssueKind) -> Vec<&ValidationIssue> {
        self.structure_errors
            .iter()
            .chain(&self.consistency_errors)
            .chain(&self.warnings)
            .filter(|issue| issue.kind == kind)
            .collect()
    }
}
