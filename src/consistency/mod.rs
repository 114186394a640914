//! Ledger/corpus reconciliation
//!
//! - [`Validator`] reports every inconsistency without touching anything
//! - [`AutoFixer`] applies the deterministic repairs in a fixed order

pub mod fixer;
pub mod report;
pub mod validator;

use std::collections::{HashMap, HashSet};

pub use fixer::AutoFixer;
pub use report::{IssueKind, ValidationIssue, ValidationReport};
pub use validator::{Validator, ValidatorOptions};

use crate::corpus::CanonicalKey;
use crate::ledger::{HistoryId, Ledger};

/// File label used in report entries for a ledger history
pub(crate) fn ledger_file_name(ledger: &Ledger, history: HistoryId) -> String {
    ledger.file(ledger.history(history).file).file_name()
}

/// Ledger keys per history title.
///
/// A corpus note is covered when the history sharing its unit title holds
/// either of its forms, in any scene.
#[derive(Debug, Default)]
pub(crate) struct Coverage {
    by_unit: HashMap<String, HashSet<String>>,
}

impl Coverage {
    pub fn build(ledger: &Ledger) -> Self {
        let mut coverage = Self::default();
        for id in ledger.expression_ids() {
            let history = ledger.history_of(ledger.parent_of(id));
            coverage.insert(
                &ledger.history(history).metadata.title,
                &ledger.expression(id).expression,
            );
        }
        coverage
    }

    pub fn insert(&mut self, unit_title: &str, key: &str) {
        self.by_unit
            .entry(unit_title.to_string())
            .or_default()
            .insert(key.to_string());
    }

    pub fn covers(&self, unit_title: &str, key: &CanonicalKey) -> bool {
        self.by_unit
            .get(unit_title)
            .map_or(false, |keys| key.forms().any(|form| keys.contains(form)))
    }
}
