//! Deterministic repairs of the ledger and corpus
//!
//! Repairs run in a fixed order since later steps rely on identity and
//! placement normalized by earlier ones:
//!
//! 1. relocate expressions recorded under the wrong scene
//! 2. rename surface forms to the corpus base form
//! 3. merge duplicate keys, within a scene and then across scenes
//! 4. prune record-less expressions missing from the corpus
//! 5. backfill entries for uncovered corpus notes
//! 6. clear dictionary references without a cached entry
//!
//! All repairs happen in memory; callers persist the result afterwards.
//! Running the fixer on its own output applies nothing.

use std::collections::HashMap;

use super::report::{IssueKind, ValidationIssue, ValidationReport};
use super::{ledger_file_name, Coverage};
use crate::corpus::{Corpus, CorpusIndex, DictionaryCache, NoteLocation, NotebookKind};
use crate::ledger::{ExpressionId, ExpressionParent, HistoryId, Ledger, LearningExpression};

/// Ledger file stem for a series: lower-cased, words joined by hyphens
pub fn series_file_name(series_name: &str) -> String {
    series_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub struct AutoFixer<'a> {
    dictionary: &'a dyn DictionaryCache,
}

impl<'a> AutoFixer<'a> {
    pub fn new(dictionary: &'a dyn DictionaryCache) -> Self {
        Self { dictionary }
    }

    /// Apply every repair; each one is reported as a warning
    pub fn fix(&self, corpus: &mut Corpus, ledger: &mut Ledger) -> ValidationReport {
        let index = corpus.index();
        let mut warnings = Vec::new();

        relocate(ledger, &index, &mut warnings);
        canonicalize(ledger, &index, &mut warnings);
        merge_duplicates(ledger, &mut warnings);
        prune_orphans(ledger, &index, &mut warnings);
        backfill(ledger, &index, &mut warnings);
        self.strip_dictionary_references(corpus, &mut warnings);

        log::info!("Applied {} repairs", warnings.len());
        ValidationReport {
            warnings,
            ..ValidationReport::default()
        }
    }

    fn strip_dictionary_references(&self, corpus: &mut Corpus, warnings: &mut Vec<ValidationIssue>) {
        let dictionary = self.dictionary;
        corpus.for_each_note_mut(|path, note| {
            if note.dictionary_number == 0 || dictionary.contains(note.dictionary_word()) {
                return false;
            }
            log::info!(
                "Clearing dictionary_number {} of '{}' in {:?}",
                note.dictionary_number,
                note.expression,
                path
            );
            warnings.push(ValidationIssue::new(
                IssueKind::DictionaryReferenceStripped,
                path.display().to_string(),
                note.expression.clone(),
                format!(
                    "cleared dictionary_number {}: no cached entry for '{}'",
                    note.dictionary_number,
                    note.dictionary_word()
                ),
            ));
            note.dictionary_number = 0;
            true
        });
    }
}

/// Key, unit title and scene title of an expression
fn identity(ledger: &Ledger, id: ExpressionId) -> (String, String, String, HistoryId) {
    let parent = ledger.parent_of(id);
    let history = ledger.history_of(parent);
    (
        ledger.expression(id).expression.clone(),
        ledger.history(history).metadata.title.clone(),
        ledger.scene_title(parent).to_string(),
        history,
    )
}

fn relocate(ledger: &mut Ledger, index: &CorpusIndex, warnings: &mut Vec<ValidationIssue>) {
    for id in ledger.expression_ids() {
        if !matches!(ledger.parent_of(id), ExpressionParent::Scene(_)) {
            continue;
        }
        let (key, unit, current, history) = identity(ledger, id);
        if key.trim().is_empty() || index.scene_contains(&unit, &current, &key) {
            continue;
        }
        let Some(target_title) = index
            .locations(&key)
            .into_iter()
            .find(|loc| loc.kind == NotebookKind::Story && loc.unit_title == unit)
            .map(|loc| loc.scene_title.clone())
        else {
            continue;
        };

        let file = ledger_file_name(ledger, history);
        let path = ledger.path_of(id);
        let target = ExpressionParent::Scene(ledger.find_or_add_scene(history, &target_title));
        match ledger.find_expression(target, &key) {
            Some(existing) => ledger.merge_into(existing, id),
            None => ledger.move_expression(id, target),
        }

        log::info!("Moved '{}' in '{}' from '{}' to '{}'", key, unit, current, target_title);
        warnings.push(ValidationIssue::new(
            IssueKind::Relocated,
            file,
            path,
            format!("moved '{}' from scene '{}' to '{}'", key, current, target_title),
        ));
    }
}

fn canonicalize(ledger: &mut Ledger, index: &CorpusIndex, warnings: &mut Vec<ValidationIssue>) {
    for id in ledger.expression_ids() {
        let (key, unit, scene, history) = identity(ledger, id);
        let Some(base) = index
            .note_at(&unit, &scene, &key)
            .and_then(|note| note.key.base())
        else {
            continue;
        };
        if base == key {
            continue;
        }

        log::info!("Renaming '{}' to base form '{}'", key, base);
        warnings.push(ValidationIssue::new(
            IssueKind::Canonicalized,
            ledger_file_name(ledger, history),
            ledger.path_of(id),
            format!("renamed '{}' to its base form '{}'", key, base),
        ));
        ledger.expression_mut(id).expression = base.to_string();
    }
}

fn merge_duplicates(ledger: &mut Ledger, warnings: &mut Vec<ValidationIssue>) {
    let histories: Vec<HistoryId> = ledger.history_ids().collect();
    for history in histories {
        let file = ledger_file_name(ledger, history);

        for parent in ledger.parents_of(history) {
            let mut first_by_key: HashMap<String, ExpressionId> = HashMap::new();
            for id in ledger.expressions_in(parent).to_vec() {
                let key = ledger.expression(id).expression.clone();
                let first = match first_by_key.get(&key).copied() {
                    Some(first) => first,
                    None => {
                        first_by_key.insert(key, id);
                        continue;
                    }
                };
                let path = ledger.path_of(id);
                let scene = ledger.scene_title(parent).to_string();
                ledger.merge_into(first, id);

                log::info!("Merged duplicate '{}' in scene '{}'", key, scene);
                warnings.push(ValidationIssue::new(
                    IssueKind::Merged,
                    &file,
                    path,
                    format!("merged duplicate '{}' into the first entry of scene '{}'", key, scene),
                ));
            }
        }

        if ledger.history(history).metadata.is_flashcard() {
            continue;
        }
        for (key, ids) in ledger.group_by_key(history) {
            let Some((&first, rest)) = ids.split_first() else {
                continue;
            };
            let into = ledger.scene_title(ledger.parent_of(first)).to_string();
            for &id in rest {
                let path = ledger.path_of(id);
                let from = ledger.scene_title(ledger.parent_of(id)).to_string();
                ledger.merge_into(first, id);

                log::info!("Merged '{}' from scene '{}' into '{}'", key, from, into);
                warnings.push(ValidationIssue::new(
                    IssueKind::Merged,
                    &file,
                    path,
                    format!("merged '{}' from scene '{}' into scene '{}'", key, from, into),
                ));
            }
        }
    }
}

fn prune_orphans(ledger: &mut Ledger, index: &CorpusIndex, warnings: &mut Vec<ValidationIssue>) {
    for id in ledger.expression_ids() {
        let expression = ledger.expression(id);
        if expression.has_records() || index.contains(&expression.expression) {
            continue;
        }
        let key = expression.expression.clone();
        let history = ledger.history_of(ledger.parent_of(id));
        let file = ledger_file_name(ledger, history);
        let path = ledger.path_of(id);
        ledger.detach_expression(id);

        log::info!("Pruned orphan '{}'", key);
        warnings.push(ValidationIssue::new(
            IssueKind::Pruned,
            file,
            path,
            format!("removed '{}': no records and not in any notebook", key),
        ));
    }
}

/// History for a note's unit, created in the series file when missing
fn history_for(ledger: &mut Ledger, note: &NoteLocation) -> HistoryId {
    if let Some(history) = ledger.find_history(&note.unit_title) {
        return history;
    }
    let mut name = series_file_name(&note.series_name);
    if name.is_empty() {
        name = note.notebook_id.clone();
    }
    let file = ledger.find_or_add_file(&name);
    ledger.create_history(
        file,
        &note.notebook_id,
        &note.unit_title,
        note.kind == NotebookKind::Flashcard,
    )
}

fn backfill(ledger: &mut Ledger, index: &CorpusIndex, warnings: &mut Vec<ValidationIssue>) {
    let mut coverage = Coverage::build(ledger);
    for note in index.notes() {
        if note.not_used || note.key.surface().trim().is_empty() {
            continue;
        }
        if coverage.covers(&note.unit_title, &note.key) {
            continue;
        }

        let history = history_for(ledger, note);
        let parent = if ledger.history(history).metadata.is_flashcard() {
            ExpressionParent::Deck(history)
        } else {
            ExpressionParent::Scene(ledger.find_or_add_scene(history, &note.scene_title))
        };
        let key = note.key.preferred();
        let id = ledger.add_expression(parent, LearningExpression::new(key));
        coverage.insert(&note.unit_title, key);

        log::info!("Backfilled '{}' for {}", key, note.describe());
        warnings.push(ValidationIssue::new(
            IssueKind::Backfilled,
            ledger_file_name(ledger, history),
            ledger.path_of(id),
            format!("added '{}' for {}", key, note.describe()),
        ));
    }
}
