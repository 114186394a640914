//! Read-only cross-check of the ledger against the corpus
//!
//! The validator never mutates either side and never stops at the first
//! finding; every issue lands in one bucket of the returned report.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::report::{IssueKind, ValidationIssue, ValidationReport};
use super::{ledger_file_name, Coverage};
use crate::corpus::{Corpus, CorpusIndex, DictionaryCache, NotebookKind};
use crate::ledger::{Ledger, QuizDirection, RecordLog};

static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(.*?)\s*\}\}").expect("highlight pattern is valid"));

const KNOWN_STATUSES: &str = "learning, misunderstood, understood, usable, intuitive";

/// Whether a content line mentions an expression, with or without `{{ }}` markup
pub fn line_mentions(line: &str, expression: &str) -> bool {
    let needle = expression.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    HIGHLIGHT_RE
        .replace_all(line, "$1")
        .to_lowercase()
        .contains(&needle)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Also flag two records of one stream on the same calendar date
    pub check_duplicate_dates: bool,
}

pub struct Validator<'a> {
    corpus: &'a Corpus,
    index: CorpusIndex,
    dictionary: &'a dyn DictionaryCache,
    options: ValidatorOptions,
}

impl<'a> Validator<'a> {
    pub fn new(corpus: &'a Corpus, dictionary: &'a dyn DictionaryCache) -> Self {
        Self {
            corpus,
            index: corpus.index(),
            dictionary,
            options: ValidatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self, ledger: &Ledger) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check_structure(ledger, &mut report);
        self.check_references(ledger, &mut report);
        self.check_multiple_scenes(ledger, &mut report);
        self.check_coverage(ledger, &mut report);
        self.check_corpus(&mut report);
        log::debug!(
            "Validation found {} errors and {} warnings",
            report.error_count(),
            report.warnings.len()
        );
        report
    }

    fn check_structure(&self, ledger: &Ledger, report: &mut ValidationReport) {
        for history in ledger.history_ids() {
            let file = ledger_file_name(ledger, history);
            for parent in ledger.parents_of(history) {
                let mut seen: HashMap<&str, usize> = HashMap::new();
                for (position, &id) in ledger.expressions_in(parent).iter().enumerate() {
                    let expression = ledger.expression(id);
                    let path = ledger.path_of(id);

                    if expression.expression.trim().is_empty() {
                        report.structure_errors.push(ValidationIssue::new(
                            IssueKind::EmptyExpression,
                            &file,
                            &path,
                            "expression key is empty",
                        ));
                    } else {
                        match seen.entry(expression.expression.as_str()) {
                            Entry::Occupied(first) => {
                                let scene = ledger.scene_title(parent);
                                report.structure_errors.push(
                                    ValidationIssue::new(
                                        IssueKind::DuplicateExpression,
                                        &file,
                                        &path,
                                        format!(
                                            "duplicate expression '{}' at indices {} and {} of scene '{}'",
                                            expression.expression,
                                            first.get(),
                                            position,
                                            scene
                                        ),
                                    )
                                    .with_suggestion("run fix to merge the entries"),
                                );
                            }
                            Entry::Vacant(slot) => {
                                slot.insert(position);
                            }
                        }
                    }

                    for direction in [QuizDirection::Forward, QuizDirection::Reverse] {
                        self.check_stream(expression.logs(direction), direction, &file, &path, report);
                    }
                }
            }
        }
    }

    fn check_stream(
        &self,
        logs: &RecordLog,
        direction: QuizDirection,
        file: &str,
        path: &str,
        report: &mut ValidationReport,
    ) {
        let field = match direction {
            QuizDirection::Forward => "learned_logs",
            QuizDirection::Reverse => "reverse_logs",
        };

        for (i, record) in logs.iter().enumerate() {
            let location = format!("{}.{}[{}]", path, field, i);
            if !record.status.is_known() {
                report.structure_errors.push(
                    ValidationIssue::new(
                        IssueKind::UnknownStatus,
                        file,
                        &location,
                        format!("unknown status '{}'", record.status),
                    )
                    .with_suggestion(format!("use one of: {}", KNOWN_STATUSES)),
                );
            }
            if record.learned_at.is_none() {
                report.structure_errors.push(ValidationIssue::new(
                    IssueKind::MissingTimestamp,
                    file,
                    &location,
                    "record has no learned_at timestamp",
                ));
            }
        }

        if !logs.is_newest_first() {
            report.structure_errors.push(
                ValidationIssue::new(
                    IssueKind::OutOfOrder,
                    file,
                    format!("{}.{}", path, field),
                    "records are not ordered newest first",
                )
                .with_suggestion("reorder the records by learned_at, latest first"),
            );
        }

        if self.options.check_duplicate_dates {
            let mut dates = HashSet::new();
            for (i, record) in logs.iter().enumerate() {
                let Some(at) = record.learned_at else { continue };
                if !dates.insert(at.date_naive()) {
                    report.structure_errors.push(ValidationIssue::new(
                        IssueKind::DuplicateDate,
                        file,
                        format!("{}.{}[{}]", path, field, i),
                        format!("another record already exists on {}", at.date_naive()),
                    ));
                }
            }
        }
    }

    fn check_references(&self, ledger: &Ledger, report: &mut ValidationReport) {
        for id in ledger.expression_ids() {
            let key = &ledger.expression(id).expression;
            if key.trim().is_empty() {
                continue;
            }
            let parent = ledger.parent_of(id);
            let history = ledger.history_of(parent);
            let unit = &ledger.history(history).metadata.title;
            let scene = ledger.scene_title(parent);
            let file = ledger_file_name(ledger, history);
            let path = ledger.path_of(id);

            if !self.index.contains(key) {
                report.consistency_errors.push(
                    ValidationIssue::new(
                        IssueKind::Orphaned,
                        &file,
                        &path,
                        format!("orphaned learning note: '{}' is not in any notebook", key),
                    )
                    .with_suggestion("add a note for it or delete the entry"),
                );
                continue;
            }

            if !self.index.scene_contains(unit, scene, key) {
                let locations = self.index.locations(key);
                let found: Vec<String> = locations.iter().map(|loc| loc.describe()).collect();
                let here = if scene.is_empty() {
                    format!("'{}'", unit)
                } else {
                    format!("'{}' / '{}'", unit, scene)
                };
                let mut issue = ValidationIssue::new(
                    IssueKind::WrongScene,
                    &file,
                    &path,
                    format!(
                        "'{}' is recorded under {} but was found in {}",
                        key,
                        here,
                        found.join(", ")
                    ),
                );
                if locations.iter().any(|loc| loc.unit_title == *unit) {
                    issue = issue.with_suggestion("run fix to move it");
                }
                report.consistency_errors.push(issue);
            }
        }
    }

    fn check_multiple_scenes(&self, ledger: &Ledger, report: &mut ValidationReport) {
        for history in ledger.history_ids() {
            if ledger.history(history).metadata.is_flashcard() {
                continue;
            }
            let file = ledger_file_name(ledger, history);
            for (key, ids) in ledger.group_by_key(history) {
                if key.trim().is_empty() {
                    continue;
                }
                let mut scenes: Vec<&str> = Vec::new();
                for &id in &ids {
                    let title = ledger.scene_title(ledger.parent_of(id));
                    if !scenes.contains(&title) {
                        scenes.push(title);
                    }
                }
                if scenes.len() > 1 {
                    let quoted: Vec<String> = scenes.iter().map(|s| format!("'{}'", s)).collect();
                    report.consistency_errors.push(
                        ValidationIssue::new(
                            IssueKind::MultipleScenes,
                            &file,
                            ledger.path_of(ids[0]),
                            format!("'{}' appears in multiple scenes: {}", key, quoted.join(", ")),
                        )
                        .with_suggestion("run fix to merge them into the first scene"),
                    );
                }
            }
        }
    }

    fn check_coverage(&self, ledger: &Ledger, report: &mut ValidationReport) {
        let coverage = Coverage::build(ledger);
        for note in self.index.notes() {
            if note.not_used || note.key.surface().trim().is_empty() {
                continue;
            }
            if !coverage.covers(&note.unit_title, &note.key) {
                report.warnings.push(
                    ValidationIssue::new(
                        IssueKind::MissingCoverage,
                        note.file.display().to_string(),
                        note.describe(),
                        format!("no learning history for '{}' in {}", note.key, note.describe()),
                    )
                    .with_suggestion("run fix to add an empty entry"),
                );
            }
        }
    }

    fn check_corpus(&self, report: &mut ValidationReport) {
        for unit in self.corpus.units() {
            let file = unit.file.display().to_string();
            for scene in &unit.scenes {
                for note in scene.notes {
                    let location = if scene.title.is_empty() {
                        format!("{} / {}", unit.title, note.expression)
                    } else {
                        format!("{} / {} / {}", unit.title, scene.title, note.expression)
                    };

                    if unit.kind == NotebookKind::Story
                        && !note.not_used
                        && !scene.lines.iter().any(|line| line_mentions(line, &note.expression))
                    {
                        report.consistency_errors.push(
                            ValidationIssue::new(
                                IssueKind::MissingInConversation,
                                &file,
                                &location,
                                format!(
                                    "'{}' does not appear in any line of scene '{}'",
                                    note.expression, scene.title
                                ),
                            )
                            .with_suggestion("fix the expression or mark the note not_used"),
                        );
                    }

                    if note.dictionary_number > 0 && !self.dictionary.contains(note.dictionary_word()) {
                        report.consistency_errors.push(
                            ValidationIssue::new(
                                IssueKind::InvalidDictionaryReference,
                                &file,
                                &location,
                                format!(
                                    "dictionary_number {} has no cached entry for '{}'",
                                    note.dictionary_number,
                                    note.dictionary_word()
                                ),
                            )
                            .with_suggestion("run fix to clear the reference"),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::testing::{flashcard_corpus, story_corpus};
    use crate::corpus::StaticDictionaryCache;
    use crate::ledger::{ExpressionParent, LearnStatus, LearningExpression, LearningRecord};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
    }

    fn reviewed(key: &str, day: u32) -> LearningExpression {
        let mut expression = LearningExpression::new(key);
        expression
            .learned_logs
            .prepend(LearningRecord::new(LearnStatus::Understood, at(day)));
        expression
    }

    /// A ledger with one story history holding `(scene, expressions)`
    fn story_ledger(unit: &str, scenes: Vec<(&str, Vec<LearningExpression>)>) -> Ledger {
        let mut ledger = Ledger::new();
        let file = ledger.add_file("friends".to_string());
        let history = ledger.create_history(file, "friends", unit, false);
        for (title, expressions) in scenes {
            let scene = ledger.add_scene(history, title.to_string());
            for expression in expressions {
                ledger.add_expression(ExpressionParent::Scene(scene), expression);
            }
        }
        ledger
    }

    fn validate(corpus: &Corpus, ledger: &Ledger) -> ValidationReport {
        let dictionary = StaticDictionaryCache::default();
        Validator::new(corpus, &dictionary).validate(ledger)
    }

    #[test]
    fn test_line_mentions_ignores_markup_and_case() {
        assert!(line_mentions("We were on a {{ break }}!", "break"));
        assert!(line_mentions("We were on a {{break}}!", "break"));
        assert!(line_mentions("I'm going to Break Up with her", "break up"));
        assert!(!line_mentions("Nothing here", "break"));
    }

    #[test]
    fn test_consistent_ledger_is_clean() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let ledger = story_ledger("Episode 1", vec![("Cafe", vec![reviewed("hello", 1)])]);
        assert!(validate(&corpus, &ledger).is_clean());
    }

    #[test]
    fn test_nonexistent_expression_is_one_orphan() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let ledger = story_ledger(
            "Episode 1",
            vec![("Cafe", vec![reviewed("hello", 1), reviewed("nonexistent", 2)])],
        );

        let report = validate(&corpus, &ledger);
        let orphans = report.of_kind(IssueKind::Orphaned);
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].message.contains("orphaned learning note"));
        assert_eq!(orphans[0].location, "[0].scenes[0].expressions[1]");
        assert_eq!(report.error_count(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_wrong_scene_cites_found_location() {
        let corpus = story_corpus(&[
            ("Episode 1", "Cafe", &[("hello", "")]),
            ("Episode 1", "Kitchen", &[("roommate", "")]),
        ]);
        let ledger = story_ledger(
            "Episode 1",
            vec![("Cafe", vec![reviewed("hello", 1), reviewed("roommate", 2)])],
        );

        let report = validate(&corpus, &ledger);
        let wrong = report.of_kind(IssueKind::WrongScene);
        assert_eq!(wrong.len(), 1);
        assert!(wrong[0].message.contains("'Episode 1' / 'Kitchen'"));
        assert_eq!(wrong[0].suggestions, vec!["run fix to move it".to_string()]);
    }

    #[test]
    fn test_base_form_matches_scene() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("ran", "run")])]);
        let ledger = story_ledger("Episode 1", vec![("Cafe", vec![reviewed("run", 1)])]);
        assert!(!validate(&corpus, &ledger).has_errors());
    }

    #[test]
    fn test_same_key_in_two_scenes() {
        let corpus = story_corpus(&[
            ("Episode 1", "Clinic", &[("ovulate", "")]),
            ("Episode 1", "Apartment", &[("ovulate", "")]),
        ]);
        let ledger = story_ledger(
            "Episode 1",
            vec![
                ("Clinic", vec![reviewed("ovulate", 1)]),
                ("Apartment", vec![reviewed("ovulate", 4)]),
            ],
        );

        let report = validate(&corpus, &ledger);
        let multiple = report.of_kind(IssueKind::MultipleScenes);
        assert_eq!(multiple.len(), 1);
        assert!(multiple[0].message.contains("appears in multiple scenes"));
        assert!(multiple[0].message.contains("'Clinic', 'Apartment'"));
    }

    #[test]
    fn test_duplicate_in_scene_reports_both_indices() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let ledger = story_ledger(
            "Episode 1",
            vec![("Cafe", vec![reviewed("hello", 1), reviewed("hello", 2)])],
        );

        let report = validate(&corpus, &ledger);
        let duplicates = report.of_kind(IssueKind::DuplicateExpression);
        assert_eq!(duplicates.len(), 1);
        assert!(duplicates[0].message.contains("indices 0 and 1"));
    }

    #[test]
    fn test_structural_record_problems() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let mut expression = LearningExpression::new("hello");
        let mut odd = LearningRecord::new(LearnStatus::Unknown("memorised".to_string()), at(1));
        odd.learned_at = None;
        expression.learned_logs.prepend(odd);
        let ledger = story_ledger(
            "Episode 1",
            vec![("Cafe", vec![expression, LearningExpression::new("")])],
        );

        let report = validate(&corpus, &ledger);
        assert_eq!(report.of_kind(IssueKind::UnknownStatus).len(), 1);
        assert_eq!(report.of_kind(IssueKind::MissingTimestamp).len(), 1);
        assert_eq!(report.of_kind(IssueKind::EmptyExpression).len(), 1);
        assert_eq!(
            report.of_kind(IssueKind::MissingTimestamp)[0].location,
            "[0].scenes[0].expressions[0].learned_logs[0]"
        );
    }

    #[test]
    fn test_out_of_order_stream_is_structural() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let mut ledger = story_ledger("Episode 1", vec![("Cafe", vec![reviewed("hello", 1)])]);
        let id = ledger.expression_ids()[0];
        let yaml = "- status: understood\n  learned_at: 2025-03-01T09:00:00Z\n- status: usable\n  learned_at: 2025-03-05T09:00:00Z\n";
        ledger.expression_mut(id).learned_logs = serde_yaml::from_str::<RecordLog>(yaml).unwrap();

        let report = validate(&corpus, &ledger);
        assert_eq!(report.of_kind(IssueKind::OutOfOrder).len(), 1);
    }

    #[test]
    fn test_duplicate_dates_are_opt_in() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        let mut expression = reviewed("hello", 1);
        expression
            .learned_logs
            .prepend(LearningRecord::new(LearnStatus::Usable, at(1) + chrono::Duration::hours(3)));
        let ledger = story_ledger("Episode 1", vec![("Cafe", vec![expression])]);
        let dictionary = StaticDictionaryCache::default();

        let default_report = Validator::new(&corpus, &dictionary).validate(&ledger);
        assert!(default_report.of_kind(IssueKind::DuplicateDate).is_empty());

        let strict = Validator::new(&corpus, &dictionary)
            .with_options(ValidatorOptions { check_duplicate_dates: true })
            .validate(&ledger);
        assert_eq!(strict.of_kind(IssueKind::DuplicateDate).len(), 1);
    }

    #[test]
    fn test_missing_coverage_is_a_warning() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", ""), ("break up", "")])]);
        let ledger = story_ledger("Episode 1", vec![("Cafe", vec![reviewed("hello", 1)])]);

        let report = validate(&corpus, &ledger);
        assert!(!report.has_errors());
        let missing = report.of_kind(IssueKind::MissingCoverage);
        assert_eq!(missing.len(), 1);
        assert!(missing[0].message.contains("'break up'"));
    }

    #[test]
    fn test_corpus_side_checks() {
        let mut corpus = story_corpus(&[("Episode 1", "Cafe", &[("hello", "")])]);
        corpus.for_each_note_mut(|_, note| {
            note.dictionary_number = 1;
            false
        });
        if let crate::corpus::NotebookIndex::Story(story) = &mut corpus.notebooks[0] {
            story.files[0].notebooks[0].scenes[0].conversations[0].quote = "Hi there".to_string();
        }
        let ledger = story_ledger("Episode 1", vec![("Cafe", vec![reviewed("hello", 1)])]);

        let report = validate(&corpus, &ledger);
        assert_eq!(report.of_kind(IssueKind::MissingInConversation).len(), 1);
        assert_eq!(report.of_kind(IssueKind::InvalidDictionaryReference).len(), 1);

        let dictionary = StaticDictionaryCache::new(["hello"]);
        let cached = Validator::new(&corpus, &dictionary).validate(&ledger);
        assert!(cached.of_kind(IssueKind::InvalidDictionaryReference).is_empty());
    }

    #[test]
    fn test_flashcard_notes_skip_conversation_check() {
        let corpus = flashcard_corpus("flashcards", &["serendipity"]);
        let mut ledger = Ledger::new();
        let file = ledger.add_file("vocabulary".to_string());
        let deck = ledger.create_history(file, "vocabulary", "flashcards", true);
        ledger.add_expression(ExpressionParent::Deck(deck), reviewed("serendipity", 1));

        assert!(validate(&corpus, &ledger).is_clean());
    }
}
