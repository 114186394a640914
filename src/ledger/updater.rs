//! Find-or-create updates of the ledger from quiz outcomes
//!
//! Three modes are kept side by side:
//! - [`UpdateMode::Quality`] writes graded records with factor and interval
//! - [`UpdateMode::OnStatusChange`] (legacy) skips a record whose status
//!   matches the latest one
//! - [`UpdateMode::Always`] (legacy) skips only a repeated `misunderstood`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::arena::{ExpressionId, ExpressionParent, Ledger};
use super::models::{
    LearnStatus, LearningExpression, LearningRecord, QuizDirection, QuizType,
    DEFAULT_EASINESS_FACTOR, FLASHCARD_UNIT_TITLE,
};
use crate::scheduler::algorithm::{
    calculate_next_interval, correct_streak, update_difficulty_factor,
};

/// How a quiz outcome is turned into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    #[default]
    Quality,
    OnStatusChange,
    Always,
}

/// One answered quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    /// Notebook the unit belongs to; names the ledger file for new histories
    pub notebook_id: String,
    pub unit_title: String,
    /// Empty for flashcard decks
    pub scene_title: String,
    /// Canonical key of the note (base form when the note has one)
    pub expression: String,
    pub is_correct: bool,
    /// The learner already knew the word before this quiz
    pub is_known_word: bool,
    pub quality: i32,
    pub response_time_ms: i64,
    pub quiz_type: QuizType,
    pub direction: QuizDirection,
}

impl QuizOutcome {
    /// Whether a brand-new history for this outcome uses the flat layout
    fn wants_flashcard_layout(&self) -> bool {
        self.unit_title == FLASHCARD_UNIT_TITLE && self.scene_title.is_empty()
    }
}

/// Status recorded for an answer
pub fn classify_status(is_correct: bool, is_known_word: bool) -> LearnStatus {
    match (is_correct, is_known_word) {
        (true, true) => LearnStatus::Understood,
        (true, false) => LearnStatus::Usable,
        (false, _) => LearnStatus::Misunderstood,
    }
}

impl LearningExpression {
    /// Prepend a graded record, updating the stream's factor and interval
    pub fn add_record_with_quality(
        &mut self,
        status: LearnStatus,
        quality: i32,
        response_time_ms: i64,
        quiz_type: QuizType,
        direction: QuizDirection,
        now: DateTime<Utc>,
    ) -> &LearningRecord {
        let logs = self.logs(direction);
        let prior_streak = correct_streak(logs.as_slice());
        let last_interval = logs.latest().map_or(0, |r| r.interval_days);

        let stored_factor = match direction {
            QuizDirection::Forward => self.easiness_factor,
            QuizDirection::Reverse => self.reverse_easiness_factor,
        };
        let factor = update_difficulty_factor(stored_factor, quality, prior_streak);
        let interval = calculate_next_interval(last_interval, factor, quality, prior_streak);

        self.set_easiness(direction, factor);
        let logs = self.logs_mut(direction);
        logs.prepend(LearningRecord {
            status,
            learned_at: Some(now),
            quality,
            response_time_ms,
            quiz_type,
            interval_days: interval,
        });
        &logs.as_slice()[0]
    }
}

/// Find the container for an outcome without creating anything
fn locate(ledger: &Ledger, outcome: &QuizOutcome) -> Option<ExpressionParent> {
    let history = ledger.find_history(&outcome.unit_title)?;
    if ledger.history(history).metadata.is_flashcard() {
        return Some(ExpressionParent::Deck(history));
    }
    ledger
        .find_scene(history, &outcome.scene_title)
        .map(ExpressionParent::Scene)
}

/// Find or create the history (and scene) for an outcome
fn locate_or_create(ledger: &mut Ledger, outcome: &QuizOutcome) -> ExpressionParent {
    let history = match ledger.find_history(&outcome.unit_title) {
        Some(history) => history,
        None => {
            let file = ledger.find_or_add_file(&outcome.notebook_id);
            log::debug!(
                "Creating history '{}' in ledger file '{}'",
                outcome.unit_title,
                outcome.notebook_id
            );
            ledger.create_history(
                file,
                &outcome.notebook_id,
                &outcome.unit_title,
                outcome.wants_flashcard_layout(),
            )
        }
    };

    if ledger.history(history).metadata.is_flashcard() {
        ExpressionParent::Deck(history)
    } else {
        ExpressionParent::Scene(ledger.find_or_add_scene(history, &outcome.scene_title))
    }
}

fn find_expression(ledger: &Ledger, outcome: &QuizOutcome) -> Option<ExpressionId> {
    let parent = locate(ledger, outcome)?;
    ledger.find_expression(parent, &outcome.expression)
}

/// Record a graded outcome; returns `true` when the expression already existed
pub fn update_or_create(ledger: &mut Ledger, outcome: &QuizOutcome, now: DateTime<Utc>) -> bool {
    let status = classify_status(outcome.is_correct, outcome.is_known_word);
    let quality = outcome.quality.clamp(0, 5);

    if let Some(id) = find_expression(ledger, outcome) {
        ledger.expression_mut(id).add_record_with_quality(
            status,
            quality,
            outcome.response_time_ms,
            outcome.quiz_type.clone(),
            outcome.direction,
            now,
        );
        return true;
    }

    let parent = locate_or_create(ledger, outcome);
    let mut expression = LearningExpression::new(outcome.expression.clone());
    expression.set_easiness(outcome.direction, DEFAULT_EASINESS_FACTOR);
    expression.add_record_with_quality(
        status,
        quality,
        outcome.response_time_ms,
        outcome.quiz_type.clone(),
        outcome.direction,
        now,
    );
    ledger.add_expression(parent, expression);
    false
}

/// Legacy mode: write a plain record only when the status changes
pub fn update_or_create_on_status_change(
    ledger: &mut Ledger,
    outcome: &QuizOutcome,
    now: DateTime<Utc>,
) -> bool {
    let status = classify_status(outcome.is_correct, outcome.is_known_word);
    update_or_create_plain(ledger, outcome, now, |latest| latest == Some(&status), status.clone())
}

/// Legacy mode: always write a plain record, except a repeated `misunderstood`
pub fn update_or_create_always(
    ledger: &mut Ledger,
    outcome: &QuizOutcome,
    now: DateTime<Utc>,
) -> bool {
    let status = classify_status(outcome.is_correct, outcome.is_known_word);
    let is_miss = status == LearnStatus::Misunderstood;
    update_or_create_plain(
        ledger,
        outcome,
        now,
        |latest| is_miss && latest == Some(&LearnStatus::Misunderstood),
        status,
    )
}

fn update_or_create_plain<F>(
    ledger: &mut Ledger,
    outcome: &QuizOutcome,
    now: DateTime<Utc>,
    skip: F,
    status: LearnStatus,
) -> bool
where
    F: Fn(Option<&LearnStatus>) -> bool,
{
    if let Some(id) = find_expression(ledger, outcome) {
        let logs = ledger.expression_mut(id).logs_mut(outcome.direction);
        if skip(logs.latest().map(|r| &r.status)) {
            log::debug!("Skipping unchanged status for '{}'", outcome.expression);
        } else {
            logs.prepend(LearningRecord::new(status, now));
        }
        return true;
    }

    let parent = locate_or_create(ledger, outcome);
    let mut expression = LearningExpression::new(outcome.expression.clone());
    expression
        .logs_mut(outcome.direction)
        .prepend(LearningRecord::new(status, now));
    ledger.add_expression(parent, expression);
    false
}

/// Apply an outcome with the given mode
pub fn apply(ledger: &mut Ledger, outcome: &QuizOutcome, mode: UpdateMode, now: DateTime<Utc>) -> bool {
    match mode {
        UpdateMode::Quality => update_or_create(ledger, outcome, now),
        UpdateMode::OnStatusChange => update_or_create_on_status_change(ledger, outcome, now),
        UpdateMode::Always => update_or_create_always(ledger, outcome, now),
    }
}
