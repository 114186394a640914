//! Review gate: decides whether an expression is due for a quiz
//!
//! Every predicate has the same shape on one stream:
//! 1. no records means due;
//! 2. a latest `misunderstood` means due;
//! 3. otherwise due once the days since the latest review reach the
//!    stored interval, or the correct-count threshold for legacy records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{correct_streak, threshold_days_from_correct_count};
use crate::ledger::{LearnStatus, LearningExpression, QuizDirection, RecordLog};

/// Kind of content a quiz draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Story,
    Flashcard,
    Freeform,
}

/// Threshold in days the latest record must age past
pub fn review_threshold_days(logs: &RecordLog) -> i64 {
    match logs.latest() {
        Some(latest) if latest.interval_days > 0 => latest.interval_days as i64,
        _ => threshold_days_from_correct_count(correct_streak(logs.as_slice())),
    }
}

/// Shared predicate over one stream
pub fn is_stream_due(logs: &RecordLog, now: DateTime<Utc>) -> bool {
    let Some(latest) = logs.latest() else {
        return true;
    };
    if latest.status == LearnStatus::Misunderstood {
        return true;
    }
    let Some(learned_at) = latest.learned_at else {
        return true;
    };

    let elapsed_days = (now - learned_at).num_days();
    elapsed_days >= review_threshold_days(logs)
}

/// Forward quiz over story notebooks
pub fn needs_story_review(expression: &LearningExpression, now: DateTime<Utc>) -> bool {
    is_stream_due(&expression.learned_logs, now)
}

/// Forward quiz over flashcard decks
pub fn needs_flashcard_review(expression: &LearningExpression, now: DateTime<Utc>) -> bool {
    is_stream_due(&expression.learned_logs, now)
}

/// Forward quiz where the learner supplies the word
pub fn needs_freeform_review(expression: &LearningExpression, now: DateTime<Utc>) -> bool {
    is_stream_due(&expression.learned_logs, now)
}

/// Reverse quiz; only words with a forward success are eligible
pub fn needs_reverse_review(expression: &LearningExpression, now: DateTime<Utc>) -> bool {
    if !expression.learned_logs.has_success() {
        return false;
    }
    is_stream_due(&expression.reverse_logs, now)
}

/// Dispatch on quiz direction and content kind
pub fn is_due(
    expression: &LearningExpression,
    direction: QuizDirection,
    kind: ContentKind,
    now: DateTime<Utc>,
) -> bool {
    match (direction, kind) {
        (QuizDirection::Reverse, _) => needs_reverse_review(expression, now),
        (QuizDirection::Forward, ContentKind::Story) => needs_story_review(expression, now),
        (QuizDirection::Forward, ContentKind::Flashcard) => needs_flashcard_review(expression, now),
        (QuizDirection::Forward, ContentKind::Freeform) => needs_freeform_review(expression, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LearningRecord;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap()
    }

    fn expression_with(records: Vec<LearningRecord>) -> LearningExpression {
        let mut expression = LearningExpression::new("hello");
        expression.learned_logs = records.into();
        expression
    }

    #[test]
    fn test_no_records_is_due() {
        let expression = LearningExpression::new("hello");
        assert!(needs_story_review(&expression, now()));
    }

    #[test]
    fn test_legacy_record_uses_threshold_table() {
        let four_days_ago = expression_with(vec![LearningRecord::new(
            LearnStatus::Understood,
            now() - Duration::days(4),
        )]);
        assert!(needs_story_review(&four_days_ago, now()));

        let two_days_ago = expression_with(vec![LearningRecord::new(
            LearnStatus::Understood,
            now() - Duration::days(2),
        )]);
        assert!(!needs_story_review(&two_days_ago, now()));
    }

    #[test]
    fn test_stored_interval_wins_over_table() {
        let mut record = LearningRecord::new(LearnStatus::Understood, now() - Duration::days(4));
        record.quality = 4;
        record.interval_days = 6;
        let expression = expression_with(vec![record]);

        assert_eq!(review_threshold_days(&expression.learned_logs), 6);
        assert!(!needs_flashcard_review(&expression, now()));
        assert!(needs_flashcard_review(&expression, now() + Duration::days(2)));
    }

    #[test]
    fn test_latest_misunderstood_is_due() {
        let expression = expression_with(vec![LearningRecord::new(
            LearnStatus::Misunderstood,
            now() - Duration::hours(1),
        )]);
        assert!(needs_freeform_review(&expression, now()));
    }

    #[test]
    fn test_reverse_requires_forward_success() {
        let mut expression = expression_with(vec![LearningRecord::new(
            LearnStatus::Misunderstood,
            now() - Duration::days(10),
        )]);
        assert!(!needs_reverse_review(&expression, now()));

        expression.learned_logs.prepend(LearningRecord::new(
            LearnStatus::Understood,
            now() - Duration::days(1),
        ));
        assert!(needs_reverse_review(&expression, now()));
        assert!(is_due(&expression, QuizDirection::Reverse, ContentKind::Story, now()));
    }
}
