//! SM-2 spaced repetition with asymmetric lapse penalties
//!
//! A variant of the SuperMemo 2 algorithm where a single miss on a
//! well-learned expression costs less than a miss on a fresh one.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation

use crate::ledger::{LearningRecord, DEFAULT_EASINESS_FACTOR, MIN_EASINESS_FACTOR};

/// Lowest quality that counts as a correct answer
pub const PASSING_QUALITY: i32 = 3;

/// Interval assumed when legacy data has no stored interval
const LEGACY_LAST_INTERVAL: i32 = 6;

/// Review thresholds indexed by correct count (1-based)
const THRESHOLD_DAYS: [i64; 12] = [3, 7, 14, 30, 60, 90, 180, 270, 365, 540, 730, 1095];

/// Threshold beyond the table, never reached in practice
pub const UNBOUNDED_THRESHOLD_DAYS: i64 = i64::MAX;

/// Scale applied to the factor delta of a miss, by prior streak
fn lapse_damping(prior_correct_streak: usize) -> f64 {
    match prior_correct_streak {
        s if s >= 10 => 0.37,
        s if s >= 6 => 0.56,
        s if s >= 3 => 0.74,
        _ => 1.0,
    }
}

/// Fraction of the last interval kept after a miss, by prior streak
fn lapse_retention(prior_correct_streak: usize) -> f64 {
    match prior_correct_streak {
        s if s >= 10 => 0.7,
        s if s >= 6 => 0.6,
        _ => 0.5,
    }
}

/// Unscaled SM-2 delta: `0.1 - (5-q) * (0.08 + (5-q) * 0.02)`
pub fn base_factor_delta(quality: i32) -> f64 {
    let d = (5 - quality) as f64;
    0.1 - d * (0.08 + d * 0.02)
}

/// Calculate the updated difficulty (easiness) factor
///
/// # Arguments
/// * `factor` - Current factor, 0 meaning unset
/// * `quality` - Quality rating (0-5), already clamped by the caller
/// * `prior_correct_streak` - Correct answers in a row before this review
pub fn update_difficulty_factor(factor: f64, quality: i32, prior_correct_streak: usize) -> f64 {
    let factor = if factor == 0.0 {
        DEFAULT_EASINESS_FACTOR
    } else {
        factor
    };

    let mut delta = base_factor_delta(quality);
    if quality < PASSING_QUALITY && prior_correct_streak > 2 {
        delta *= lapse_damping(prior_correct_streak);
    }

    (factor + delta).max(MIN_EASINESS_FACTOR)
}

/// Calculate the interval in days until the next review
///
/// # Arguments
/// * `last_interval` - Interval stored on the previous record, 0 if none
/// * `factor` - Factor to grow the interval by
/// * `quality` - Quality rating (0-5)
/// * `correct_streak` - Correct answers in a row before this review
pub fn calculate_next_interval(
    last_interval: i32,
    factor: f64,
    quality: i32,
    correct_streak: usize,
) -> i32 {
    if quality < PASSING_QUALITY {
        if correct_streak <= 2 {
            return 1;
        }
        let shrunk = (last_interval as f64 * lapse_retention(correct_streak)).round() as i32;
        return shrunk.max(1);
    }

    match correct_streak {
        0 => 1,
        1 => 6,
        _ => {
            let last = if last_interval > 0 {
                last_interval
            } else {
                LEGACY_LAST_INTERVAL
            };
            ((last as f64 * factor).ceil() as i32).max(1)
        }
    }
}

/// Count consecutive correct records from the newest backwards
pub fn correct_streak(records: &[LearningRecord]) -> usize {
    records.iter().take_while(|r| r.is_correct()).count()
}

/// Days to wait before reviewing again after `count` correct answers
pub fn threshold_days_from_correct_count(count: usize) -> i64 {
    match count {
        0 => 0,
        n if n <= THRESHOLD_DAYS.len() => THRESHOLD_DAYS[n - 1],
        _ => UNBOUNDED_THRESHOLD_DAYS,
    }
}

/// Map a raw answer outcome to an SM-2 quality when the caller has no grade
pub fn quality_from_outcome(is_correct: bool, response_time_ms: i64) -> i32 {
    if !is_correct {
        return 1;
    }
    match response_time_ms {
        t if t <= 0 => 4,
        t if t < 3_000 => 5,
        t if t < 10_000 => 4,
        _ => 3,
    }
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: i64) -> String {
    if days == 0 {
        "now".to_string()
    } else if days == UNBOUNDED_THRESHOLD_DAYS {
        "never".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LearnStatus;
    use chrono::Utc;

    fn graded(quality: i32) -> LearningRecord {
        let mut record = LearningRecord::new(LearnStatus::Understood, Utc::now());
        if quality < PASSING_QUALITY {
            record.status = LearnStatus::Misunderstood;
        }
        record.quality = quality;
        record
    }

    #[test]
    fn test_miss_with_short_streak_resets_to_one_day() {
        for quality in 0..PASSING_QUALITY {
            for streak in 0..=2 {
                assert_eq!(calculate_next_interval(40, 2.5, quality, streak), 1);
            }
        }
    }

    #[test]
    fn test_miss_with_long_streak_shrinks_interval() {
        assert_eq!(calculate_next_interval(100, 2.5, 1, 10), 70);
        assert_eq!(calculate_next_interval(100, 2.5, 1, 6), 60);
        assert_eq!(calculate_next_interval(100, 2.5, 1, 3), 50);
        assert_eq!(calculate_next_interval(1, 2.5, 1, 3), 1);
    }

    #[test]
    fn test_success_progression() {
        assert_eq!(calculate_next_interval(0, 2.5, 4, 0), 1);
        assert_eq!(calculate_next_interval(1, 2.5, 4, 1), 6);
        assert_eq!(calculate_next_interval(6, 2.5, 4, 2), 15);
        // Legacy record without interval falls back to 6 days
        assert_eq!(calculate_next_interval(0, 2.5, 4, 4), 15);
    }

    #[test]
    fn test_factor_default_and_floor() {
        assert!((update_difficulty_factor(0.0, 5, 0) - 2.6).abs() < 1e-9);
        assert!((update_difficulty_factor(2.5, 4, 0) - 2.5).abs() < 1e-9);
        assert_eq!(update_difficulty_factor(1.35, 0, 0), MIN_EASINESS_FACTOR);
    }

    #[test]
    fn test_lapse_on_long_streak_is_damped() {
        for quality in 0..PASSING_QUALITY {
            let unscaled = base_factor_delta(quality).abs();
            for streak in [10, 15, 40] {
                let delta = (update_difficulty_factor(2.5, quality, streak) - 2.5).abs();
                assert!(delta <= unscaled * 0.37 + 1e-9);
            }
        }
        let fresh = 2.5 - update_difficulty_factor(2.5, 1, 2);
        let seasoned = 2.5 - update_difficulty_factor(2.5, 1, 6);
        assert!((seasoned - fresh * 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_correct_streak_stops_at_first_miss() {
        let records = vec![graded(5), graded(4), graded(2), graded(5)];
        assert_eq!(correct_streak(&records), 2);
        assert_eq!(correct_streak(&[]), 0);
    }

    #[test]
    fn test_correct_streak_infers_legacy_records() {
        let now = Utc::now();
        let records = vec![
            LearningRecord::new(LearnStatus::Usable, now),
            LearningRecord::new(LearnStatus::Understood, now),
            LearningRecord::new(LearnStatus::Misunderstood, now),
            LearningRecord::new(LearnStatus::Understood, now),
        ];
        assert_eq!(correct_streak(&records), 2);

        let learning = vec![LearningRecord::new(LearnStatus::Learning, now)];
        assert_eq!(correct_streak(&learning), 0);
    }

    #[test]
    fn test_threshold_table() {
        let expected = [3, 7, 14, 30, 60, 90, 180, 270, 365, 540, 730, 1095];
        for (i, days) in expected.iter().enumerate() {
            assert_eq!(threshold_days_from_correct_count(i + 1), *days);
        }
        assert_eq!(threshold_days_from_correct_count(0), 0);
        assert_eq!(threshold_days_from_correct_count(13), UNBOUNDED_THRESHOLD_DAYS);
    }

    #[test]
    fn test_quality_from_outcome_uses_response_time() {
        assert_eq!(quality_from_outcome(false, 1_000), 1);
        assert_eq!(quality_from_outcome(true, 0), 4);
        assert_eq!(quality_from_outcome(true, 2_000), 5);
        assert_eq!(quality_from_outcome(true, 5_000), 4);
        assert_eq!(quality_from_outcome(true, 15_000), 3);
        assert!(quality_from_outcome(true, 15_000) >= PASSING_QUALITY);
        assert!(quality_from_outcome(false, 0) < PASSING_QUALITY);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(5), "5d");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
        assert_eq!(format_interval(UNBOUNDED_THRESHOLD_DAYS), "never");
    }
}
