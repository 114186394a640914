//! Data models for the learning ledger files
//!
//! One ledger file holds a list of histories, one per content unit:
//! ```yaml
//! - metadata:
//!     id: friends
//!     title: The One Where Monica Gets a Roommate
//!   scenes:
//!     - metadata:
//!         title: Central Perk
//!       expressions:
//!         - expression: break up
//!           learned_logs:
//!             - status: understood
//!               learned_at: 2025-01-04T09:30:00Z
//!               quality: 4
//!               interval_days: 6
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Easiness factor used when an expression has none recorded
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Smallest easiness factor the scheduler will ever produce
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

/// Unit title that routes a brand-new history to the flat flashcard layout
pub const FLASHCARD_UNIT_TITLE: &str = "flashcards";

/// Layout tag of a history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryType {
    Story,
    Flashcard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    /// Identifier of the notebook this unit belongs to
    #[serde(default)]
    pub id: String,
    /// Episode or deck title, the primary key against the corpus
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub history_type: Option<HistoryType>,
}

impl HistoryMetadata {
    pub fn is_flashcard(&self) -> bool {
        self.history_type == Some(HistoryType::Flashcard)
    }
}

/// Ledger entry for one content unit, as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningHistory {
    pub metadata: HistoryMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<LearningScene>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expressions: Vec<LearningExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningScene {
    pub metadata: SceneMetadata,
    #[serde(default)]
    pub expressions: Vec<LearningExpression>,
}

/// Which of the two record streams a quiz writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDirection {
    /// Word shown, learner recalls the meaning
    Forward,
    /// Meaning shown, learner recalls the word
    Reverse,
}

/// Learning status of a single review.
///
/// Unrecognised strings are kept verbatim so the validator can report them
/// instead of the loader rejecting the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LearnStatus {
    Learning,
    Misunderstood,
    Understood,
    Usable,
    Intuitive,
    Unknown(String),
}

impl LearnStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Learning => "",
            Self::Misunderstood => "misunderstood",
            Self::Understood => "understood",
            Self::Usable => "usable",
            Self::Intuitive => "intuitive",
            Self::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl Default for LearnStatus {
    fn default() -> Self {
        Self::Learning
    }
}

impl From<String> for LearnStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | "learning" => Self::Learning,
            "misunderstood" => Self::Misunderstood,
            "understood" => Self::Understood,
            "usable" => Self::Usable,
            "intuitive" => Self::Intuitive,
            _ => Self::Unknown(value),
        }
    }
}

impl From<LearnStatus> for String {
    fn from(value: LearnStatus) -> Self {
        match value {
            LearnStatus::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LearnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Learning => f.write_str("learning"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Kind of quiz that produced a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuizType {
    /// Records written before quiz types were tracked
    Unspecified,
    Notebook,
    Flashcard,
    Reverse,
    Freeform,
    Other(String),
}

impl QuizType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "",
            Self::Notebook => "notebook",
            Self::Flashcard => "flashcard",
            Self::Reverse => "reverse",
            Self::Freeform => "freeform",
            Self::Other(s) => s,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

impl Default for QuizType {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl From<String> for QuizType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Self::Unspecified,
            "notebook" => Self::Notebook,
            "flashcard" => Self::Flashcard,
            "reverse" => Self::Reverse,
            "freeform" => Self::Freeform,
            _ => Self::Other(value),
        }
    }
}

impl From<QuizType> for String {
    fn from(value: QuizType) -> Self {
        match value {
            QuizType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

/// One review event within a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningRecord {
    #[serde(default)]
    pub status: LearnStatus,
    /// When the review happened; `None` for legacy or zero timestamps
    #[serde(default, with = "learned_at", skip_serializing_if = "Option::is_none")]
    pub learned_at: Option<DateTime<Utc>>,
    /// SM-2 quality grade (0-5), 0 for legacy records
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub quality: i32,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub response_time_ms: i64,
    #[serde(default, skip_serializing_if = "QuizType::is_unspecified")]
    pub quiz_type: QuizType,
    /// Days until the next review, computed when this record was written
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub interval_days: i32,
}

impl LearningRecord {
    /// A record without quality or interval, as the legacy update modes write
    pub fn new(status: LearnStatus, learned_at: DateTime<Utc>) -> Self {
        Self {
            status,
            learned_at: Some(learned_at),
            quality: 0,
            response_time_ms: 0,
            quiz_type: QuizType::Unspecified,
            interval_days: 0,
        }
    }

    /// Whether this record counts as a successful recall
    pub fn is_correct(&self) -> bool {
        if self.quality > 0 {
            return self.quality >= 3;
        }
        !matches!(self.status, LearnStatus::Misunderstood | LearnStatus::Learning)
    }
}

/// Ordered stream of records, newest first.
///
/// Every insertion goes through [`RecordLog::prepend`] or
/// [`RecordLog::merge`], so `records[0]` is always the latest review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordLog(Vec<LearningRecord>);

impl RecordLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn latest(&self) -> Option<&LearningRecord> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LearningRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[LearningRecord] {
        &self.0
    }

    pub fn has_success(&self) -> bool {
        self.0.iter().any(LearningRecord::is_correct)
    }

    /// Insert a record as the newest entry.
    ///
    /// A head stamped later than the new record (clock skew, naive local
    /// times) is logged; the new record still becomes the head.
    pub fn prepend(&mut self, record: LearningRecord) {
        let head = self.latest().and_then(|r| r.learned_at);
        if let (Some(new), Some(head)) = (record.learned_at, head) {
            if new < head {
                log::warn!(
                    "Prepending a record at {} before a newer head at {}",
                    new.to_rfc3339(),
                    head.to_rfc3339()
                );
            }
        }
        self.0.insert(0, record);
    }

    /// Absorb another stream and restore newest-first order.
    ///
    /// Records without a timestamp sort last.
    pub fn merge(&mut self, other: RecordLog) {
        self.0.extend(other.0);
        self.sort_newest_first();
    }

    pub fn sort_newest_first(&mut self) {
        self.0.sort_by(|a, b| b.learned_at.cmp(&a.learned_at));
    }

    /// True when timestamps never increase from head to tail
    pub fn is_newest_first(&self) -> bool {
        self.0.windows(2).all(|w| match (w[0].learned_at, w[1].learned_at) {
            (Some(a), Some(b)) => a >= b,
            _ => true,
        })
    }
}

impl From<Vec<LearningRecord>> for RecordLog {
    fn from(mut records: Vec<LearningRecord>) -> Self {
        records.sort_by(|a, b| b.learned_at.cmp(&a.learned_at));
        Self(records)
    }
}

/// A tracked vocabulary item with its two review streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningExpression {
    pub expression: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub easiness_factor: f64,
    #[serde(default)]
    pub learned_logs: RecordLog,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub reverse_easiness_factor: f64,
    #[serde(default, skip_serializing_if = "RecordLog::is_empty")]
    pub reverse_logs: RecordLog,
}

impl LearningExpression {
    /// An expression with empty streams and unset factors
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            easiness_factor: 0.0,
            learned_logs: RecordLog::new(),
            reverse_easiness_factor: 0.0,
            reverse_logs: RecordLog::new(),
        }
    }

    pub fn logs(&self, direction: QuizDirection) -> &RecordLog {
        match direction {
            QuizDirection::Forward => &self.learned_logs,
            QuizDirection::Reverse => &self.reverse_logs,
        }
    }

    pub fn logs_mut(&mut self, direction: QuizDirection) -> &mut RecordLog {
        match direction {
            QuizDirection::Forward => &mut self.learned_logs,
            QuizDirection::Reverse => &mut self.reverse_logs,
        }
    }

    /// Stored factor for a stream, 2.5 when unset
    pub fn easiness(&self, direction: QuizDirection) -> f64 {
        let factor = match direction {
            QuizDirection::Forward => self.easiness_factor,
            QuizDirection::Reverse => self.reverse_easiness_factor,
        };
        if factor == 0.0 {
            DEFAULT_EASINESS_FACTOR
        } else {
            factor
        }
    }

    pub fn set_easiness(&mut self, direction: QuizDirection, factor: f64) {
        match direction {
            QuizDirection::Forward => self.easiness_factor = factor,
            QuizDirection::Reverse => self.reverse_easiness_factor = factor,
        }
    }

    pub fn has_records(&self) -> bool {
        !self.learned_logs.is_empty() || !self.reverse_logs.is_empty()
    }

    /// Fold a duplicate entry into this one.
    ///
    /// Streams are concatenated and re-sorted; a factor is only taken from
    /// `other` where this entry has none.
    pub fn absorb(&mut self, other: LearningExpression) {
        if self.easiness_factor == 0.0 {
            self.easiness_factor = other.easiness_factor;
        }
        if self.reverse_easiness_factor == 0.0 {
            self.reverse_easiness_factor = other.reverse_easiness_factor;
        }
        self.learned_logs.merge(other.learned_logs);
        self.reverse_logs.merge(other.reverse_logs);
    }
}

/// Serde helpers for `learned_at`: accepts a calendar date, a
/// `YYYY-MM-DD HH:MM:SS` string or RFC 3339, always writes RFC 3339.
mod learned_at {
    use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map_err(de::Error::custom),
        }
    }

    pub(super) fn parse(s: &str) -> Result<Option<DateTime<Utc>>, String> {
        let parsed = if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            ts.with_timezone(&Utc)
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            Utc.from_utc_datetime(&naive)
        } else if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            Utc.from_utc_datetime(&midnight)
        } else {
            return Err(format!("invalid learned_at value: {}", s));
        };

        // Go-style zero times mean "never set"
        if parsed.year() <= 1 {
            return Ok(None);
        }
        Ok(Some(parsed))
    }
}
