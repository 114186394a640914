//! Spaced repetition scheduling for the learning ledger
//!
//! This module provides:
//! - The SM-2 variant turning quiz outcomes into factors and intervals
//! - Review gates deciding which expressions are due

pub mod algorithm;
pub mod review;

pub use algorithm::{
    calculate_next_interval, correct_streak, threshold_days_from_correct_count,
    update_difficulty_factor,
};
pub use review::{is_due, ContentKind};
