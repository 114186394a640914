//! Learning ledger: per-expression review history
//!
//! This module provides:
//! - The on-disk ledger models (history, scene, expression, record)
//! - An id-addressed arena for in-memory edits
//! - YAML storage of ledger files
//! - The find-or-create updater applying quiz outcomes

mod arena;
mod models;
pub mod storage;
pub mod updater;

pub use arena::*;
pub use models::*;
pub use storage::{LedgerFile, LedgerStorage, LedgerStorageError};
pub use updater::{QuizOutcome, UpdateMode};
