//! Vocabulary learning ledger
//!
//! - [`scheduler`]: SM-2 style intervals and review gates
//! - [`ledger`]: ledger files, the in-memory arena and quiz updates
//! - [`corpus`]: story and flashcard notebooks the ledger tracks
//! - [`consistency`]: validation and automatic repair of the ledger
//! - [`config`]: `config.toml` loading

pub mod config;
pub mod consistency;
pub mod corpus;
pub mod ledger;
pub mod scheduler;
