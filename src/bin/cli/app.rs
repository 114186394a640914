use std::path::Path;

use anyhow::{Context, Result};

use vocab_lib::config::Config;
use vocab_lib::consistency::Validator;
use vocab_lib::corpus::{Corpus, FileDictionaryCache};
use vocab_lib::ledger::storage::SaveSummary;
use vocab_lib::ledger::{Ledger, LedgerStorage};

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub ledger_storage: LedgerStorage,
    pub dictionary: FileDictionaryCache,
}

impl App {
    /// Initialize from the given or the default config file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path).context("Failed to load config")?;
        let ledger_storage = LedgerStorage::new(config.notebooks.learning_notes_dir.clone());
        let dictionary = FileDictionaryCache::new(config.notebooks.dictionary_cache_dir.clone());

        Ok(Self {
            config,
            ledger_storage,
            dictionary,
        })
    }

    /// Load every story and flashcard notebook
    pub fn load_corpus(&self) -> Result<Corpus> {
        let notebooks = &self.config.notebooks;
        Corpus::load(&notebooks.stories_dirs, &notebooks.flashcards_dirs)
            .context("Failed to load notebooks")
    }

    pub fn load_ledger(&self) -> Result<Ledger> {
        self.ledger_storage.load().with_context(|| {
            format!(
                "Failed to load ledger from {}",
                self.ledger_storage.dir().display()
            )
        })
    }

    pub fn save_ledger(&self, ledger: &Ledger) -> Result<SaveSummary> {
        self.ledger_storage.save(ledger).with_context(|| {
            format!(
                "Failed to write ledger to {}",
                self.ledger_storage.dir().display()
            )
        })
    }

    pub fn validator<'a>(&'a self, corpus: &'a Corpus) -> Validator<'a> {
        Validator::new(corpus, &self.dictionary).with_options(self.config.validator)
    }
}
