//! `config.toml` loading
//!
//! ```toml
//! [notebooks]
//! stories_dirs = ["stories"]
//! flashcards_dirs = ["flashcards"]
//! learning_notes_dir = "learning_notes"
//! dictionary_cache_dir = "~/.cache/vocab/dictionary"
//!
//! [validator]
//! check_duplicate_dates = false
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consistency::ValidatorOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not determine the user config directory")]
    ConfigDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root for the default locations: `<data_local_dir>/vocab`
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("vocab"))
        .unwrap_or_else(|| PathBuf::from("vocab"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebooksConfig {
    pub stories_dirs: Vec<PathBuf>,
    pub flashcards_dirs: Vec<PathBuf>,
    /// Directory of the ledger files
    pub learning_notes_dir: PathBuf,
    pub dictionary_cache_dir: PathBuf,
}

impl NotebooksConfig {
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            stories_dirs: vec![root.join("stories")],
            flashcards_dirs: vec![root.join("flashcards")],
            learning_notes_dir: root.join("learning_notes"),
            dictionary_cache_dir: root.join("dictionary"),
        }
    }
}

impl Default for NotebooksConfig {
    fn default() -> Self {
        Self::rooted_at(&default_data_dir())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub notebooks: NotebooksConfig,
    pub validator: ValidatorOptions,
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

impl Config {
    /// `<config_dir>/vocab/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("vocab").join("config.toml"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Load an explicit config file, or the default one when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    log::debug!("No config at {:?}, using defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let notebooks = &mut self.notebooks;
        for dir in notebooks
            .stories_dirs
            .iter_mut()
            .chain(notebooks.flashcards_dirs.iter_mut())
        {
            *dir = resolve(base, dir);
        }
        notebooks.learning_notes_dir = resolve(base, &notebooks.learning_notes_dir);
        notebooks.dictionary_cache_dir = resolve(base, &notebooks.dictionary_cache_dir);
    }
}
