//! Storage operations for learning ledger files
//!
//! Directory structure:
//! ```text
//! learning_notes/
//! ├── friends.yml          # Histories of the "Friends" series
//! └── vocabulary.yml       # Flashcard deck histories
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::arena::Ledger;
use super::models::LearningHistory;

#[derive(Error, Debug)]
pub enum LedgerStorageError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("History '{title}' in {file} populates the layout its type does not select")]
    MixedLayout { file: String, title: String },
}

pub type Result<T> = std::result::Result<T, LedgerStorageError>;

/// Extension of ledger files created by this crate
pub const LEDGER_EXTENSION: &str = "yml";

/// Contents of one ledger file
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerFile {
    /// File stem without extension
    pub name: String,
    /// `yml` or `yaml`, as found on disk
    pub extension: String,
    pub histories: Vec<LearningHistory>,
}

impl LedgerFile {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.histories)
    }
}

/// Summary of a save pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
}

/// Storage manager for the learning ledger directory
pub struct LedgerStorage {
    dir: PathBuf,
}

impl LedgerStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a new ledger file by stem
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, LEDGER_EXTENSION))
    }

    /// Load every `*.yml` / `*.yaml` file, sorted by file name
    pub fn load_files(&self) -> Result<Vec<LedgerFile>> {
        if !self.dir.exists() {
            log::debug!("Ledger directory {:?} does not exist yet", self.dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|source| LedgerStorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LedgerStorageError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path
                .extension()
                .map_or(false, |ext| ext == "yml" || ext == "yaml")
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(Self::read_file(&path)?);
        }
        log::debug!("Loaded {} ledger files from {:?}", files.len(), self.dir);
        Ok(files)
    }

    fn read_file(path: &Path) -> Result<LedgerFile> {
        let content = fs::read_to_string(path).map_err(|source| LedgerStorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let histories: Vec<LearningHistory> = if content.trim().is_empty() {
            Vec::new()
        } else {
            serde_yaml::from_str(&content).map_err(|source| LedgerStorageError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| LEDGER_EXTENSION.to_string());
        Ok(LedgerFile {
            name,
            extension,
            histories,
        })
    }

    /// Load the whole ledger into an arena
    pub fn load(&self) -> Result<Ledger> {
        Ledger::from_files(self.load_files()?)
    }

    /// Write every file whose serialized form differs from what is on disk.
    ///
    /// Each file goes back to the path it was loaded from.
    ///
    /// All contents are rendered before the first write, so a failure while
    /// rendering leaves the directory untouched. A failure while writing can
    /// leave earlier files updated and later ones not.
    pub fn save(&self, ledger: &Ledger) -> Result<SaveSummary> {
        let mut rendered = Vec::new();
        for file in ledger.to_files() {
            let path = self.dir.join(file.file_name());
            let yaml = file.to_yaml().map_err(|source| LedgerStorageError::Yaml {
                path: path.clone(),
                source,
            })?;
            rendered.push((path, yaml));
        }

        fs::create_dir_all(&self.dir).map_err(|source| LedgerStorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut summary = SaveSummary::default();
        for (path, yaml) in rendered {
            let current = fs::read_to_string(&path).ok();
            if current.as_deref() == Some(yaml.as_str()) {
                summary.unchanged += 1;
                continue;
            }
            fs::write(&path, yaml).map_err(|source| LedgerStorageError::Io {
                path: path.clone(),
                source,
            })?;
            log::info!("Wrote ledger file {:?}", path);
            summary.written.push(path);
        }
        Ok(summary)
    }
}
