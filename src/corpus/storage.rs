//! Reading and writing corpus YAML files

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CorpusError {
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

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, CorpusError>;

/// Name of the index file in every notebook directory
pub const INDEX_FILE_NAME: &str = "index.yml";

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| CorpusError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).map_err(|source| CorpusError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, yaml).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Find every `index.yml` below a root, sorted by path
pub fn find_index_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        log::warn!("Corpus directory {:?} does not exist, skipping", root);
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).max_depth(3).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == INDEX_FILE_NAME {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_index_files_sorted() {
        let temp = TempDir::new().unwrap();
        for name in ["b-series", "a-series"] {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(INDEX_FILE_NAME), "id: x\nname: X\n").unwrap();
        }
        fs::write(temp.path().join("notes.yml"), "[]").unwrap();

        let found = find_index_files(temp.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with(temp.path().join("a-series")));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let found = find_index_files(&temp.path().join("nope")).unwrap();
        assert!(found.is_empty());
    }
}
