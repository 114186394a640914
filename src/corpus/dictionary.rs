//! Lookup of cached dictionary responses
//!
//! A note's `dictionary_number` points into a dictionary response cached as
//! `<cache_dir>/<word>.json`. Only existence matters here.

use std::collections::HashSet;
use std::path::PathBuf;

pub trait DictionaryCache {
    fn contains(&self, word: &str) -> bool;
}

/// Cache directory on disk
pub struct FileDictionaryCache {
    dir: PathBuf,
}

impl FileDictionaryCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn entry_path(&self, word: &str) -> PathBuf {
        self.dir.join(format!("{}.json", word))
    }
}

impl DictionaryCache for FileDictionaryCache {
    fn contains(&self, word: &str) -> bool {
        !word.is_empty() && self.entry_path(word).is_file()
    }
}

/// Fixed set of cached words
#[derive(Debug, Clone, Default)]
pub struct StaticDictionaryCache {
    words: HashSet<String>,
}

impl StaticDictionaryCache {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }
}

impl DictionaryCache for StaticDictionaryCache {
    fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}
