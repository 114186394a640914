//! Content corpus: story notebooks and flashcard decks
//!
//! This module provides:
//! - Corpus file models and loading
//! - A single interface over story and flashcard notebook indexes
//! - Canonical keys resolving surface and base forms
//! - Expression and scene lookup indexes
//! - The dictionary cache used to check dictionary references

pub mod canonical;
pub mod dictionary;
pub mod index;
pub mod lookup;
pub mod models;
pub mod storage;

use std::path::{Path, PathBuf};

pub use canonical::CanonicalKey;
pub use dictionary::{DictionaryCache, FileDictionaryCache, StaticDictionaryCache};
pub use index::{ContentScene, ContentUnit, NotebookIndex, NotebookKind};
pub use lookup::{CorpusIndex, NoteLocation};
pub use models::*;
pub use storage::CorpusError;

/// Every loaded notebook collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub notebooks: Vec<NotebookIndex>,
}

impl Corpus {
    pub fn new(notebooks: Vec<NotebookIndex>) -> Self {
        Self { notebooks }
    }

    /// Load every story and flashcard collection found under the given roots
    pub fn load(story_roots: &[PathBuf], flashcard_roots: &[PathBuf]) -> storage::Result<Self> {
        let mut notebooks = Vec::new();
        for (kind, roots) in [
            (NotebookKind::Story, story_roots),
            (NotebookKind::Flashcard, flashcard_roots),
        ] {
            for root in roots {
                for index_path in storage::find_index_files(root)? {
                    notebooks.push(NotebookIndex::load(kind, &index_path)?);
                }
            }
        }
        log::info!("Loaded {} notebook collections", notebooks.len());
        Ok(Self { notebooks })
    }

    pub fn units(&self) -> Vec<ContentUnit<'_>> {
        self.notebooks.iter().flat_map(NotebookIndex::units).collect()
    }

    pub fn index(&self) -> CorpusIndex {
        CorpusIndex::build(self)
    }

    pub fn for_each_note_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&Path, &mut Note) -> bool,
    {
        for notebook in &mut self.notebooks {
            notebook.for_each_note_mut(&mut f);
        }
    }

    pub fn save_dirty(&mut self) -> storage::Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for notebook in &mut self.notebooks {
            written.extend(notebook.save_dirty()?);
        }
        Ok(written)
    }
}

/// In-memory corpora for tests
#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    use super::index::{CorpusFile, FlashcardIndex, StoryIndex};
    use super::*;

    /// One story series ("Friends") from `(unit, scene, [(expression, definition)])`.
    ///
    /// Each scene gets a conversation line quoting all of its expressions.
    pub fn story_corpus(scenes: &[(&str, &str, &[(&str, &str)])]) -> Corpus {
        let mut episodes: Vec<StoryEpisode> = Vec::new();
        for (unit, scene, notes) in scenes {
            let position = match episodes.iter().position(|e| e.event == *unit) {
                Some(position) => position,
                None => {
                    episodes.push(StoryEpisode {
                        event: unit.to_string(),
                        metadata: EpisodeMetadata::default(),
                        scenes: Vec::new(),
                    });
                    episodes.len() - 1
                }
            };
            let quote = notes
                .iter()
                .map(|(expression, _)| format!("{{{{ {} }}}}", expression))
                .collect::<Vec<_>>()
                .join(" and ");
            episodes[position].scenes.push(StoryScene {
                scene: scene.to_string(),
                conversations: vec![Conversation {
                    speaker: "Ross".to_string(),
                    quote,
                }],
                statements: Vec::new(),
                definitions: notes
                    .iter()
                    .map(|(expression, definition)| Note::new(*expression).with_definition(*definition))
                    .collect(),
            });
        }

        Corpus::new(vec![NotebookIndex::Story(StoryIndex {
            index: NotebookIndexFile {
                id: "friends".to_string(),
                name: "Friends".to_string(),
                notebooks: vec!["s01.yml".to_string()],
            },
            files: vec![CorpusFile::new(PathBuf::from("stories/friends/s01.yml"), episodes)],
        })])
    }

    /// One flashcard collection with a single deck
    pub fn flashcard_corpus(title: &str, expressions: &[&str]) -> Corpus {
        Corpus::new(vec![NotebookIndex::Flashcard(FlashcardIndex {
            index: NotebookIndexFile {
                id: "vocabulary".to_string(),
                name: "Vocabulary Cards".to_string(),
                notebooks: vec!["deck.yml".to_string()],
            },
            files: vec![CorpusFile::new(
                PathBuf::from("flashcards/vocabulary/deck.yml"),
                vec![FlashcardDeck {
                    title: title.to_string(),
                    description: String::new(),
                    cards: expressions.iter().map(|e| Note::new(*e)).collect(),
                }],
            )],
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_both_kinds() {
        let temp = TempDir::new().unwrap();
        let stories = temp.path().join("stories");
        let flashcards = temp.path().join("flashcards");

        let series = stories.join("friends");
        fs::create_dir_all(&series).unwrap();
        fs::write(series.join("index.yml"), "id: friends\nname: Friends\nnotebooks: [e1.yml]\n").unwrap();
        fs::write(series.join("e1.yml"), "- event: Episode 1\n  scenes: []\n").unwrap();

        let deck = flashcards.join("vocabulary");
        fs::create_dir_all(&deck).unwrap();
        fs::write(deck.join("index.yml"), "id: vocabulary\nname: Vocabulary\nnotebooks: [d.yml]\n").unwrap();
        fs::write(deck.join("d.yml"), "- title: flashcards\n  cards: []\n").unwrap();

        let corpus = Corpus::load(&[stories], &[flashcards]).unwrap();
        let kinds: Vec<_> = corpus.notebooks.iter().map(NotebookIndex::kind).collect();
        assert_eq!(kinds, vec![NotebookKind::Story, NotebookKind::Flashcard]);
        assert_eq!(corpus.units().len(), 2);
    }

    #[test]
    fn test_missing_notebook_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let series = temp.path().join("friends");
        fs::create_dir_all(&series).unwrap();
        fs::write(series.join("index.yml"), "id: friends\nname: Friends\nnotebooks: [gone.yml]\n").unwrap();

        let err = Corpus::load(&[temp.path().to_path_buf()], &[]).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
