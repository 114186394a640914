//! Story and flashcard notebook indexes behind one interface

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::{FlashcardDeck, Note, NotebookIndexFile, StoryEpisode};
use super::storage::{read_yaml, write_yaml, Result};
use crate::scheduler::ContentKind;

/// Layout of a notebook collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotebookKind {
    Story,
    Flashcard,
}

impl From<NotebookKind> for ContentKind {
    fn from(kind: NotebookKind) -> Self {
        match kind {
            NotebookKind::Story => ContentKind::Story,
            NotebookKind::Flashcard => ContentKind::Flashcard,
        }
    }
}

/// A notebook file and the units it holds
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusFile<T> {
    pub path: PathBuf,
    pub notebooks: Vec<T>,
    dirty: bool,
}

impl<T> CorpusFile<T> {
    pub fn new(path: PathBuf, notebooks: Vec<T>) -> Self {
        Self {
            path,
            notebooks,
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryIndex {
    pub index: NotebookIndexFile,
    pub files: Vec<CorpusFile<StoryEpisode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardIndex {
    pub index: NotebookIndexFile,
    pub files: Vec<CorpusFile<FlashcardDeck>>,
}

/// Read-only view of one scene (or a whole deck)
#[derive(Debug, Clone)]
pub struct ContentScene<'a> {
    /// Empty for flashcard decks
    pub title: &'a str,
    pub lines: Vec<&'a str>,
    pub notes: &'a [Note],
}

/// Read-only view of one content unit
#[derive(Debug, Clone)]
pub struct ContentUnit<'a> {
    pub notebook_id: &'a str,
    pub series_name: &'a str,
    pub title: &'a str,
    pub kind: NotebookKind,
    pub file: &'a Path,
    pub scenes: Vec<ContentScene<'a>>,
}

/// A loaded story series or flashcard collection
#[derive(Debug, Clone, PartialEq)]
pub enum NotebookIndex {
    Story(StoryIndex),
    Flashcard(FlashcardIndex),
}

fn load_files<T: DeserializeOwned>(
    dir: &Path,
    index: &NotebookIndexFile,
) -> Result<Vec<CorpusFile<T>>> {
    let mut files = Vec::with_capacity(index.notebooks.len());
    for relative in &index.notebooks {
        let path = dir.join(relative);
        let notebooks: Vec<T> = read_yaml(&path)?;
        files.push(CorpusFile::new(path, notebooks));
    }
    Ok(files)
}

impl NotebookIndex {
    /// Load an `index.yml` and every notebook file it lists
    pub fn load(kind: NotebookKind, index_path: &Path) -> Result<Self> {
        let index: NotebookIndexFile = read_yaml(index_path)?;
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));
        log::debug!(
            "Loading {} notebook files for '{}' from {:?}",
            index.notebooks.len(),
            index.name,
            dir
        );
        Ok(match kind {
            NotebookKind::Story => Self::Story(StoryIndex {
                files: load_files(dir, &index)?,
                index,
            }),
            NotebookKind::Flashcard => Self::Flashcard(FlashcardIndex {
                files: load_files(dir, &index)?,
                index,
            }),
        })
    }

    pub fn kind(&self) -> NotebookKind {
        match self {
            Self::Story(_) => NotebookKind::Story,
            Self::Flashcard(_) => NotebookKind::Flashcard,
        }
    }

    fn index_file(&self) -> &NotebookIndexFile {
        match self {
            Self::Story(story) => &story.index,
            Self::Flashcard(deck) => &deck.index,
        }
    }

    pub fn id(&self) -> &str {
        &self.index_file().id
    }

    pub fn name(&self) -> &str {
        &self.index_file().name
    }

    /// Every content unit in file order
    pub fn units(&self) -> Vec<ContentUnit<'_>> {
        let notebook_id = self.id();
        let series_name = self.name();
        match self {
            Self::Story(story) => story
                .files
                .iter()
                .flat_map(|file| {
                    file.notebooks.iter().map(move |episode| ContentUnit {
                        notebook_id,
                        series_name,
                        title: &episode.event,
                        kind: NotebookKind::Story,
                        file: &file.path,
                        scenes: episode
                            .scenes
                            .iter()
                            .map(|scene| ContentScene {
                                title: &scene.scene,
                                lines: scene.lines().collect(),
                                notes: &scene.definitions,
                            })
                            .collect(),
                    })
                })
                .collect(),
            Self::Flashcard(deck) => deck
                .files
                .iter()
                .flat_map(|file| {
                    file.notebooks.iter().map(move |cards| ContentUnit {
                        notebook_id,
                        series_name,
                        title: &cards.title,
                        kind: NotebookKind::Flashcard,
                        file: &file.path,
                        scenes: vec![ContentScene {
                            title: "",
                            lines: Vec::new(),
                            notes: &cards.cards,
                        }],
                    })
                })
                .collect(),
        }
    }

    /// Visit every note mutably; a file is marked dirty when `f` returns true
    pub fn for_each_note_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&Path, &mut Note) -> bool,
    {
        match self {
            Self::Story(story) => {
                for file in &mut story.files {
                    let mut changed = false;
                    for episode in &mut file.notebooks {
                        for scene in &mut episode.scenes {
                            for note in &mut scene.definitions {
                                changed |= f(&file.path, note);
                            }
                        }
                    }
                    file.dirty |= changed;
                }
            }
            Self::Flashcard(deck) => {
                for file in &mut deck.files {
                    let mut changed = false;
                    for cards in &mut file.notebooks {
                        for note in &mut cards.cards {
                            changed |= f(&file.path, note);
                        }
                    }
                    file.dirty |= changed;
                }
            }
        }
    }

    /// Write back every file modified through [`Self::for_each_note_mut`]
    pub fn save_dirty(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        match self {
            Self::Story(story) => {
                for file in story.files.iter_mut().filter(|f| f.dirty) {
                    write_yaml(&file.path, &file.notebooks)?;
                    file.dirty = false;
                    written.push(file.path.clone());
                }
            }
            Self::Flashcard(deck) => {
                for file in deck.files.iter_mut().filter(|f| f.dirty) {
                    write_yaml(&file.path, &file.notebooks)?;
                    file.dirty = false;
                    written.push(file.path.clone());
                }
            }
        }
        Ok(written)
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Self::Story(story) => story.files.iter().any(CorpusFile::is_dirty),
            Self::Flashcard(deck) => deck.files.iter().any(CorpusFile::is_dirty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_story_series(root: &Path) -> PathBuf {
        let dir = root.join("friends");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("index.yml"),
            "id: friends\nname: Friends\nnotebooks:\n  - ./s01e01.yml\n",
        )
        .unwrap();
        fs::write(
            dir.join("s01e01.yml"),
            r#"
- event: Episode 1
  scenes:
    - scene: Central Perk
      conversations:
        - speaker: Ross
          quote: "We were on a {{ break }}!"
      definitions:
        - expression: break
          dictionary_number: 2
"#,
        )
        .unwrap();
        dir.join("index.yml")
    }

    #[test]
    fn test_load_story_units() {
        let temp = TempDir::new().unwrap();
        let index_path = write_story_series(temp.path());

        let index = NotebookIndex::load(NotebookKind::Story, &index_path).unwrap();
        assert_eq!(index.id(), "friends");
        assert_eq!(index.name(), "Friends");

        let units = index.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].title, "Episode 1");
        assert_eq!(units[0].scenes[0].title, "Central Perk");
        assert_eq!(units[0].scenes[0].notes[0].expression, "break");
    }

    #[test]
    fn test_flashcard_deck_is_one_untitled_scene() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("vocabulary");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.yml"), "id: vocabulary\nname: Vocabulary\nnotebooks: [deck.yml]\n").unwrap();
        fs::write(dir.join("deck.yml"), "- title: flashcards\n  cards:\n    - expression: serendipity\n").unwrap();

        let index = NotebookIndex::load(NotebookKind::Flashcard, &dir.join("index.yml")).unwrap();
        let units = index.units();
        assert_eq!(units[0].kind, NotebookKind::Flashcard);
        assert_eq!(ContentKind::from(units[0].kind), ContentKind::Flashcard);
        assert_eq!(units[0].scenes.len(), 1);
        assert_eq!(units[0].scenes[0].title, "");
    }

    #[test]
    fn test_only_modified_files_are_saved() {
        let temp = TempDir::new().unwrap();
        let index_path = write_story_series(temp.path());
        let mut index = NotebookIndex::load(NotebookKind::Story, &index_path).unwrap();

        index.for_each_note_mut(|_, _| false);
        assert!(!index.is_dirty());
        assert!(index.save_dirty().unwrap().is_empty());

        index.for_each_note_mut(|_, note| {
            note.dictionary_number = 0;
            true
        });
        let written = index.save_dirty().unwrap();
        assert_eq!(written.len(), 1);

        let reloaded = NotebookIndex::load(NotebookKind::Story, &index_path).unwrap();
        assert_eq!(reloaded.units()[0].scenes[0].notes[0].dictionary_number, 0);
    }
}
