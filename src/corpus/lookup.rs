//! Expression and scene indexes over a loaded corpus

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::canonical::CanonicalKey;
use super::index::NotebookKind;
use super::Corpus;

/// Where a note lives in the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct NoteLocation {
    pub notebook_id: String,
    pub series_name: String,
    pub unit_title: String,
    /// Empty for flashcard decks
    pub scene_title: String,
    pub kind: NotebookKind,
    pub file: PathBuf,
    pub key: CanonicalKey,
    pub not_used: bool,
}

impl NoteLocation {
    pub fn describe(&self) -> String {
        if self.scene_title.is_empty() {
            format!("'{}'", self.unit_title)
        } else {
            format!("'{}' / '{}'", self.unit_title, self.scene_title)
        }
    }
}

/// Flat `expression -> locations` index plus a
/// `(unit, scene) -> expressions` index, both keyed by surface and base form
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    notes: Vec<NoteLocation>,
    by_expression: HashMap<String, Vec<usize>>,
    by_scene: HashMap<(String, String), HashSet<String>>,
}

impl CorpusIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let mut index = Self::default();
        for unit in corpus.units() {
            for scene in &unit.scenes {
                for note in scene.notes {
                    index.insert(NoteLocation {
                        notebook_id: unit.notebook_id.to_string(),
                        series_name: unit.series_name.to_string(),
                        unit_title: unit.title.to_string(),
                        scene_title: scene.title.to_string(),
                        kind: unit.kind,
                        file: unit.file.to_path_buf(),
                        key: CanonicalKey::from_note(note),
                        not_used: note.not_used,
                    });
                }
            }
        }
        log::debug!(
            "Indexed {} notes under {} keys",
            index.notes.len(),
            index.by_expression.len()
        );
        index
    }

    fn insert(&mut self, location: NoteLocation) {
        let position = self.notes.len();
        let scene_key = (location.unit_title.clone(), location.scene_title.clone());
        let forms: Vec<String> = location.key.forms().map(str::to_string).collect();
        for form in forms {
            let entries = self.by_expression.entry(form.clone()).or_default();
            if !entries.contains(&position) {
                entries.push(position);
            }
            self.by_scene.entry(scene_key.clone()).or_default().insert(form);
        }
        self.notes.push(location);
    }

    pub fn notes(&self) -> &[NoteLocation] {
        &self.notes
    }

    /// Every note whose surface or base form equals `key`
    pub fn locations(&self, key: &str) -> Vec<&NoteLocation> {
        self.by_expression
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.notes[i]).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_expression.contains_key(key)
    }

    pub fn scene_contains(&self, unit_title: &str, scene_title: &str, key: &str) -> bool {
        self.by_scene
            .get(&(unit_title.to_string(), scene_title.to_string()))
            .map_or(false, |keys| keys.contains(key))
    }

    /// The note for `key` at an exact place, if any
    pub fn note_at(&self, unit_title: &str, scene_title: &str, key: &str) -> Option<&NoteLocation> {
        self.locations(key)
            .into_iter()
            .find(|loc| loc.unit_title == unit_title && loc.scene_title == scene_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::testing::story_corpus;

    #[test]
    fn test_indexes_both_forms() {
        let corpus = story_corpus(&[("Episode 1", "Cafe", &[("ran", "run"), ("hello", "")])]);
        let index = CorpusIndex::build(&corpus);

        assert_eq!(index.locations("ran").len(), 1);
        assert_eq!(index.locations("run").len(), 1);
        assert!(index.scene_contains("Episode 1", "Cafe", "run"));
        assert!(index.scene_contains("Episode 1", "Cafe", "hello"));
        assert!(!index.scene_contains("Episode 1", "Kitchen", "hello"));
        assert!(!index.contains("nonexistent"));
    }

    #[test]
    fn test_note_at_exact_scene() {
        let corpus = story_corpus(&[
            ("Episode 1", "Cafe", &[("hello", "")]),
            ("Episode 1", "Kitchen", &[("hello", "")]),
        ]);
        let index = CorpusIndex::build(&corpus);

        assert_eq!(index.locations("hello").len(), 2);
        let kitchen = index.note_at("Episode 1", "Kitchen", "hello").unwrap();
        assert_eq!(kitchen.describe(), "'Episode 1' / 'Kitchen'");
    }
}
