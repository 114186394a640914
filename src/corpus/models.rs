//! Data models for the content corpus
//!
//! Story series and flashcard decks each live in a directory with an
//! `index.yml` listing the notebook files that belong to them.

use serde::{Deserialize, Serialize};

/// `index.yml` of a story series or flashcard collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotebookIndexFile {
    pub id: String,
    /// Series or collection name
    pub name: String,
    /// Notebook files relative to the index directory
    #[serde(default)]
    pub notebooks: Vec<String>,
}

/// A vocabulary note attached to a scene or deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Surface form as it appears in the content
    pub expression: String,
    /// Base (dictionary) form when it differs from the surface form
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub definition: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// 1-based entry in the cached dictionary response, 0 for none
    #[serde(default, skip_serializing_if = "is_zero")]
    pub dictionary_number: u32,
    /// Excluded from quizzes and from the conversation check
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_used: bool,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Note {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            definition: String::new(),
            meaning: String::new(),
            examples: Vec::new(),
            dictionary_number: 0,
            not_used: false,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    /// Word the dictionary cache is keyed by
    pub fn dictionary_word(&self) -> &str {
        if self.definition.is_empty() {
            &self.expression
        } else {
            &self.definition
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub speaker: String,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryScene {
    pub scene: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversations: Vec<Conversation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub definitions: Vec<Note>,
}

impl StoryScene {
    /// Every line of text in the scene
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.conversations
            .iter()
            .map(|c| c.quote.as_str())
            .chain(self.statements.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub series: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub season: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub episode: u32,
}

impl EpisodeMetadata {
    fn is_empty(&self) -> bool {
        self.series.is_empty() && self.season == 0 && self.episode == 0
    }
}

/// One story episode; `event` is the unit title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEpisode {
    pub event: String,
    #[serde(default, skip_serializing_if = "EpisodeMetadata::is_empty")]
    pub metadata: EpisodeMetadata,
    #[serde(default)]
    pub scenes: Vec<StoryScene>,
}

/// One flashcard deck; `title` is the unit title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub cards: Vec<Note>,
}
