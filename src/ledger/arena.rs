//! In-memory ledger arena
//!
//! Histories, scenes and expressions live in flat tables addressed by stable
//! ids. Parents own ordered child-id lists, so finding, creating and moving
//! entries are edits to those lists. Detached expressions stay in the table
//! but are no longer reachable from any file and are not written back.

use std::collections::HashMap;

use super::models::{
    HistoryMetadata, HistoryType, LearningExpression, LearningHistory, LearningScene,
    SceneMetadata,
};
use super::storage::{LedgerFile, LedgerStorageError, LEDGER_EXTENSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistoryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

/// Layout of a history: scenes for stories, one flat list for decks
#[derive(Debug, Clone)]
pub enum HistoryBody {
    Story { scenes: Vec<SceneId> },
    Flashcard { expressions: Vec<ExpressionId> },
}

/// Container an expression is listed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionParent {
    Scene(SceneId),
    Deck(HistoryId),
}

#[derive(Debug, Clone)]
pub struct FileNode {
    /// File stem, e.g. `friends` for `friends.yml`
    pub name: String,
    pub extension: String,
    histories: Vec<HistoryId>,
}

impl FileNode {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

#[derive(Debug, Clone)]
pub struct HistoryNode {
    pub file: FileId,
    pub metadata: HistoryMetadata,
    pub body: HistoryBody,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub history: HistoryId,
    pub title: String,
    expressions: Vec<ExpressionId>,
}

#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub parent: ExpressionParent,
    pub data: LearningExpression,
}

/// Where an expression currently sits, with display labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionPlacement {
    pub file: FileId,
    pub history: HistoryId,
    pub scene: Option<SceneId>,
    pub history_index: usize,
    pub scene_index: Option<usize>,
    pub expression_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    files: Vec<FileNode>,
    histories: Vec<HistoryNode>,
    scenes: Vec<SceneNode>,
    expressions: Vec<ExpressionNode>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from loaded ledger files.
    ///
    /// A history whose populated layout contradicts its type tag is rejected.
    pub fn from_files(files: Vec<LedgerFile>) -> Result<Self, LedgerStorageError> {
        let mut ledger = Self::new();
        for file in files {
            let file_id = ledger.add_file(file.name.clone());
            ledger.files[file_id.0].extension = file.extension;
            for history in file.histories {
                let is_flashcard = history.metadata.is_flashcard();
                if is_flashcard && !history.scenes.is_empty() {
                    return Err(LedgerStorageError::MixedLayout {
                        file: file.name,
                        title: history.metadata.title,
                    });
                }
                if !is_flashcard && !history.expressions.is_empty() {
                    return Err(LedgerStorageError::MixedLayout {
                        file: file.name,
                        title: history.metadata.title,
                    });
                }

                let history_id = ledger.add_history(file_id, history.metadata);
                if is_flashcard {
                    for expression in history.expressions {
                        ledger.add_expression(ExpressionParent::Deck(history_id), expression);
                    }
                } else {
                    for scene in history.scenes {
                        let scene_id = ledger.add_scene(history_id, scene.metadata.title);
                        for expression in scene.expressions {
                            ledger.add_expression(ExpressionParent::Scene(scene_id), expression);
                        }
                    }
                }
            }
        }
        Ok(ledger)
    }

    /// Rebuild the on-disk shape of every file, in arena order
    pub fn to_files(&self) -> Vec<LedgerFile> {
        self.files
            .iter()
            .map(|file| LedgerFile {
                name: file.name.clone(),
                extension: file.extension.clone(),
                histories: file
                    .histories
                    .iter()
                    .map(|&id| self.history_to_model(id))
                    .collect(),
            })
            .collect()
    }

    fn history_to_model(&self, id: HistoryId) -> LearningHistory {
        let node = self.history(id);
        match &node.body {
            HistoryBody::Story { scenes } => LearningHistory {
                metadata: node.metadata.clone(),
                scenes: scenes
                    .iter()
                    .map(|&scene_id| {
                        let scene = self.scene(scene_id);
                        LearningScene {
                            metadata: SceneMetadata {
                                title: scene.title.clone(),
                            },
                            expressions: scene
                                .expressions
                                .iter()
                                .map(|&e| self.expression(e).clone())
                                .collect(),
                        }
                    })
                    .collect(),
                expressions: Vec::new(),
            },
            HistoryBody::Flashcard { expressions } => LearningHistory {
                metadata: node.metadata.clone(),
                scenes: Vec::new(),
                expressions: expressions
                    .iter()
                    .map(|&e| self.expression(e).clone())
                    .collect(),
            },
        }
    }

    // ===== Files =====

    pub fn file_ids(&self) -> impl Iterator<Item = FileId> {
        (0..self.files.len()).map(FileId)
    }

    pub fn file(&self, id: FileId) -> &FileNode {
        &self.files[id.0]
    }

    pub fn find_file(&self, name: &str) -> Option<FileId> {
        self.files.iter().position(|f| f.name == name).map(FileId)
    }

    pub fn add_file(&mut self, name: String) -> FileId {
        self.files.push(FileNode {
            name,
            extension: LEDGER_EXTENSION.to_string(),
            histories: Vec::new(),
        });
        FileId(self.files.len() - 1)
    }

    pub fn find_or_add_file(&mut self, name: &str) -> FileId {
        match self.find_file(name) {
            Some(id) => id,
            None => self.add_file(name.to_string()),
        }
    }

    pub fn histories_in(&self, file: FileId) -> &[HistoryId] {
        &self.files[file.0].histories
    }

    // ===== Histories =====

    pub fn history_ids(&self) -> impl Iterator<Item = HistoryId> + '_ {
        self.files.iter().flat_map(|f| f.histories.iter().copied())
    }

    pub fn history(&self, id: HistoryId) -> &HistoryNode {
        &self.histories[id.0]
    }

    /// Find a history by its title, first match in file order
    pub fn find_history(&self, title: &str) -> Option<HistoryId> {
        self.history_ids()
            .find(|&id| self.history(id).metadata.title == title)
    }

    /// Append a history to a file; the type tag selects its layout
    pub fn add_history(&mut self, file: FileId, metadata: HistoryMetadata) -> HistoryId {
        let body = if metadata.is_flashcard() {
            HistoryBody::Flashcard {
                expressions: Vec::new(),
            }
        } else {
            HistoryBody::Story { scenes: Vec::new() }
        };
        self.histories.push(HistoryNode {
            file,
            metadata,
            body,
        });
        let id = HistoryId(self.histories.len() - 1);
        self.files[file.0].histories.push(id);
        id
    }

    /// Convenience for creating a story or flashcard history
    pub fn create_history(
        &mut self,
        file: FileId,
        notebook_id: &str,
        title: &str,
        flashcard: bool,
    ) -> HistoryId {
        self.add_history(
            file,
            HistoryMetadata {
                id: notebook_id.to_string(),
                title: title.to_string(),
                history_type: flashcard.then_some(HistoryType::Flashcard),
            },
        )
    }

    /// Containers of a history: its scenes, or the deck itself
    pub fn parents_of(&self, history: HistoryId) -> Vec<ExpressionParent> {
        match &self.history(history).body {
            HistoryBody::Story { scenes } => {
                scenes.iter().map(|&s| ExpressionParent::Scene(s)).collect()
            }
            HistoryBody::Flashcard { .. } => vec![ExpressionParent::Deck(history)],
        }
    }

    // ===== Scenes =====

    pub fn scenes_of(&self, history: HistoryId) -> &[SceneId] {
        match &self.history(history).body {
            HistoryBody::Story { scenes } => scenes,
            HistoryBody::Flashcard { .. } => &[],
        }
    }

    pub fn scene(&self, id: SceneId) -> &SceneNode {
        &self.scenes[id.0]
    }

    pub fn find_scene(&self, history: HistoryId, title: &str) -> Option<SceneId> {
        self.scenes_of(history)
            .iter()
            .copied()
            .find(|&s| self.scene(s).title == title)
    }

    /// Append a scene to a story history
    pub fn add_scene(&mut self, history: HistoryId, title: String) -> SceneId {
        self.scenes.push(SceneNode {
            history,
            title,
            expressions: Vec::new(),
        });
        let id = SceneId(self.scenes.len() - 1);
        if let HistoryBody::Story { scenes } = &mut self.histories[history.0].body {
            scenes.push(id);
        }
        id
    }

    pub fn find_or_add_scene(&mut self, history: HistoryId, title: &str) -> SceneId {
        match self.find_scene(history, title) {
            Some(id) => id,
            None => self.add_scene(history, title.to_string()),
        }
    }

    // ===== Expressions =====

    pub fn expressions_in(&self, parent: ExpressionParent) -> &[ExpressionId] {
        match parent {
            ExpressionParent::Scene(scene) => &self.scenes[scene.0].expressions,
            ExpressionParent::Deck(history) => match &self.histories[history.0].body {
                HistoryBody::Flashcard { expressions } => expressions,
                HistoryBody::Story { .. } => &[],
            },
        }
    }

    fn children_mut(&mut self, parent: ExpressionParent) -> Option<&mut Vec<ExpressionId>> {
        match parent {
            ExpressionParent::Scene(scene) => Some(&mut self.scenes[scene.0].expressions),
            ExpressionParent::Deck(history) => match &mut self.histories[history.0].body {
                HistoryBody::Flashcard { expressions } => Some(expressions),
                HistoryBody::Story { .. } => None,
            },
        }
    }

    pub fn expression(&self, id: ExpressionId) -> &LearningExpression {
        &self.expressions[id.0].data
    }

    pub fn expression_mut(&mut self, id: ExpressionId) -> &mut LearningExpression {
        &mut self.expressions[id.0].data
    }

    pub fn parent_of(&self, id: ExpressionId) -> ExpressionParent {
        self.expressions[id.0].parent
    }

    pub fn history_of(&self, parent: ExpressionParent) -> HistoryId {
        match parent {
            ExpressionParent::Scene(scene) => self.scene(scene).history,
            ExpressionParent::Deck(history) => history,
        }
    }

    /// Scene title of a container, empty for decks
    pub fn scene_title(&self, parent: ExpressionParent) -> &str {
        match parent {
            ExpressionParent::Scene(scene) => &self.scene(scene).title,
            ExpressionParent::Deck(_) => "",
        }
    }

    pub fn find_expression(&self, parent: ExpressionParent, key: &str) -> Option<ExpressionId> {
        self.expressions_in(parent)
            .iter()
            .copied()
            .find(|&e| self.expression(e).expression == key)
    }

    pub fn add_expression(
        &mut self,
        parent: ExpressionParent,
        data: LearningExpression,
    ) -> ExpressionId {
        let id = ExpressionId(self.expressions.len());
        self.expressions.push(ExpressionNode { parent, data });
        if let Some(children) = self.children_mut(parent) {
            children.push(id);
        }
        id
    }

    /// Unlink an expression from its container
    pub fn detach_expression(&mut self, id: ExpressionId) {
        let parent = self.parent_of(id);
        if let Some(children) = self.children_mut(parent) {
            children.retain(|&e| e != id);
        }
    }

    /// Move an expression to the end of another container
    pub fn move_expression(&mut self, id: ExpressionId, target: ExpressionParent) {
        self.detach_expression(id);
        self.expressions[id.0].parent = target;
        if let Some(children) = self.children_mut(target) {
            children.push(id);
        }
    }

    /// Replace the data of `target` with the merge of `target` and `source`,
    /// then detach `source`
    pub fn merge_into(&mut self, target: ExpressionId, source: ExpressionId) {
        self.detach_expression(source);
        let taken = std::mem::replace(
            &mut self.expressions[source.0].data,
            LearningExpression::new(String::new()),
        );
        self.expressions[target.0].data.absorb(taken);
    }

    /// Every reachable expression in file order
    pub fn expression_ids(&self) -> Vec<ExpressionId> {
        let mut ids = Vec::new();
        for history in self.history_ids() {
            for parent in self.parents_of(history) {
                ids.extend_from_slice(self.expressions_in(parent));
            }
        }
        ids
    }

    /// Position of a reachable expression, used for report paths
    pub fn placement(&self, id: ExpressionId) -> Option<ExpressionPlacement> {
        let parent = self.parent_of(id);
        let history = self.history_of(parent);
        let file = self.history(history).file;
        let history_index = self.histories_in(file).iter().position(|&h| h == history)?;
        let expression_index = self.expressions_in(parent).iter().position(|&e| e == id)?;
        let (scene, scene_index) = match parent {
            ExpressionParent::Scene(scene) => (
                Some(scene),
                self.scenes_of(history).iter().position(|&s| s == scene),
            ),
            ExpressionParent::Deck(_) => (None, None),
        };
        Some(ExpressionPlacement {
            file,
            history,
            scene,
            history_index,
            scene_index,
            expression_index,
        })
    }

    /// Index path of an expression, e.g. `[0].scenes[2].expressions[1]`
    pub fn path_of(&self, id: ExpressionId) -> String {
        match self.placement(id) {
            Some(p) => match p.scene_index {
                Some(scene_index) => format!(
                    "[{}].scenes[{}].expressions[{}]",
                    p.history_index, scene_index, p.expression_index
                ),
                None => format!("[{}].expressions[{}]", p.history_index, p.expression_index),
            },
            None => String::from("<detached>"),
        }
    }

    /// Expressions of a history grouped by key, in first-seen order
    pub fn group_by_key(&self, history: HistoryId) -> Vec<(String, Vec<ExpressionId>)> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<ExpressionId>> = HashMap::new();
        for parent in self.parents_of(history) {
            for &id in self.expressions_in(parent) {
                let key = self.expression(id).expression.clone();
                groups
                    .entry(key.clone())
                    .or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    })
                    .push(id);
            }
        }
        order
            .into_iter()
            .map(|key| {
                let ids = groups.remove(&key).unwrap_or_default();
                (key, ids)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_file() -> LedgerFile {
        let yaml = r#"
- metadata:
    id: friends
    title: Episode 1
  scenes:
    - metadata:
        title: Cafe
      expressions:
        - expression: hello
          learned_logs: []
        - expression: break up
          learned_logs: []
    - metadata:
        title: Apartment
      expressions:
        - expression: roommate
          learned_logs: []
"#;
        LedgerFile {
            name: "friends".to_string(),
            extension: "yml".to_string(),
            histories: serde_yaml::from_str(yaml).unwrap(),
        }
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let file = story_file();
        let ledger = Ledger::from_files(vec![file.clone()]).unwrap();
        assert_eq!(ledger.to_files(), vec![file]);
    }

    #[test]
    fn test_move_expression_between_scenes() {
        let mut ledger = Ledger::from_files(vec![story_file()]).unwrap();
        let history = ledger.find_history("Episode 1").unwrap();
        let cafe = ledger.find_scene(history, "Cafe").unwrap();
        let apartment = ledger.find_scene(history, "Apartment").unwrap();
        let hello = ledger
            .find_expression(ExpressionParent::Scene(cafe), "hello")
            .unwrap();

        ledger.move_expression(hello, ExpressionParent::Scene(apartment));

        assert!(ledger.find_expression(ExpressionParent::Scene(cafe), "hello").is_none());
        assert_eq!(ledger.expressions_in(ExpressionParent::Scene(apartment)).len(), 2);
        assert_eq!(ledger.path_of(hello), "[0].scenes[1].expressions[1]");
    }

    #[test]
    fn test_detached_expressions_are_not_written() {
        let mut ledger = Ledger::from_files(vec![story_file()]).unwrap();
        let ids = ledger.expression_ids();
        ledger.detach_expression(ids[0]);

        let files = ledger.to_files();
        assert_eq!(files[0].histories[0].scenes[0].expressions.len(), 1);
        assert_eq!(ledger.expression_ids().len(), 2);
    }

    #[test]
    fn test_mixed_layout_is_rejected() {
        let mut file = story_file();
        file.histories[0].metadata.history_type = Some(HistoryType::Flashcard);
        let err = Ledger::from_files(vec![file]).unwrap_err();
        assert!(matches!(err, LedgerStorageError::MixedLayout { .. }));
    }

    #[test]
    fn test_flashcard_history_uses_flat_list() {
        let mut ledger = Ledger::new();
        let file = ledger.add_file("vocabulary".to_string());
        let deck = ledger.create_history(file, "vocabulary", "flashcards", true);
        ledger.add_expression(ExpressionParent::Deck(deck), LearningExpression::new("serendipity"));

        assert!(ledger.scenes_of(deck).is_empty());
        assert_eq!(ledger.parents_of(deck), vec![ExpressionParent::Deck(deck)]);
        let files = ledger.to_files();
        assert_eq!(files[0].histories[0].expressions[0].expression, "serendipity");
    }
}
