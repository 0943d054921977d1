//! # Project History
//!
//! Linear undo/redo over immutable document snapshots.
//!
//! ## Design
//!
//! - Every commit pushes a new [`Document`] on the history stack
//! - Undo moves the top snapshot to the redo stack
//! - Redo moves it back
//! - New commits clear the redo stack
//! - A batch of edit functions is one undo step
//!
//! Snapshots share all untouched subtrees, so keeping whole documents is
//! cheaper than recording inverse edits.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut project = Project::new();
//! project.set_callback(|info| println!("{}", info));
//!
//! project.mutate("Add shape", |doc| doc.append(None, [shape]))?;
//! project.undo()?;
//! project.redo()?;
//! ```

use crate::builder::DocumentBuilder;
use crate::document::Document;
use crate::errors::{DocumentResult, ProjectError, ProjectResult};
use crate::mutation_info::MutationInfo;
use animgraph_model::Node;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// One step of a batch
pub type Edit<'a> = Box<dyn FnOnce(&mut DocumentBuilder) -> DocumentResult<()> + 'a>;

/// Receives the diff of every commit, undo and redo
pub type MutationCallback = Box<dyn FnMut(&MutationInfo)>;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub document: Arc<Document>,
    /// Description of the mutation that produced this snapshot
    pub description: Option<String>,
}

pub struct Project {
    /// Committed snapshots, most recent last; never empty
    history: Vec<HistoryEntry>,

    /// Undone snapshots, most recent last
    redo: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    callback: Option<MutationCallback>,
}

impl Project {
    /// Project holding an empty document, with unlimited history
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            history: vec![HistoryEntry {
                document: Arc::new(document),
                description: None,
            }],
            redo: Vec::new(),
            max_levels: 0,
            callback: None,
        }
    }

    /// Keep at most `max_levels` undo steps (0 = unlimited)
    pub fn with_history_limit(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self.trim();
        self
    }

    /// The current snapshot
    pub fn current(&self) -> &Arc<Document> {
        // history is never empty
        &self.history[self.history.len() - 1].document
    }

    pub fn root(&self) -> &Arc<Node> {
        self.current().root()
    }

    pub fn set_callback(&mut self, callback: impl FnMut(&MutationInfo) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Apply a single edit function as one undo step
    pub fn mutate<'a, F>(&mut self, description: impl Into<String>, edit: F) -> ProjectResult<MutationInfo>
    where
        F: FnOnce(&mut DocumentBuilder) -> DocumentResult<()> + 'a,
    {
        let edit: Edit<'a> = Box::new(edit);
        self.mutate_batch(description, vec![edit])
    }

    /// Apply edit functions in order as one undo step.
    ///
    /// Each function sees the result of the previous one. If a function
    /// fails, the remaining ones are skipped, functions that already ran
    /// stay committed, and the callback is not invoked.
    pub fn mutate_batch(
        &mut self,
        description: impl Into<String>,
        edits: Vec<Edit<'_>>,
    ) -> ProjectResult<MutationInfo> {
        let description = description.into();
        let original = self.current().clone();
        let mut committed = 0;

        for edit in edits {
            let mut builder = DocumentBuilder::new(self.current());
            if let Err(err) = edit(&mut builder) {
                if committed > 0 {
                    warn!(
                        description = %description,
                        committed,
                        error = %err,
                        "Batch failed after partial commit"
                    );
                }
                return Err(ProjectError::Document(err));
            }
            builder.fixup_connections();
            let document = Arc::new(builder.build());

            if committed == 0 {
                self.push(HistoryEntry {
                    document,
                    description: Some(description.clone()),
                });
            } else if let Some(top) = self.history.last_mut() {
                top.document = document;
            }
            committed += 1;
        }

        let info = MutationInfo::compare(&original, self.current());
        debug!(
            description = %description,
            steps = committed,
            depth = self.history.len(),
            changes = %info,
            "Committed mutation"
        );
        if committed > 0 {
            self.notify(&info);
        }
        Ok(info)
    }

    /// Return to the previous snapshot
    pub fn undo(&mut self) -> ProjectResult<MutationInfo> {
        if !self.can_undo() {
            return Err(ProjectError::NothingToUndo);
        }
        let Some(entry) = self.history.pop() else {
            return Err(ProjectError::NothingToUndo);
        };

        let info = MutationInfo::compare(&entry.document, self.current());
        debug!(
            description = entry.description.as_deref().unwrap_or(""),
            depth = self.history.len(),
            changes = %info,
            "Undo"
        );
        self.redo.push(entry);
        self.notify(&info);
        Ok(info)
    }

    /// Reapply the most recently undone snapshot
    pub fn redo(&mut self) -> ProjectResult<MutationInfo> {
        let entry = self.redo.pop().ok_or(ProjectError::NothingToRedo)?;

        let info = MutationInfo::compare(self.current(), &entry.document);
        debug!(
            description = entry.description.as_deref().unwrap_or(""),
            depth = self.history.len() + 1,
            changes = %info,
            "Redo"
        );
        self.history.push(entry);
        self.notify(&info);
        Ok(info)
    }

    pub fn can_undo(&self) -> bool {
        self.history.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.history.len() - 1
    }

    pub fn redo_levels(&self) -> usize {
        self.redo.len()
    }

    /// Description of the step `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.history.last().and_then(|e| e.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().and_then(|e| e.description.as_deref())
    }

    /// Drop all history, keeping the current snapshot
    pub fn clear_history(&mut self) {
        let keep = self.history.len() - 1;
        self.history.drain(..keep);
        self.redo.clear();
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        self.trim();
        self.redo.clear();
    }

    fn trim(&mut self) {
        if self.max_levels > 0 && self.history.len() > self.max_levels + 1 {
            let excess = self.history.len() - self.max_levels - 1;
            self.history.drain(..excess);
        }
    }

    fn notify(&mut self, info: &MutationInfo) {
        if let Some(callback) = self.callback.as_mut() {
            callback(info);
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("nodes", &self.current().len())
            .field("undo_levels", &self.undo_levels())
            .field("redo_levels", &self.redo_levels())
            .field("max_levels", &self.max_levels)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DocumentError;
    use animgraph_model::{ContentHash, Registry, TITLE_PROPERTY};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn registry() -> Arc<Registry> {
        Registry::builder()
            .node_type("Shape", |t| t.property(TITLE_PROPERTY, "shape"))
            .build()
    }

    fn titled(registry: &Registry, title: &str) -> Arc<Node> {
        let node = Node::new(registry, ContentHash::of("Shape")).unwrap();
        let mut builder = node.builder();
        builder
            .set_property(ContentHash::of(TITLE_PROPERTY), 0.0, title)
            .unwrap();
        Arc::new(builder.build())
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new();
        assert_eq!(project.undo_levels(), 0);
        assert_eq!(project.redo_levels(), 0);
        assert!(!project.can_undo());
        assert!(!project.can_redo());
        assert_eq!(project.current().len(), 1);
    }

    #[test]
    fn test_mutate_undo_redo() {
        let registry = registry();
        let mut project = Project::new();
        let a = titled(&registry, "a");

        project
            .mutate("Add a", |doc| doc.append(None, [a.clone()]))
            .unwrap();
        assert_eq!(project.undo_levels(), 1);
        assert_eq!(project.undo_description(), Some("Add a"));

        let info = project.undo().unwrap();
        assert_eq!(info.nodes.removed().count(), 1);
        assert!(project.current().find_by_title("a").is_none());
        assert_eq!(project.redo_description(), Some("Add a"));

        let info = project.redo().unwrap();
        assert_eq!(info.nodes.added().count(), 1);
        assert!(project.current().find_by_title("a").is_some());
        assert_eq!(project.redo_levels(), 0);
    }

    #[test]
    fn test_empty_stacks_are_errors() {
        let mut project = Project::new();
        assert_eq!(project.undo().unwrap_err(), ProjectError::NothingToUndo);
        assert_eq!(project.redo().unwrap_err(), ProjectError::NothingToRedo);
    }

    #[test]
    fn test_new_commit_clears_redo() {
        let registry = registry();
        let mut project = Project::new();
        let (a, b) = (titled(&registry, "a"), titled(&registry, "b"));

        project.mutate("a", |doc| doc.append(None, [a.clone()])).unwrap();
        project.undo().unwrap();
        assert!(project.can_redo());

        project.mutate("b", |doc| doc.append(None, [b.clone()])).unwrap();
        assert!(!project.can_redo());
    }

    #[test]
    fn test_batch_is_one_step_with_one_callback() {
        let registry = registry();
        let mut project = Project::new();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        project.set_callback(move |info| sink.borrow_mut().push(info.nodes.len()));

        let (a, b) = (titled(&registry, "a"), titled(&registry, "b"));
        let edits: Vec<Edit> = vec![
            Box::new(|doc: &mut DocumentBuilder| doc.append(None, [a.clone()])),
            Box::new(|doc: &mut DocumentBuilder| {
                let parent = doc
                    .node(a.id())
                    .cloned()
                    .ok_or(DocumentError::NodeNotFound(a.id()))?;
                doc.append(Some(parent.as_ref()), [b.clone()])
            }),
        ];
        project.mutate_batch("a and b", edits).unwrap();

        assert_eq!(project.undo_levels(), 1);
        assert_eq!(*calls.borrow(), vec![2]);
        assert_eq!(project.current().depth(&b), Some(2));
    }

    #[test]
    fn test_failed_batch_keeps_earlier_steps() {
        let registry = registry();
        let mut project = Project::new();
        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        project.set_callback(move |_| *sink.borrow_mut() += 1);

        let a = titled(&registry, "a");
        let stranger = titled(&registry, "stranger");
        let edits: Vec<Edit> = vec![
            Box::new(|doc: &mut DocumentBuilder| doc.append(None, [a.clone()])),
            Box::new(|doc: &mut DocumentBuilder| doc.erase([&stranger])),
        ];
        let err = project.mutate_batch("partial", edits).unwrap_err();

        assert_eq!(
            err,
            ProjectError::Document(DocumentError::NodeNotFound(stranger.id()))
        );
        assert!(project.current().exists(&a));
        assert_eq!(project.undo_levels(), 1);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_history_limit() {
        let registry = registry();
        let mut project = Project::new().with_history_limit(2);

        for title in ["a", "b", "c"] {
            let node = titled(&registry, title);
            project.mutate(title, |doc| doc.append(None, [node])).unwrap();
        }

        assert_eq!(project.undo_levels(), 2);
        project.undo().unwrap();
        project.undo().unwrap();
        assert!(!project.can_undo());
        assert!(project.current().find_by_title("a").is_some());
        assert!(project.current().find_by_title("b").is_none());
    }
}
