//! # Animgraph Document
//!
//! Versioned documents built on `animgraph-model`.
//!
//! ```text
//! Project ──▶ history: [Document v1, v2, v3]   redo: [v4]
//!                 │
//!                 └─ mutate(fn) ──▶ DocumentBuilder ──▶ Document v4'
//!                                                  └──▶ MutationInfo ──▶ callback
//! ```
//!
//! - [`Document`]: immutable snapshot of a node tree and its connections
//! - [`DocumentBuilder`]: copy-on-write editor producing the next snapshot
//! - [`Project`]: linear undo/redo and change notification
//! - [`MutationInfo`]: diff between two snapshots
//! - [`serializer`]: JSON persistence of a project

pub mod builder;
pub mod document;
pub mod errors;
pub mod mutation_info;
pub mod project;
pub mod serializer;
pub mod visitor;

pub use builder::DocumentBuilder;
pub use document::Document;
pub use errors::{
    DocumentError, DocumentResult, PersistError, PersistResult, ProjectError, ProjectResult,
};
pub use mutation_info::{Change, ChangeKind, ChangeSet, MutationInfo};
pub use project::{Edit, HistoryEntry, MutationCallback, Project};
pub use visitor::{walk_document, walk_node, Visitor};
