//! Error types for documents, projects and persistence

use animgraph_model::{ContentHash, ModelError, NodeId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node already in the document: {0}")]
    NodeAlreadyPresent(NodeId),

    #[error("Operation not allowed on the root node")]
    RootNode,

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("Connection already exists")]
    DuplicateConnection,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Failures while saving or loading a project
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Parent {parent} of node {child} has not been loaded")]
    UnknownParent { parent: NodeId, child: NodeId },

    #[error("Connection references unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} appears more than once")]
    DuplicateNode(NodeId),

    #[error("Local connector {0} is missing its title or role")]
    MalformedConnector(ContentHash),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
pub type ProjectResult<T> = Result<T, ProjectError>;
pub type PersistResult<T> = Result<T, PersistError>;
