//! Error types for the node model

use crate::id::{ContentHash, NodeId};
use crate::value::ValueType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(ContentHash),

    #[error("Unknown property {property} on node type {owner}")]
    UnknownProperty {
        owner: ContentHash,
        property: ContentHash,
    },

    #[error("Property {property} already present on node {node}")]
    DuplicateProperty { node: NodeId, property: ContentHash },

    #[error("Unknown connector {connector} on node {node}")]
    UnknownConnector { node: NodeId, connector: ContentHash },

    #[error("Connector {connector} already present on node {node}")]
    DuplicateConnector { node: NodeId, connector: ContentHash },

    #[error("Property {property} holds {expected} values, got {actual}")]
    ValueTypeMismatch {
        property: ContentHash,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Frame {frame} of property {property} is not a finite number")]
    InvalidFrame { property: ContentHash, frame: f64 },

    #[error("Invalid {value_type} value: {text:?}")]
    InvalidValue { value_type: ValueType, text: String },

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
