//! # Node Type Registry
//!
//! Read-only catalogue of node types: for each type hash, the ordered
//! property metadata (title, default value) and the connector metadata
//! (title, role) every node of that type starts with.
//!
//! The registry is built once with [`RegistryBuilder`] and then shared
//! behind an `Arc`. Node construction and deserialization take it as an
//! explicit argument.
//!
//! ```rust,ignore
//! let registry = Registry::builder()
//!     .node_type("Transform", |t| {
//!         t.property("title", "transform")
//!             .property("position", Vec2::new(0.0, 0.0))
//!             .input("parent")
//!             .output("matrix")
//!     })
//!     .build();
//! ```

use crate::id::ContentHash;
use crate::value::{PropertyValue, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Title of the property used to name nodes
pub const TITLE_PROPERTY: &str = "title";

/// Describes one property slot of a node type
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMetadata {
    /// Type hash of the node type that declares this property
    pub owner: ContentHash,
    pub hash: ContentHash,
    pub title: String,
    /// Value returned while the property has no keyframes; also fixes
    /// the property's value type
    pub default: PropertyValue,
}

impl PropertyMetadata {
    pub fn new(owner: ContentHash, title: impl Into<String>, default: impl Into<PropertyValue>) -> Self {
        let title = title.into();
        Self {
            owner,
            hash: ContentHash::of(&title),
            title,
            default: default.into(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.default.value_type()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorRole {
    Input,
    Output,
}

impl fmt::Display for ConnectorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorRole::Input => f.write_str("input"),
            ConnectorRole::Output => f.write_str("output"),
        }
    }
}

/// A named attachment point on a node.
///
/// Shared connectors come from the node type; local ones are added to a
/// single node instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorMetadata {
    pub hash: ContentHash,
    pub title: String,
    pub role: ConnectorRole,
    pub is_local: bool,
}

impl ConnectorMetadata {
    pub fn new(title: impl Into<String>, role: ConnectorRole) -> Self {
        let title = title.into();
        Self {
            hash: ContentHash::of(&title),
            title,
            role,
            is_local: false,
        }
    }

    pub fn local(title: impl Into<String>, role: ConnectorRole) -> Self {
        Self {
            is_local: true,
            ..Self::new(title, role)
        }
    }
}

/// Everything the registry knows about one node type
#[derive(Debug)]
pub struct NodeTypeMetadata {
    pub hash: ContentHash,
    pub title: String,
    pub properties: Vec<Arc<PropertyMetadata>>,
    pub connectors: Arc<[Arc<ConnectorMetadata>]>,
}

impl NodeTypeMetadata {
    pub fn property(&self, hash: ContentHash) -> Option<&Arc<PropertyMetadata>> {
        self.properties.iter().find(|p| p.hash == hash)
    }

    pub fn connector(&self, hash: ContentHash) -> Option<&Arc<ConnectorMetadata>> {
        self.connectors.iter().find(|c| c.hash == hash)
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    types: HashMap<ContentHash, Arc<NodeTypeMetadata>>,
    /// Registration order, for listing
    order: Vec<ContentHash>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a node type. The root type hash never has metadata.
    pub fn get(&self, hash: ContentHash) -> Option<&Arc<NodeTypeMetadata>> {
        if hash.is_root() {
            return None;
        }
        self.types.get(&hash)
    }

    pub fn by_title(&self, title: &str) -> Option<&Arc<NodeTypeMetadata>> {
        self.get(ContentHash::of(title))
    }

    /// Property metadata declared by `owner` under `hash`
    pub fn property(&self, owner: ContentHash, hash: ContentHash) -> Option<&Arc<PropertyMetadata>> {
        self.get(owner).and_then(|t| t.property(hash))
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<NodeTypeMetadata>> {
        self.order.iter().filter_map(|hash| self.types.get(hash))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// Register a node type. Registering the same title twice replaces the
    /// earlier definition.
    pub fn node_type(
        mut self,
        title: impl Into<String>,
        define: impl FnOnce(NodeTypeBuilder) -> NodeTypeBuilder,
    ) -> Self {
        let metadata = define(NodeTypeBuilder::new(title.into())).build();
        let hash = metadata.hash;
        if self.registry.types.insert(hash, Arc::new(metadata)).is_none() {
            self.registry.order.push(hash);
        }
        self
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(self.registry)
    }
}

pub struct NodeTypeBuilder {
    hash: ContentHash,
    title: String,
    properties: Vec<Arc<PropertyMetadata>>,
    connectors: Vec<Arc<ConnectorMetadata>>,
}

impl NodeTypeBuilder {
    fn new(title: String) -> Self {
        Self {
            hash: ContentHash::of(&title),
            title,
            properties: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub fn property(mut self, title: impl Into<String>, default: impl Into<PropertyValue>) -> Self {
        self.properties
            .push(Arc::new(PropertyMetadata::new(self.hash, title, default)));
        self
    }

    pub fn connector(mut self, title: impl Into<String>, role: ConnectorRole) -> Self {
        self.connectors
            .push(Arc::new(ConnectorMetadata::new(title, role)));
        self
    }

    pub fn input(self, title: impl Into<String>) -> Self {
        self.connector(title, ConnectorRole::Input)
    }

    pub fn output(self, title: impl Into<String>) -> Self {
        self.connector(title, ConnectorRole::Output)
    }

    fn build(self) -> NodeTypeMetadata {
        NodeTypeMetadata {
            hash: self.hash,
            title: self.title,
            properties: self.properties,
            connectors: self.connectors.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vec2;

    fn registry() -> Arc<Registry> {
        Registry::builder()
            .node_type("Transform", |t| {
                t.property(TITLE_PROPERTY, "transform")
                    .property("position", Vec2::new(0.0, 0.0))
                    .input("parent")
                    .output("matrix")
            })
            .node_type("Text", |t| t.property("content", ""))
            .build()
    }

    #[test]
    fn test_lookup_by_title_and_hash() {
        let registry = registry();
        let transform = registry.by_title("Transform").unwrap();
        assert_eq!(transform.hash, ContentHash::of("Transform"));
        assert_eq!(transform.properties.len(), 2);
        assert_eq!(transform.connectors.len(), 2);

        let position = registry
            .property(transform.hash, ContentHash::of("position"))
            .unwrap();
        assert_eq!(position.owner, transform.hash);
        assert_eq!(position.value_type(), ValueType::Vec2);
    }

    #[test]
    fn test_missing_entries_return_none() {
        let registry = registry();
        assert!(registry.get(ContentHash::of("Nope")).is_none());
        assert!(registry.get(ContentHash::ROOT).is_none());
        assert!(registry
            .property(ContentHash::of("Text"), ContentHash::of("position"))
            .is_none());
    }

    #[test]
    fn test_types_listed_in_registration_order() {
        let registry = registry();
        let titles: Vec<_> = registry.types().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Transform", "Text"]);
    }

    #[test]
    fn test_local_connector_flag() {
        let shared = ConnectorMetadata::new("in", ConnectorRole::Input);
        let local = ConnectorMetadata::local("in", ConnectorRole::Input);
        assert!(!shared.is_local);
        assert!(local.is_local);
        assert_eq!(shared.hash, local.hash);
    }
}
