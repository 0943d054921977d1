//! # Nodes
//!
//! An immutable entity of the document tree. Every edit goes through a
//! [`NodeBuilder`] and yields a new `Node` instance that keeps the same
//! [`NodeId`], so snapshots can share untouched nodes and still match
//! edited ones by identity.

use crate::error::{ModelError, ModelResult};
use crate::id::{combine_hashes, ContentHash, NodeId};
use crate::property::{Frame, Property, PropertyBuilder};
use crate::registry::{ConnectorMetadata, PropertyMetadata, Registry, TITLE_PROPERTY};
use crate::value::PropertyValue;
use std::sync::{Arc, OnceLock};

pub type ConnectorList = Arc<[Arc<ConnectorMetadata>]>;

#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    type_hash: ContentHash,
    properties: Vec<Arc<Property>>,
    /// Connectors declared by the node type, shared by all its instances
    shared_connectors: ConnectorList,
    /// Connectors added to this instance only
    local_connectors: Vec<Arc<ConnectorMetadata>>,
    /// shared ++ local, built on first use
    combined: OnceLock<CombinedConnectors>,
}

#[derive(Debug, Clone)]
struct CombinedConnectors {
    local_hash: ContentHash,
    list: ConnectorList,
}

impl CombinedConnectors {
    fn build(shared: &ConnectorList, local: &[Arc<ConnectorMetadata>]) -> Self {
        Self {
            local_hash: local_hash(local),
            list: shared.iter().chain(local.iter()).cloned().collect(),
        }
    }
}

fn local_hash(local: &[Arc<ConnectorMetadata>]) -> ContentHash {
    combine_hashes(local.iter().map(|c| c.hash))
}

impl Node {
    /// Create a node of a registered type with default properties and the
    /// type's connectors
    pub fn new(registry: &Registry, type_hash: ContentHash) -> ModelResult<Self> {
        Self::with_id(registry, NodeId::new(), type_hash)
    }

    /// Like [`Node::new`] but with a known identity (used when loading)
    pub fn with_id(registry: &Registry, id: NodeId, type_hash: ContentHash) -> ModelResult<Self> {
        let metadata = registry
            .get(type_hash)
            .ok_or(ModelError::UnknownNodeType(type_hash))?;

        Ok(Self {
            id,
            type_hash,
            properties: metadata
                .properties
                .iter()
                .map(|m| Arc::new(Property::new(m.clone())))
                .collect(),
            shared_connectors: metadata.connectors.clone(),
            local_connectors: Vec::new(),
            combined: OnceLock::new(),
        })
    }

    /// The synthetic document root: root type hash, no properties
    pub fn root() -> Self {
        Self::root_with_id(NodeId::new())
    }

    pub fn root_with_id(id: NodeId) -> Self {
        Self {
            id,
            type_hash: ContentHash::ROOT,
            properties: Vec::new(),
            shared_connectors: Arc::from(Vec::new()),
            local_connectors: Vec::new(),
            combined: OnceLock::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn type_hash(&self) -> ContentHash {
        self.type_hash
    }

    pub fn is_root(&self) -> bool {
        self.type_hash.is_root()
    }

    pub fn properties(&self) -> &[Arc<Property>] {
        &self.properties
    }

    pub fn property(&self, hash: ContentHash) -> Option<&Arc<Property>> {
        self.properties.iter().find(|p| p.hash() == hash)
    }

    pub fn property_by_title(&self, title: &str) -> Option<&Arc<Property>> {
        self.property(ContentHash::of(title))
    }

    /// Sample a property at `frame`, if the node has it
    pub fn value(&self, hash: ContentHash, frame: Frame) -> Option<PropertyValue> {
        self.property(hash).map(|p| p.get(frame))
    }

    /// String value of the `title` property at frame 0
    pub fn title(&self) -> Option<String> {
        match self.property_by_title(TITLE_PROPERTY)?.get(0.0) {
            PropertyValue::String(title) => Some(title),
            _ => None,
        }
    }

    pub fn shared_connectors(&self) -> &[Arc<ConnectorMetadata>] {
        &self.shared_connectors
    }

    pub fn local_connectors(&self) -> &[Arc<ConnectorMetadata>] {
        &self.local_connectors
    }

    /// Shared connectors followed by local ones
    pub fn connectors(&self) -> &[Arc<ConnectorMetadata>] {
        &self
            .combined
            .get_or_init(|| CombinedConnectors::build(&self.shared_connectors, &self.local_connectors))
            .list
    }

    pub fn connector(&self, hash: ContentHash) -> Option<&Arc<ConnectorMetadata>> {
        self.connectors().iter().find(|c| c.hash == hash)
    }

    pub fn builder(&self) -> NodeBuilder {
        NodeBuilder {
            id: self.id,
            type_hash: self.type_hash,
            properties: self.properties.clone(),
            shared_connectors: self.shared_connectors.clone(),
            local_connectors: self.local_connectors.clone(),
            cached: self.combined.get().cloned(),
        }
    }
}

impl AsRef<Node> for Node {
    fn as_ref(&self) -> &Node {
        self
    }
}

/// Produces an edited copy of a [`Node`] with the same identity
#[derive(Debug)]
pub struct NodeBuilder {
    id: NodeId,
    type_hash: ContentHash,
    properties: Vec<Arc<Property>>,
    shared_connectors: ConnectorList,
    local_connectors: Vec<Arc<ConnectorMetadata>>,
    cached: Option<CombinedConnectors>,
}

impl NodeBuilder {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Append a property instance (no keys) described by `metadata`
    pub fn add_property(&mut self, metadata: Arc<PropertyMetadata>) -> ModelResult<&mut Self> {
        if self.properties.iter().any(|p| p.hash() == metadata.hash) {
            return Err(ModelError::DuplicateProperty {
                node: self.id,
                property: metadata.hash,
            });
        }
        self.properties.push(Arc::new(Property::new(metadata)));
        Ok(self)
    }

    /// Replace the property with the given hash by the result of `edit`
    pub fn mutate_property<F>(&mut self, hash: ContentHash, edit: F) -> ModelResult<&mut Self>
    where
        F: FnOnce(&mut PropertyBuilder) -> ModelResult<()>,
    {
        let index = self
            .properties
            .iter()
            .position(|p| p.hash() == hash)
            .ok_or(ModelError::UnknownProperty {
                owner: self.type_hash,
                property: hash,
            })?;

        let mut builder = self.properties[index].builder();
        edit(&mut builder)?;
        self.properties[index] = Arc::new(builder.build());
        Ok(self)
    }

    /// Set a single key on an existing property
    pub fn set_property(
        &mut self,
        hash: ContentHash,
        frame: Frame,
        value: impl Into<PropertyValue>,
    ) -> ModelResult<&mut Self> {
        let value = value.into();
        self.mutate_property(hash, |p| p.set(frame, value).map(|_| ()))
    }

    /// Replace the property with the same hash, or append it
    pub fn put_property(&mut self, property: Property) -> &mut Self {
        let hash = property.hash();
        let property = Arc::new(property);
        match self.properties.iter_mut().find(|p| p.hash() == hash) {
            Some(slot) => *slot = property,
            None => self.properties.push(property),
        }
        self
    }

    /// Add an instance-local connector
    pub fn add_connector(&mut self, mut metadata: ConnectorMetadata) -> ModelResult<&mut Self> {
        let exists = self
            .shared_connectors
            .iter()
            .chain(self.local_connectors.iter())
            .any(|c| c.hash == metadata.hash);
        if exists {
            return Err(ModelError::DuplicateConnector {
                node: self.id,
                connector: metadata.hash,
            });
        }

        metadata.is_local = true;
        self.local_connectors.push(Arc::new(metadata));
        Ok(self)
    }

    pub fn build(self) -> Node {
        let combined = OnceLock::new();
        if let Some(cached) = self.cached {
            if cached.local_hash == local_hash(&self.local_connectors) {
                let _ = combined.set(cached);
            }
        }

        Node {
            id: self.id,
            type_hash: self.type_hash,
            properties: self.properties,
            shared_connectors: self.shared_connectors,
            local_connectors: self.local_connectors,
            combined,
        }
    }
}
