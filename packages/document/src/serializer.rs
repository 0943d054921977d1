//! # Persistence
//!
//! JSON form of a project: the current document only. History and redo
//! are not persisted; a loaded project starts with a single-entry history.
//!
//! The tree is stored flat: the root node, then `(parent, node)` pairs in
//! depth-first order so every parent is written before its children.
//!
//! Connectors declared by the node type are stored by hash alone and
//! resolved against the registry when loading. Local connectors carry their
//! title and role.

use crate::builder::DocumentBuilder;
use crate::document::Document;
use crate::errors::{PersistError, PersistResult};
use crate::project::Project;
use animgraph_model::{
    Connection, ConnectorMetadata, ConnectorRole, ContentHash, Keyframe, ModelError, Node,
    NodeId, PropertyBuilder, Registry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProject {
    /// Identity of the document root
    pub root: NodeId,
    pub document: PersistedDocument,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    pub root: PersistedNode,
    #[serde(default)]
    pub children: Vec<PersistedChild>,
    #[serde(default)]
    pub connections: Vec<PersistedConnection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedChild {
    pub parent: NodeId,
    pub node: PersistedNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNode {
    pub id: NodeId,
    pub type_hash: ContentHash,
    #[serde(default)]
    pub properties: Vec<PersistedProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_connectors: Vec<PersistedConnector>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProperty {
    /// Type hash of the node type declaring the property
    pub owner: ContentHash,
    pub hash: ContentHash,
    #[serde(default)]
    pub keys: Vec<Keyframe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConnector {
    pub hash: ContentHash,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ConnectorRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConnection {
    pub output_node: NodeId,
    pub output_connector: PersistedConnector,
    pub input_node: NodeId,
    pub input_connector: PersistedConnector,
}

pub fn to_json(project: &Project) -> PersistResult<String> {
    let document = encode_document(project.current());
    let persisted = PersistedProject {
        root: document.root.id,
        document,
    };
    Ok(serde_json::to_string_pretty(&persisted)?)
}

pub fn from_json(json: &str, registry: &Registry) -> PersistResult<Project> {
    let persisted: PersistedProject = serde_json::from_str(json)?;
    if persisted.root != persisted.document.root.id {
        return Err(PersistError::UnknownNode(persisted.root));
    }
    let document = decode_document(&persisted.document, registry)?;
    Ok(Project::from_document(document))
}

pub fn encode_document(document: &Document) -> PersistedDocument {
    let children = document
        .nodes()
        .iter()
        .filter_map(|node| {
            document.parent(node).map(|parent| PersistedChild {
                parent: parent.id(),
                node: encode_node(node),
            })
        })
        .collect();

    PersistedDocument {
        root: encode_node(document.root()),
        children,
        connections: document
            .connections()
            .iter()
            .map(|c| encode_connection(c))
            .collect(),
    }
}

fn encode_node(node: &Node) -> PersistedNode {
    PersistedNode {
        id: node.id(),
        type_hash: node.type_hash(),
        properties: node
            .properties()
            .iter()
            .map(|p| PersistedProperty {
                owner: p.owner(),
                hash: p.hash(),
                keys: p.keys().to_vec(),
            })
            .collect(),
        local_connectors: node
            .local_connectors()
            .iter()
            .map(|c| encode_connector(c))
            .collect(),
    }
}

fn encode_connector(connector: &ConnectorMetadata) -> PersistedConnector {
    if connector.is_local {
        PersistedConnector {
            hash: connector.hash,
            is_local: true,
            title: Some(connector.title.clone()),
            role: Some(connector.role),
        }
    } else {
        PersistedConnector {
            hash: connector.hash,
            is_local: false,
            title: None,
            role: None,
        }
    }
}

fn encode_connection(connection: &Connection) -> PersistedConnection {
    PersistedConnection {
        output_node: connection.output_node().id(),
        output_connector: encode_connector(connection.output_connector()),
        input_node: connection.input_node().id(),
        input_connector: encode_connector(connection.input_connector()),
    }
}

pub fn decode_document(persisted: &PersistedDocument, registry: &Registry) -> PersistResult<Document> {
    let root = decode_node(&persisted.root, registry)?;
    let mut seen = HashSet::from([root.id()]);
    let mut builder = DocumentBuilder::new(&Document::with_root(Arc::new(root)));

    for child in &persisted.children {
        if !seen.insert(child.node.id) {
            return Err(PersistError::DuplicateNode(child.node.id));
        }
        let parent = builder
            .node(child.parent)
            .cloned()
            .ok_or(PersistError::UnknownParent {
                parent: child.parent,
                child: child.node.id,
            })?;
        let node = decode_node(&child.node, registry)?;
        builder.append(Some(parent.as_ref()), [node])?;
    }

    for connection in &persisted.connections {
        let output = builder
            .node(connection.output_node)
            .cloned()
            .ok_or(PersistError::UnknownNode(connection.output_node))?;
        let input = builder
            .node(connection.input_node)
            .cloned()
            .ok_or(PersistError::UnknownNode(connection.input_node))?;
        let output_connector = resolve_connector(&output, &connection.output_connector)?;
        let input_connector = resolve_connector(&input, &connection.input_connector)?;

        builder.connect(Connection::new(output, output_connector, input, input_connector)?)?;
    }

    Ok(builder.build())
}

fn decode_node(persisted: &PersistedNode, registry: &Registry) -> PersistResult<Node> {
    let node = if persisted.type_hash.is_root() {
        Node::root_with_id(persisted.id)
    } else {
        Node::with_id(registry, persisted.id, persisted.type_hash)?
    };
    let mut builder = node.builder();

    for property in &persisted.properties {
        let metadata = registry
            .property(property.owner, property.hash)
            .ok_or(ModelError::UnknownProperty {
                owner: property.owner,
                property: property.hash,
            })?;
        let mut keys = PropertyBuilder::new(metadata.clone());
        for key in &property.keys {
            keys.set(key.frame, key.value.clone())?;
        }
        builder.put_property(keys.build());
    }

    for connector in &persisted.local_connectors {
        let (Some(title), Some(role)) = (&connector.title, connector.role) else {
            return Err(PersistError::MalformedConnector(connector.hash));
        };
        let metadata = ConnectorMetadata::local(title.as_str(), role);
        if metadata.hash != connector.hash {
            return Err(PersistError::MalformedConnector(connector.hash));
        }
        builder.add_connector(metadata)?;
    }

    Ok(builder.build())
}

/// Find the connector instance on `node`: local ones by hash among the
/// node's own connectors, shared ones among the type's connectors
fn resolve_connector(node: &Node, persisted: &PersistedConnector) -> PersistResult<Arc<ConnectorMetadata>> {
    let candidates = if persisted.is_local {
        node.local_connectors()
    } else {
        node.shared_connectors()
    };
    candidates
        .iter()
        .find(|c| c.hash == persisted.hash)
        .cloned()
        .ok_or_else(|| {
            PersistError::Model(ModelError::UnknownConnector {
                node: node.id(),
                connector: persisted.hash,
            })
        })
}

impl Project {
    /// Write the current document as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> PersistResult<()> {
        let path = path.as_ref();
        std::fs::write(path, to_json(self)?)?;
        info!(
            path = %path.display(),
            nodes = self.current().len(),
            connections = self.current().connections().len(),
            "Saved project"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>, registry: &Registry) -> PersistResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let project = from_json(&content, registry)?;
        info!(
            path = %path.display(),
            nodes = project.current().len(),
            connections = project.current().connections().len(),
            "Loaded project"
        );
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animgraph_model::{PropertyValue, Vec2, TITLE_PROPERTY};

    fn registry() -> Arc<Registry> {
        Registry::builder()
            .node_type("Transform", |t| {
                t.property(TITLE_PROPERTY, "transform")
                    .property("position", Vec2::new(0.0, 0.0))
                    .input("in")
                    .output("out")
            })
            .build()
    }

    #[test]
    fn test_empty_project_round_trip() {
        let registry = registry();
        let project = Project::new();
        let json = to_json(&project).unwrap();
        let loaded = from_json(&json, &registry).unwrap();

        assert_eq!(loaded.root().id(), project.root().id());
        assert_eq!(loaded.current().len(), 1);
        assert!(!loaded.can_undo());
    }

    #[test]
    fn test_shared_connectors_are_stored_by_hash() {
        let registry = registry();
        let node = Node::new(&registry, ContentHash::of("Transform")).unwrap();
        let mut builder = node.builder();
        builder
            .add_connector(ConnectorMetadata::new("extra", ConnectorRole::Output))
            .unwrap();
        let node = builder.build();

        let persisted = encode_node(&node);
        assert_eq!(persisted.local_connectors.len(), 1);
        assert_eq!(persisted.local_connectors[0].title.as_deref(), Some("extra"));

        let json = serde_json::to_value(encode_connector(&node.connectors()[0])).unwrap();
        assert_eq!(json, serde_json::json!({ "hash": ContentHash::of("in"), "isLocal": false }));
    }

    #[test]
    fn test_decode_node_restores_keys() {
        let registry = registry();
        let node = Node::new(&registry, ContentHash::of("Transform")).unwrap();
        let mut builder = node.builder();
        builder
            .set_property(ContentHash::of("position"), 10.0, Vec2::new(1.0, 2.0))
            .unwrap();
        let node = builder.build();

        let decoded = decode_node(&encode_node(&node), &registry).unwrap();
        assert_eq!(decoded.id(), node.id());
        assert_eq!(
            decoded.value(ContentHash::of("position"), 10.0),
            Some(PropertyValue::Vec2(Vec2::new(1.0, 2.0)))
        );
    }

    #[test]
    fn test_unknown_type_fails() {
        let registry = registry();
        let persisted = PersistedNode {
            id: NodeId::new(),
            type_hash: ContentHash::of("Missing"),
            properties: Vec::new(),
            local_connectors: Vec::new(),
        };
        let err = decode_node(&persisted, &registry).unwrap_err();
        assert!(matches!(err, PersistError::Model(ModelError::UnknownNodeType(_))));
    }

    #[test]
    fn test_child_before_parent_fails() {
        let registry = registry();
        let orphan_parent = NodeId::new();
        let persisted = PersistedDocument {
            root: encode_node(&Node::root()),
            children: vec![PersistedChild {
                parent: orphan_parent,
                node: encode_node(&Node::new(&registry, ContentHash::of("Transform")).unwrap()),
            }],
            connections: Vec::new(),
        };
        let err = decode_document(&persisted, &registry).unwrap_err();
        assert!(matches!(err, PersistError::UnknownParent { parent, .. } if parent == orphan_parent));
    }

    #[test]
    fn test_local_connector_without_title_fails() {
        let registry = registry();
        let mut persisted = encode_node(&Node::new(&registry, ContentHash::of("Transform")).unwrap());
        persisted.local_connectors.push(PersistedConnector {
            hash: ContentHash::of("extra"),
            is_local: true,
            title: None,
            role: None,
        });
        let err = decode_node(&persisted, &registry).unwrap_err();
        assert!(matches!(err, PersistError::MalformedConnector(_)));
    }
}
