use crate::error::{ModelError, ModelResult};
use crate::node::Node;
use crate::registry::{ConnectorMetadata, ConnectorRole};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Edge from an output connector of one node to an input connector of
/// another.
///
/// Connections have no identity of their own: two connections are equal
/// when they reference the same node instances and connector instances.
/// A connection that points at an older instance of a node is therefore a
/// different connection. Connectors are always the endpoint node's own
/// instances, whichever metadata instance was passed in.
#[derive(Debug, Clone)]
pub struct Connection {
    output_node: Arc<Node>,
    output_connector: Arc<ConnectorMetadata>,
    input_node: Arc<Node>,
    input_connector: Arc<ConnectorMetadata>,
}

impl Connection {
    pub fn new(
        output_node: Arc<Node>,
        output_connector: Arc<ConnectorMetadata>,
        input_node: Arc<Node>,
        input_connector: Arc<ConnectorMetadata>,
    ) -> ModelResult<Self> {
        let output_connector = resolve_endpoint(&output_node, &output_connector, ConnectorRole::Output)?;
        let input_connector = resolve_endpoint(&input_node, &input_connector, ConnectorRole::Input)?;

        Ok(Self {
            output_node,
            output_connector,
            input_node,
            input_connector,
        })
    }

    pub fn output_node(&self) -> &Arc<Node> {
        &self.output_node
    }

    pub fn output_connector(&self) -> &Arc<ConnectorMetadata> {
        &self.output_connector
    }

    pub fn input_node(&self) -> &Arc<Node> {
        &self.input_node
    }

    pub fn input_connector(&self) -> &Arc<ConnectorMetadata> {
        &self.input_connector
    }

    /// Same connectors, new node instances for the endpoints. Fails when a
    /// new instance no longer carries the connector.
    pub fn with_nodes(&self, output_node: Arc<Node>, input_node: Arc<Node>) -> ModelResult<Self> {
        Self::new(
            output_node,
            self.output_connector.clone(),
            input_node,
            self.input_connector.clone(),
        )
    }

    /// Whether either endpoint is the node with this identity
    pub fn touches(&self, node: &Node) -> bool {
        self.output_node.id() == node.id() || self.input_node.id() == node.id()
    }
}

/// The node's own instance of `connector`, checked for `role`
fn resolve_endpoint(
    node: &Node,
    connector: &ConnectorMetadata,
    role: ConnectorRole,
) -> ModelResult<Arc<ConnectorMetadata>> {
    let own = node
        .connector(connector.hash)
        .ok_or(ModelError::UnknownConnector {
            node: node.id(),
            connector: connector.hash,
        })?;
    if own.role != role {
        return Err(ModelError::InvalidConnection(format!(
            "connector {} is an {}, expected {}",
            own.title, own.role, role
        )));
    }
    Ok(own.clone())
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.output_node, &other.output_node)
            && Arc::ptr_eq(&self.output_connector, &other.output_connector)
            && Arc::ptr_eq(&self.input_node, &other.input_node)
            && Arc::ptr_eq(&self.input_connector, &other.input_connector)
    }
}

impl Eq for Connection {}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.output_node).hash(state);
        Arc::as_ptr(&self.output_connector).hash(state);
        Arc::as_ptr(&self.input_node).hash(state);
        Arc::as_ptr(&self.input_connector).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ContentHash;
    use crate::registry::Registry;

    fn nodes() -> (Arc<Node>, Arc<Node>) {
        let registry = Registry::builder()
            .node_type("Filter", |t| t.input("in").output("out"))
            .build();
        let a = Node::new(&registry, ContentHash::of("Filter")).unwrap();
        let b = Node::new(&registry, ContentHash::of("Filter")).unwrap();
        (Arc::new(a), Arc::new(b))
    }

    fn connect(a: &Arc<Node>, b: &Arc<Node>) -> ModelResult<Connection> {
        Connection::new(
            a.clone(),
            a.connector(ContentHash::of("out")).unwrap().clone(),
            b.clone(),
            b.connector(ContentHash::of("in")).unwrap().clone(),
        )
    }

    #[test]
    fn test_valid_connection() {
        let (a, b) = nodes();
        let conn = connect(&a, &b).unwrap();
        assert!(conn.touches(&a));
        assert!(conn.touches(&b));
    }

    #[test]
    fn test_wrong_roles_rejected() {
        let (a, b) = nodes();
        let err = Connection::new(
            a.clone(),
            a.connector(ContentHash::of("in")).unwrap().clone(),
            b.clone(),
            b.connector(ContentHash::of("in")).unwrap().clone(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConnection(_)));
    }

    #[test]
    fn test_equality_is_by_instance() {
        let (a, b) = nodes();
        let first = connect(&a, &b).unwrap();
        let second = connect(&a, &b).unwrap();
        assert_eq!(first, second);

        // Same identity, new instance: a different connection
        let a2 = Arc::new(a.builder().build());
        let moved = first.with_nodes(a2, b.clone()).unwrap();
        assert_ne!(first, moved);
    }

    #[test]
    fn test_foreign_connector_instance_resolves_to_node_instance() {
        let (a, b) = nodes();
        let detached = Connection::new(
            a.clone(),
            Arc::new(ConnectorMetadata::new("out", ConnectorRole::Output)),
            b.clone(),
            Arc::new(ConnectorMetadata::new("in", ConnectorRole::Input)),
        )
        .unwrap();

        assert!(Arc::ptr_eq(
            detached.output_connector(),
            a.connector(ContentHash::of("out")).unwrap()
        ));
        assert!(Arc::ptr_eq(
            detached.input_connector(),
            b.connector(ContentHash::of("in")).unwrap()
        ));
        assert_eq!(detached, connect(&a, &b).unwrap());
    }

    #[test]
    fn test_role_checked_against_node_connector() {
        let (a, b) = nodes();
        // Claims to be an output, but the node declares "in" as an input
        let err = Connection::new(
            a.clone(),
            Arc::new(ConnectorMetadata::new("in", ConnectorRole::Output)),
            b.clone(),
            b.connector(ContentHash::of("in")).unwrap().clone(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConnection(_)));
    }
}
