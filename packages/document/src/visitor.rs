use crate::document::Document;
use animgraph_model::{Connection, ConnectorMetadata, Node, Property};

/// Visitor pattern for traversing a document snapshot
///
/// Default implementations walk the whole tree depth-first in child order,
/// each node's properties and connectors, then the connection list.
/// Override specific visit_* methods to act on entities.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    /// `depth` is 0 for the root
    fn visit_node(&mut self, doc: &Document, node: &Node, depth: usize) {
        walk_node(self, doc, node, depth);
    }

    fn visit_property(&mut self, _node: &Node, _property: &Property) {
        // Leaf, nothing to walk
    }

    fn visit_connector(&mut self, _node: &Node, _connector: &ConnectorMetadata) {
        // Leaf, nothing to walk
    }

    fn visit_connection(&mut self, _connection: &Connection) {
        // Leaf, nothing to walk
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    visitor.visit_node(doc, doc.root(), 0);
    for connection in doc.connections() {
        visitor.visit_connection(connection);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, doc: &Document, node: &Node, depth: usize) {
    for property in node.properties() {
        visitor.visit_property(node, property);
    }
    for connector in node.connectors() {
        visitor.visit_connector(node, connector);
    }
    for child in doc.children(node) {
        visitor.visit_node(doc, child, depth + 1);
    }
}
