//! # Mutation Info
//!
//! Structural diff between two document snapshots, classified per entity
//! kind for incremental view updates.
//!
//! ## Matching
//!
//! - **Nodes** match by identity. Present in both: a change is reported
//!   when the instance, the parent or the sibling index differs.
//! - **Properties / connectors** are compared only for matched nodes whose
//!   instance changed, and match by content hash within that node.
//!   Added and removed nodes carry their properties and connectors with
//!   them and produce no entries of their own.
//! - **Connections** match by value. An endpoint change shows up as a
//!   removal plus an addition; there is no mutated connection.
//!
//! ## Ordering
//!
//! Each [`ChangeSet`] is stored Added, then Mutated, then Removed, which
//! is the order a consumer should apply them: indices of the old tree stay
//! valid until removals, which shift siblings, run last.
//!
//! - Added: by `(cur_index, cur_parent)`
//! - Mutated: by `(prev_index, cur_index, prev_parent, cur_parent)`
//! - Removed: by `(prev_index, prev_parent)`

use crate::document::Document;
use animgraph_model::{Connection, ConnectorMetadata, Node, NodeId, Property};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Mutated,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => f.write_str("added"),
            ChangeKind::Mutated => f.write_str("mutated"),
            ChangeKind::Removed => f.write_str("removed"),
        }
    }
}

/// One changed entity. `prev_*` fields describe it in the previous
/// snapshot, `cur_*` fields in the current one; each side is `None` when
/// the entity does not exist there.
///
/// For nodes the parent is the tree parent and the index the sibling
/// index. For properties and connectors the parent is the owning node and
/// the index the position in its list. Connections have no parent; the
/// index is the position in the connection list.
#[derive(Debug, Clone)]
pub struct Change<T> {
    pub prev: Option<Arc<T>>,
    pub cur: Option<Arc<T>>,
    pub kind: ChangeKind,
    pub prev_parent: Option<Arc<Node>>,
    pub cur_parent: Option<Arc<Node>>,
    pub prev_index: Option<usize>,
    pub cur_index: Option<usize>,
}

type SortKey = (ChangeKind, Option<usize>, Option<usize>, Option<NodeId>, Option<NodeId>);

impl<T> Change<T> {
    fn added(cur: Arc<T>, parent: Option<Arc<Node>>, index: Option<usize>) -> Self {
        Self {
            prev: None,
            cur: Some(cur),
            kind: ChangeKind::Added,
            prev_parent: None,
            cur_parent: parent,
            prev_index: None,
            cur_index: index,
        }
    }

    fn removed(prev: Arc<T>, parent: Option<Arc<Node>>, index: Option<usize>) -> Self {
        Self {
            prev: Some(prev),
            cur: None,
            kind: ChangeKind::Removed,
            prev_parent: parent,
            cur_parent: None,
            prev_index: index,
            cur_index: None,
        }
    }

    fn mutated(
        prev: Arc<T>,
        cur: Arc<T>,
        parents: (Option<Arc<Node>>, Option<Arc<Node>>),
        indices: (Option<usize>, Option<usize>),
    ) -> Self {
        Self {
            prev: Some(prev),
            cur: Some(cur),
            kind: ChangeKind::Mutated,
            prev_parent: parents.0,
            cur_parent: parents.1,
            prev_index: indices.0,
            cur_index: indices.1,
        }
    }

    fn sort_key(&self) -> SortKey {
        let prev_parent = self.prev_parent.as_ref().map(|p| p.id());
        let cur_parent = self.cur_parent.as_ref().map(|p| p.id());
        match self.kind {
            ChangeKind::Added => (self.kind, self.cur_index, None, cur_parent, None),
            ChangeKind::Removed => (self.kind, self.prev_index, None, prev_parent, None),
            ChangeKind::Mutated => (
                self.kind,
                self.prev_index,
                self.cur_index,
                prev_parent,
                cur_parent,
            ),
        }
    }

    /// The current instance, or the previous one for removals
    pub fn item(&self) -> Option<&Arc<T>> {
        self.cur.as_ref().or(self.prev.as_ref())
    }
}

/// Ordered changes for one entity kind
#[derive(Debug, Clone)]
pub struct ChangeSet<T> {
    changes: Vec<Change<T>>,
}

impl<T> ChangeSet<T> {
    fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    fn push(&mut self, change: Change<T>) {
        self.changes.push(change);
    }

    fn finish(mut self) -> Self {
        self.changes.sort_by_cached_key(Change::sort_key);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change<T>> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &Change<T>> {
        self.changes.iter().filter(move |c| c.kind == kind)
    }

    pub fn added(&self) -> impl Iterator<Item = &Change<T>> {
        self.of_kind(ChangeKind::Added)
    }

    pub fn mutated(&self) -> impl Iterator<Item = &Change<T>> {
        self.of_kind(ChangeKind::Mutated)
    }

    pub fn removed(&self) -> impl Iterator<Item = &Change<T>> {
        self.of_kind(ChangeKind::Removed)
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.added().count(),
            self.mutated().count(),
            self.removed().count(),
        )
    }
}

impl<'a, T> IntoIterator for &'a ChangeSet<T> {
    type Item = &'a Change<T>;
    type IntoIter = std::slice::Iter<'a, Change<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Everything that changed between two snapshots
#[derive(Debug, Clone)]
pub struct MutationInfo {
    pub nodes: ChangeSet<Node>,
    pub properties: ChangeSet<Property>,
    pub connectors: ChangeSet<ConnectorMetadata>,
    pub connections: ChangeSet<Connection>,
}

impl MutationInfo {
    pub fn compare(prev: &Document, cur: &Document) -> Self {
        let mut nodes = ChangeSet::new();
        let mut properties = ChangeSet::new();
        let mut connectors = ChangeSet::new();

        for prev_node in prev.nodes() {
            let prev_parent = prev.parent(prev_node).cloned();
            let prev_index = prev.child_index(prev_node);

            let Some(cur_node) = cur.node(prev_node.id()) else {
                nodes.push(Change::removed(prev_node.clone(), prev_parent, prev_index));
                continue;
            };

            let cur_parent = cur.parent(cur_node).cloned();
            let cur_index = cur.child_index(cur_node);
            let replaced = !Arc::ptr_eq(prev_node, cur_node);
            let moved = prev_parent.as_ref().map(|p| p.id()) != cur_parent.as_ref().map(|p| p.id())
                || prev_index != cur_index;

            if replaced {
                diff_properties(prev_node, cur_node, &mut properties);
                diff_connectors(prev_node, cur_node, &mut connectors);
            }
            if replaced || moved {
                nodes.push(Change::mutated(
                    prev_node.clone(),
                    cur_node.clone(),
                    (prev_parent, cur_parent),
                    (prev_index, cur_index),
                ));
            }
        }

        for cur_node in cur.nodes() {
            if prev.node(cur_node.id()).is_none() {
                nodes.push(Change::added(
                    cur_node.clone(),
                    cur.parent(cur_node).cloned(),
                    cur.child_index(cur_node),
                ));
            }
        }

        Self {
            nodes: nodes.finish(),
            properties: properties.finish(),
            connectors: connectors.finish(),
            connections: diff_connections(prev, cur).finish(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.properties.is_empty()
            && self.connectors.is_empty()
            && self.connections.is_empty()
    }
}

fn diff_properties(prev: &Arc<Node>, cur: &Arc<Node>, out: &mut ChangeSet<Property>) {
    let parents = || (Some(prev.clone()), Some(cur.clone()));

    for (prev_index, prev_prop) in prev.properties().iter().enumerate() {
        let found = cur
            .properties()
            .iter()
            .position(|p| p.hash() == prev_prop.hash());
        match found {
            None => out.push(Change::removed(prev_prop.clone(), Some(prev.clone()), Some(prev_index))),
            Some(cur_index) => {
                let cur_prop = &cur.properties()[cur_index];
                if !Arc::ptr_eq(prev_prop, cur_prop) {
                    out.push(Change::mutated(
                        prev_prop.clone(),
                        cur_prop.clone(),
                        parents(),
                        (Some(prev_index), Some(cur_index)),
                    ));
                }
            }
        }
    }

    for (cur_index, cur_prop) in cur.properties().iter().enumerate() {
        if prev.property(cur_prop.hash()).is_none() {
            out.push(Change::added(cur_prop.clone(), Some(cur.clone()), Some(cur_index)));
        }
    }
}

fn diff_connectors(prev: &Arc<Node>, cur: &Arc<Node>, out: &mut ChangeSet<ConnectorMetadata>) {
    let parents = || (Some(prev.clone()), Some(cur.clone()));

    for (prev_index, prev_conn) in prev.connectors().iter().enumerate() {
        let found = cur
            .connectors()
            .iter()
            .position(|c| c.hash == prev_conn.hash);
        match found {
            None => out.push(Change::removed(prev_conn.clone(), Some(prev.clone()), Some(prev_index))),
            Some(cur_index) => {
                let cur_conn = &cur.connectors()[cur_index];
                if !Arc::ptr_eq(prev_conn, cur_conn) {
                    out.push(Change::mutated(
                        prev_conn.clone(),
                        cur_conn.clone(),
                        parents(),
                        (Some(prev_index), Some(cur_index)),
                    ));
                }
            }
        }
    }

    for (cur_index, cur_conn) in cur.connectors().iter().enumerate() {
        if prev.connector(cur_conn.hash).is_none() {
            out.push(Change::added(cur_conn.clone(), Some(cur.clone()), Some(cur_index)));
        }
    }
}

fn diff_connections(prev: &Document, cur: &Document) -> ChangeSet<Connection> {
    let mut out = ChangeSet::new();
    let prev_set: HashSet<&Connection> = prev.connections().iter().map(|c| c.as_ref()).collect();
    let cur_set: HashSet<&Connection> = cur.connections().iter().map(|c| c.as_ref()).collect();

    for (index, connection) in prev.connections().iter().enumerate() {
        if !cur_set.contains(connection.as_ref()) {
            out.push(Change::removed(connection.clone(), None, Some(index)));
        }
    }
    for (index, connection) in cur.connections().iter().enumerate() {
        if !prev_set.contains(connection.as_ref()) {
            out.push(Change::added(connection.clone(), None, Some(index)));
        }
    }
    out
}

impl fmt::Display for MutationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets = [
            ("nodes", self.nodes.counts()),
            ("properties", self.properties.counts()),
            ("connectors", self.connectors.counts()),
            ("connections", self.connections.counts()),
        ];
        let parts: Vec<String> = sets
            .iter()
            .map(|(name, (added, mutated, removed))| {
                format!("{}: +{} ~{} -{}", name, added, mutated, removed)
            })
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;
    use animgraph_model::{ConnectorRole, ContentHash, Registry};

    fn registry() -> Arc<Registry> {
        Registry::builder()
            .node_type("Shape", |t| t.property("int", 0i64).input("in").output("out"))
            .build()
    }

    fn shape(registry: &Registry) -> Arc<Node> {
        Arc::new(Node::new(registry, ContentHash::of("Shape")).unwrap())
    }

    #[test]
    fn test_identical_documents_have_no_changes() {
        let doc = Document::new();
        let info = MutationInfo::compare(&doc, &doc);
        assert!(info.is_empty());
    }

    #[test]
    fn test_added_entries_sorted_by_index() {
        let registry = registry();
        let (a, b, c) = (shape(&registry), shape(&registry), shape(&registry));
        let prev = Document::new();

        let mut builder = DocumentBuilder::new(&prev);
        builder.append(None, [c.clone(), a.clone(), b.clone()]).unwrap();
        let cur = builder.build();

        let info = MutationInfo::compare(&prev, &cur);
        let ids: Vec<_> = info.nodes.added().map(|c| c.cur.as_ref().unwrap().id()).collect();
        assert_eq!(ids, vec![c.id(), a.id(), b.id()]);
        assert!(info.properties.is_empty());
    }

    #[test]
    fn test_groups_ordered_added_mutated_removed() {
        let registry = registry();
        let (a, b, c) = (shape(&registry), shape(&registry), shape(&registry));

        let mut builder = DocumentBuilder::new(&Document::new());
        builder.append(None, [a.clone(), b.clone()]).unwrap();
        let prev = builder.build();

        let mut builder = DocumentBuilder::new(&prev);
        builder.erase([&a]).unwrap();
        builder.append(None, [c.clone()]).unwrap();
        let cur = builder.build();

        let info = MutationInfo::compare(&prev, &cur);
        let kinds: Vec<_> = info.nodes.iter().map(|c| c.kind).collect();
        // b shifted from index 1 to 0
        assert_eq!(
            kinds,
            vec![ChangeKind::Added, ChangeKind::Mutated, ChangeKind::Removed]
        );
        let moved = info.nodes.mutated().next().unwrap();
        assert_eq!(moved.prev_index, Some(1));
        assert_eq!(moved.cur_index, Some(0));
        assert!(Arc::ptr_eq(moved.prev.as_ref().unwrap(), moved.cur.as_ref().unwrap()));
    }

    #[test]
    fn test_property_and_connector_changes() {
        let registry = registry();
        let a = shape(&registry);

        let mut builder = DocumentBuilder::new(&Document::new());
        builder.append(None, [a.clone()]).unwrap();
        let prev = builder.build();

        let mut builder = DocumentBuilder::new(&prev);
        builder
            .mutate(&a, |n| {
                n.set_property(ContentHash::of("int"), 0.0, 4i64)?;
                n.add_connector(ConnectorMetadata::new("extra", ConnectorRole::Input))?;
                Ok(())
            })
            .unwrap();
        let cur = builder.build();

        let info = MutationInfo::compare(&prev, &cur);
        assert_eq!(info.nodes.len(), 1);
        assert_eq!(info.properties.mutated().count(), 1);
        assert_eq!(info.connectors.added().count(), 1);

        let added = info.connectors.added().next().unwrap();
        assert_eq!(added.cur_index, Some(2));
        assert_eq!(added.cur_parent.as_ref().unwrap().id(), a.id());
    }

    #[test]
    fn test_connection_endpoint_change_is_remove_plus_add() {
        let registry = registry();
        let (a, b) = (shape(&registry), shape(&registry));

        let mut builder = DocumentBuilder::new(&Document::new());
        builder.append(None, [a.clone(), b.clone()]).unwrap();
        builder
            .connect(
                Connection::new(
                    a.clone(),
                    a.connector(ContentHash::of("out")).unwrap().clone(),
                    b.clone(),
                    b.connector(ContentHash::of("in")).unwrap().clone(),
                )
                .unwrap(),
            )
            .unwrap();
        let prev = builder.build();

        let mut builder = DocumentBuilder::new(&prev);
        builder
            .mutate(&b, |n| n.set_property(ContentHash::of("int"), 0.0, 1i64).map(|_| ()))
            .unwrap();
        let cur = builder.build();

        let info = MutationInfo::compare(&prev, &cur);
        assert_eq!(info.connections.added().count(), 1);
        assert_eq!(info.connections.removed().count(), 1);
        assert_eq!(info.connections.mutated().count(), 0);
        assert_eq!(
            info.to_string(),
            "nodes: +0 ~1 -0, properties: +0 ~1 -0, connectors: +0 ~0 -0, connections: +1 ~0 -1"
        );
    }
}
