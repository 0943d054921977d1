//! # Document Snapshots
//!
//! A [`Document`] is an immutable snapshot: a rooted tree of
//! `Arc<Node>` handles plus the list of connections between them.
//!
//! The tree is a persistent structure of reference-counted branches.
//! Producing a new snapshot through [`DocumentBuilder`](crate::DocumentBuilder)
//! reallocates only the branches on the path to an edit; every other
//! subtree is shared with the previous snapshot.
//!
//! ```text
//!   v1: root ─┬─ a ── a1          v2: root' ─┬─ a ── a1     (shared)
//!             └─ b                           └─ b'          (edited)
//! ```
//!
//! A lookup index (parent, sibling index, depth-first position, subtree
//! size) is built once per snapshot so every query is a hash lookup.

use animgraph_model::{Connection, ConnectorMetadata, Node, NodeId, Property};
use std::collections::HashMap;
use std::sync::Arc;

/// One tree position: a node and its ordered children
#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub(crate) node: Arc<Node>,
    pub(crate) children: Vec<Arc<Branch>>,
}

impl Branch {
    pub(crate) fn leaf(node: Arc<Node>) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    /// Position among siblings
    index: usize,
    /// Position in depth-first order
    position: usize,
    /// Number of nodes in the subtree, including the node itself
    subtree: usize,
    branch: Arc<Branch>,
}

/// Immutable snapshot of the node tree and its connections
#[derive(Debug, Clone)]
pub struct Document {
    tree: Arc<Branch>,
    connections: Vec<Arc<Connection>>,
    order: Vec<Arc<Node>>,
    slots: HashMap<NodeId, Slot>,
}

impl Document {
    /// Document holding only a fresh root node
    pub fn new() -> Self {
        Self::with_root(Arc::new(Node::root()))
    }

    pub fn with_root(root: Arc<Node>) -> Self {
        Self::from_parts(Arc::new(Branch::leaf(root)), Vec::new())
    }

    pub(crate) fn from_parts(tree: Arc<Branch>, connections: Vec<Arc<Connection>>) -> Self {
        let mut order = Vec::new();
        let mut slots = HashMap::new();
        index_branch(&tree, None, 0, &mut order, &mut slots);

        Self {
            tree,
            connections,
            order,
            slots,
        }
    }

    pub(crate) fn tree(&self) -> &Arc<Branch> {
        &self.tree
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.tree.node
    }

    /// Every node, root first, in depth-first child order
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// A document always holds its root
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn connections(&self) -> &[Arc<Connection>] {
        &self.connections
    }

    /// Connections with `node` at either end
    pub fn connections_of<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Arc<Connection>> + 'a {
        self.connections.iter().filter(move |c| c.touches(node))
    }

    /// The instance of the node with this identity in this snapshot
    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.slots.get(&id).map(|slot| &slot.branch.node)
    }

    /// Whether a node with the same identity is part of this snapshot
    pub fn exists(&self, node: &Node) -> bool {
        self.slots.contains_key(&node.id())
    }

    /// Whether this exact instance is part of this snapshot
    pub fn contains_instance(&self, node: &Arc<Node>) -> bool {
        self.node(node.id())
            .map(|current| Arc::ptr_eq(current, node))
            .unwrap_or(false)
    }

    pub fn parent(&self, node: &Node) -> Option<&Arc<Node>> {
        let parent = self.slots.get(&node.id())?.parent?;
        self.node(parent)
    }

    pub fn child(&self, parent: &Node, index: usize) -> Option<&Arc<Node>> {
        self.slots
            .get(&parent.id())?
            .branch
            .children
            .get(index)
            .map(|b| &b.node)
    }

    pub fn children<'a>(&'a self, parent: &Node) -> impl Iterator<Item = &'a Arc<Node>> + 'a {
        self.slots
            .get(&parent.id())
            .into_iter()
            .flat_map(|slot| slot.branch.children.iter().map(|b| &b.node))
    }

    /// Position of the node among its siblings (the root is at 0)
    pub fn child_index(&self, node: &Node) -> Option<usize> {
        self.slots.get(&node.id()).map(|slot| slot.index)
    }

    /// Position of the node in depth-first order
    pub fn position(&self, node: &Node) -> Option<usize> {
        self.slots.get(&node.id()).map(|slot| slot.position)
    }

    /// Number of direct children; 0 for nodes not in the document
    pub fn child_count(&self, node: &Node) -> usize {
        self.slots
            .get(&node.id())
            .map(|slot| slot.branch.children.len())
            .unwrap_or(0)
    }

    /// Size of the subtree below `node`, excluding the node itself;
    /// 0 for nodes not in the document
    pub fn total_child_count(&self, node: &Node) -> usize {
        self.slots
            .get(&node.id())
            .map(|slot| slot.subtree - 1)
            .unwrap_or(0)
    }

    /// Nodes in the subtree rooted at `node`, in depth-first order
    pub fn subtree(&self, node: &Node) -> &[Arc<Node>] {
        match self.slots.get(&node.id()) {
            Some(slot) => &self.order[slot.position..slot.position + slot.subtree],
            None => &[],
        }
    }

    /// Depth below the root (the root is at 0)
    pub fn depth(&self, node: &Node) -> Option<usize> {
        let mut slot = self.slots.get(&node.id())?;
        let mut depth = 0;
        while let Some(parent) = slot.parent {
            slot = self.slots.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: &Node, node: &Node) -> bool {
        match (self.slots.get(&ancestor.id()), self.slots.get(&node.id())) {
            (Some(a), Some(n)) => n.position >= a.position && n.position < a.position + a.subtree,
            _ => false,
        }
    }

    /// First node whose `title` property equals `title`
    pub fn find_by_title(&self, title: &str) -> Option<&Arc<Node>> {
        self.order
            .iter()
            .find(|node| node.title().as_deref() == Some(title))
    }

    /// Node owning this exact property instance
    pub fn property_parent(&self, property: &Property) -> Option<&Arc<Node>> {
        self.order.iter().find(|node| {
            node.properties()
                .iter()
                .any(|p| std::ptr::eq(p.as_ref(), property))
        })
    }

    pub fn property_index(&self, property: &Property) -> Option<usize> {
        self.property_parent(property)?
            .properties()
            .iter()
            .position(|p| std::ptr::eq(p.as_ref(), property))
    }

    /// First node listing this exact connector instance. Type-shared
    /// connectors resolve to the first node of that type.
    pub fn connector_parent(&self, connector: &ConnectorMetadata) -> Option<&Arc<Node>> {
        self.order.iter().find(|node| {
            node.connectors()
                .iter()
                .any(|c| std::ptr::eq(c.as_ref(), connector))
        })
    }

    pub fn connector_index(&self, connector: &ConnectorMetadata) -> Option<usize> {
        self.connector_parent(connector)?
            .connectors()
            .iter()
            .position(|c| std::ptr::eq(c.as_ref(), connector))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `order` and `slots` for the subtree at `branch`; returns its size
fn index_branch(
    branch: &Arc<Branch>,
    parent: Option<NodeId>,
    index: usize,
    order: &mut Vec<Arc<Node>>,
    slots: &mut HashMap<NodeId, Slot>,
) -> usize {
    let position = order.len();
    order.push(branch.node.clone());

    let mut subtree = 1;
    for (child_index, child) in branch.children.iter().enumerate() {
        subtree += index_branch(child, Some(branch.node.id()), child_index, order, slots);
    }

    slots.insert(
        branch.node.id(),
        Slot {
            parent,
            index,
            position,
            subtree,
            branch: branch.clone(),
        },
    );
    subtree
}
