//! # Document Builder
//!
//! Copy-on-write editor producing a new [`Document`] from an existing one.
//!
//! ## Semantics
//!
//! - Nodes are addressed by identity: passing an older instance of a node
//!   edits whatever instance is current in the builder.
//! - `mutate` replaces a node in place (same parent, same children) and
//!   marks connections for fixup.
//! - `erase` removes a node together with its descendants. To keep the
//!   children, `reparent` them first.
//! - `fixup_connections` must run after the last structural edit: it
//!   re-points connections at the current instance of each endpoint and
//!   drops connections whose endpoints left the tree. `build` runs it if edits are pending.
//!
//! A builder is single-use and owned by one caller for the duration of
//! one edit function.

use crate::document::{Branch, Document};
use crate::errors::{DocumentError, DocumentResult};
use animgraph_model::{Connection, ModelResult, Node, NodeBuilder, NodeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

pub struct DocumentBuilder {
    tree: Arc<Branch>,
    /// Current instance of every node in the working tree
    nodes: HashMap<NodeId, Arc<Node>>,
    parents: HashMap<NodeId, NodeId>,
    connections: Vec<Arc<Connection>>,
    /// Node edits happened since the last fixup
    pending_fixup: bool,
}

impl DocumentBuilder {
    pub fn new(document: &Document) -> Self {
        let mut nodes = HashMap::with_capacity(document.len());
        let mut parents = HashMap::with_capacity(document.len());
        for node in document.nodes() {
            nodes.insert(node.id(), node.clone());
            if let Some(parent) = document.parent(node) {
                parents.insert(node.id(), parent.id());
            }
        }

        Self {
            tree: document.tree().clone(),
            nodes,
            parents,
            connections: document.connections().to_vec(),
            pending_fixup: false,
        }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.tree.node
    }

    /// Current instance of the node with this identity
    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(&id)
    }

    pub fn exists(&self, node: &Node) -> bool {
        self.nodes.contains_key(&node.id())
    }

    pub fn parent(&self, node: &Node) -> Option<&Arc<Node>> {
        self.parents.get(&node.id()).and_then(|p| self.nodes.get(p))
    }

    pub fn connections(&self) -> &[Arc<Connection>] {
        &self.connections
    }

    /// Replace `node` with the result of `edit`, keeping its position and
    /// children. Returns the replacement.
    pub fn mutate<F>(&mut self, node: &Node, edit: F) -> DocumentResult<Arc<Node>>
    where
        F: FnOnce(&mut NodeBuilder) -> ModelResult<()>,
    {
        let id = node.id();
        let current = self.current(id)?;

        let mut builder = current.builder();
        edit(&mut builder)?;
        let replacement = Arc::new(builder.build());

        self.branch_mut(id)?.node = replacement.clone();
        self.nodes.insert(id, replacement.clone());
        self.pending_fixup = true;
        Ok(replacement)
    }

    /// Insert new nodes as siblings right before `before`, in order
    pub fn insert_before<I>(&mut self, before: &Node, nodes: I) -> DocumentResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        self.current(before.id())?;
        let parent = *self
            .parents
            .get(&before.id())
            .ok_or(DocumentError::RootNode)?;
        let nodes = self.check_new(nodes)?;

        let branch = self.branch_mut(parent)?;
        let mut index = branch
            .children
            .iter()
            .position(|c| c.node.id() == before.id())
            .ok_or(DocumentError::NodeNotFound(before.id()))?;
        for node in &nodes {
            branch.children.insert(index, Arc::new(Branch::leaf(node.clone())));
            index += 1;
        }

        self.register(parent, nodes);
        Ok(())
    }

    /// Append new nodes as the last children of `parent` (the root when
    /// `None`), in order
    pub fn append<I>(&mut self, parent: Option<&Node>, nodes: I) -> DocumentResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        let parent = match parent {
            Some(parent) => self.current(parent.id())?.id(),
            None => self.tree.node.id(),
        };
        let nodes = self.check_new(nodes)?;

        let branch = self.branch_mut(parent)?;
        branch
            .children
            .extend(nodes.iter().map(|n| Arc::new(Branch::leaf(n.clone()))));

        self.register(parent, nodes);
        Ok(())
    }

    /// Remove each node and its descendants
    pub fn erase<I>(&mut self, nodes: I) -> DocumentResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<Node>,
    {
        let ids = self.check_existing(nodes)?;

        for id in ids {
            // Already gone with an earlier node's subtree
            if !self.nodes.contains_key(&id) {
                continue;
            }
            let branch = self.detach(id)?;
            self.forget(&branch);
        }

        self.pending_fixup = true;
        Ok(())
    }

    /// Remove all descendants of each node, keeping the nodes themselves
    pub fn erase_children<I>(&mut self, nodes: I) -> DocumentResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<Node>,
    {
        let ids: Vec<NodeId> = nodes.into_iter().map(|n| n.as_ref().id()).collect();
        for id in &ids {
            self.current(*id)?;
        }

        for id in ids {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            let children = std::mem::take(&mut self.branch_mut(id)?.children);
            for child in &children {
                self.forget(child);
            }
        }

        self.pending_fixup = true;
        Ok(())
    }

    /// Move each node, with its subtree, to the end of `new_parent`'s
    /// children. Relative order of `nodes` is preserved.
    pub fn reparent<I>(&mut self, new_parent: &Node, nodes: I) -> DocumentResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<Node>,
    {
        let parent = self.current(new_parent.id())?.id();
        let ids = self.check_existing(nodes)?;
        for id in &ids {
            if self.is_ancestor_or_self(*id, parent) {
                return Err(DocumentError::CycleDetected { node: *id, parent });
            }
        }

        for id in ids {
            let branch = self.detach(id)?;
            self.branch_mut(parent)?.children.push(branch);
            self.parents.insert(id, parent);
        }

        Ok(())
    }

    /// Add a connection. Endpoints are re-pointed at their current
    /// instances in this builder.
    pub fn connect(&mut self, connection: Connection) -> DocumentResult<()> {
        let output = self.current(connection.output_node().id())?;
        let input = self.current(connection.input_node().id())?;

        let connection = if Arc::ptr_eq(&output, connection.output_node())
            && Arc::ptr_eq(&input, connection.input_node())
        {
            connection
        } else {
            connection.with_nodes(output, input)?
        };

        if self.connections.iter().any(|c| **c == connection) {
            return Err(DocumentError::DuplicateConnection);
        }
        self.connections.push(Arc::new(connection));
        Ok(())
    }

    /// Remove a connection, returning whether it was present
    pub fn disconnect(&mut self, connection: &Connection) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| **c != *connection);
        self.connections.len() != before
    }

    /// Re-point connections at current node instances and drop those whose
    /// endpoints are no longer in the tree. Untouched connections keep
    /// their instance.
    pub fn fixup_connections(&mut self) {
        let connections = std::mem::take(&mut self.connections);
        let mut kept = Vec::with_capacity(connections.len());

        for connection in connections {
            let output = self.nodes.get(&connection.output_node().id()).cloned();
            let input = self.nodes.get(&connection.input_node().id()).cloned();

            match (output, input) {
                (Some(output), Some(input)) => {
                    if Arc::ptr_eq(&output, connection.output_node())
                        && Arc::ptr_eq(&input, connection.input_node())
                    {
                        kept.push(connection);
                        continue;
                    }
                    match connection.with_nodes(output, input) {
                        Ok(moved) => kept.push(Arc::new(moved)),
                        Err(err) => debug!(
                            output = %connection.output_node().id(),
                            input = %connection.input_node().id(),
                            %err,
                            "Dropping connection to removed connector"
                        ),
                    }
                }
                _ => {
                    debug!(
                        output = %connection.output_node().id(),
                        input = %connection.input_node().id(),
                        "Dropping connection to erased node"
                    );
                }
            }
        }

        self.connections = kept;
        self.pending_fixup = false;
    }

    pub fn build(mut self) -> Document {
        if self.pending_fixup {
            self.fixup_connections();
        }
        Document::from_parts(self.tree, self.connections)
    }

    fn current(&self, id: NodeId) -> DocumentResult<Arc<Node>> {
        self.nodes
            .get(&id)
            .cloned()
            .ok_or(DocumentError::NodeNotFound(id))
    }

    fn check_new<I>(&self, nodes: I) -> DocumentResult<Vec<Arc<Node>>>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        let nodes: Vec<Arc<Node>> = nodes.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for node in &nodes {
            if self.nodes.contains_key(&node.id()) || !seen.insert(node.id()) {
                return Err(DocumentError::NodeAlreadyPresent(node.id()));
            }
        }
        Ok(nodes)
    }

    /// Identities of `nodes`, all present and none the root
    fn check_existing<I>(&self, nodes: I) -> DocumentResult<Vec<NodeId>>
    where
        I: IntoIterator,
        I::Item: AsRef<Node>,
    {
        let root = self.tree.node.id();
        nodes
            .into_iter()
            .map(|node| {
                let id = node.as_ref().id();
                if id == root {
                    return Err(DocumentError::RootNode);
                }
                self.current(id).map(|_| id)
            })
            .collect()
    }

    fn register(&mut self, parent: NodeId, nodes: Vec<Arc<Node>>) {
        for node in nodes {
            self.parents.insert(node.id(), parent);
            self.nodes.insert(node.id(), node);
        }
    }

    /// Drop a detached subtree from the lookup maps
    fn forget(&mut self, branch: &Branch) {
        let mut stack = vec![branch];
        while let Some(branch) = stack.pop() {
            let id = branch.node.id();
            self.nodes.remove(&id);
            self.parents.remove(&id);
            stack.extend(branch.children.iter().map(|c| &**c));
        }
    }

    /// Unlink a node's branch from its parent and return it
    fn detach(&mut self, id: NodeId) -> DocumentResult<Arc<Branch>> {
        let parent = *self.parents.get(&id).ok_or(DocumentError::RootNode)?;
        let branch = self.branch_mut(parent)?;
        let index = branch
            .children
            .iter()
            .position(|c| c.node.id() == id)
            .ok_or(DocumentError::NodeNotFound(id))?;
        Ok(branch.children.remove(index))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parents.get(&node) {
                Some(parent) => node = *parent,
                None => return false,
            }
        }
    }

    /// Path-copy from the root down to `id` and return its branch
    fn branch_mut(&mut self, id: NodeId) -> DocumentResult<&mut Branch> {
        let mut path = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.parents.get(&cursor) {
            path.push(cursor);
            cursor = *parent;
        }
        if cursor != self.tree.node.id() {
            return Err(DocumentError::NodeNotFound(id));
        }

        let mut branch = Arc::make_mut(&mut self.tree);
        for step in path.into_iter().rev() {
            let index = branch
                .children
                .iter()
                .position(|c| c.node.id() == step)
                .ok_or(DocumentError::NodeNotFound(step))?;
            branch = Arc::make_mut(&mut branch.children[index]);
        }
        Ok(branch)
    }
}
