use crate::{
    cancel::Cancellation,
    error::{GraphError, Result},
    models::*,
    reader::LevelReader,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Index of a node inside [`Tree::nodes`]
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub namespace: String,
    pub name: String,
    /// Relation label to the distinct nodes reached through it
    pub children: BTreeMap<String, Vec<NodeId>>,
}

impl TreeNode {
    fn new(vertex: &Vertex) -> Self {
        Self {
            namespace: vertex.namespace.clone(),
            name: vertex.name.clone(),
            children: BTreeMap::new(),
        }
    }

    pub fn vertex(&self) -> Vertex {
        Vertex::new(&self.namespace, &self.name)
    }

    fn link(&mut self, relation: &str, child: NodeId) {
        let slot = self.children.entry(relation.to_string()).or_default();
        if !slot.contains(&child) {
            slot.push(child);
        }
    }
}

/// Outgoing relation structure below a start vertex.
///
/// Nodes live in an arena and each vertex appears exactly once, so a vertex
/// reachable along several paths is shared by all of its parents and cycles
/// become back-references instead of infinite nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub root: NodeId,
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn with_root(vertex: &Vertex) -> Self {
        Self {
            root: 0,
            nodes: vec![TreeNode::new(vertex)],
        }
    }

    fn push(&mut self, vertex: &Vertex) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::new(vertex));
        id
    }

    fn link(&mut self, parent: NodeId, relation: &str, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.link(relation, child);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.node(self.root)
    }

    pub fn find(&self, vertex: &Vertex) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.namespace == vertex.namespace && node.name == vertex.name)
    }

    /// Vertices reached from `id` through `relation`, in discovery order
    pub fn children(&self, id: NodeId, relation: &str) -> Vec<Vertex> {
        self.node(id)
            .and_then(|node| node.children.get(relation))
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| self.node(*child))
                    .map(TreeNode::vertex)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Materializes the forward neighbourhood of a vertex as a [`Tree`]
pub struct TreeBuilder {
    reader: Arc<LevelReader>,
}

impl TreeBuilder {
    pub fn new(reader: Arc<LevelReader>) -> Self {
        Self { reader }
    }

    /// Fails with [`GraphError::NotFound`] when `start` has no outgoing
    /// edges at all, regardless of `max_depth`.
    pub async fn build(
        &self,
        cancel: &Cancellation,
        start: &Vertex,
        max_depth: usize,
    ) -> Result<Tree> {
        let root_edges = self.reader.fetch(cancel, Edge::outgoing(start)).await?;
        if root_edges.is_empty() {
            return Err(GraphError::NotFound);
        }

        let mut tree = Tree::with_root(start);
        let mut index: AHashMap<Vertex, NodeId> = AHashMap::new();
        index.insert(start.clone(), tree.root);

        let mut frontier = vec![start.clone()];
        let mut frontier_ids = vec![tree.root];
        let mut adjacency = vec![root_edges];
        let mut depth = 0usize;

        while !frontier.is_empty() && depth < max_depth {
            if depth > 0 {
                adjacency = self
                    .reader
                    .fetch_level(cancel, &frontier, Direction::Forward)
                    .await?;
            }

            let mut next = Vec::new();
            let mut next_ids = Vec::new();
            for (parent, edges) in frontier_ids.iter().zip(adjacency.drain(..)) {
                for edge in edges {
                    let object = edge.object();
                    let child = match index.get(&object).copied() {
                        Some(id) => id,
                        None => {
                            let id = tree.push(&object);
                            index.insert(object.clone(), id);
                            next.push(object);
                            next_ids.push(id);
                            id
                        }
                    };
                    tree.link(*parent, &edge.relation, child);
                }
            }

            frontier = next;
            frontier_ids = next_ids;
            depth += 1;
        }

        debug!("Tree below {} holds {} nodes", start, tree.len());
        Ok(tree)
    }
}
