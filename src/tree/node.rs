use std::fmt::{Debug, Display};

use super::{EdgeId, NodeId};

#[derive(Clone)]
/// A node of the Tree.
///
/// Nodes are created by the owning [`Tree`](super::Tree) and connected through
/// [`Tree::connect_nodes`](super::Tree::connect_nodes). The neighbor list and
/// the edge list are always the same length: `edges[i]` links this node to
/// `neighbors[i]`.
pub struct Node {
    /// Index of the node in the tree arena
    pub(crate) id: NodeId,
    /// Name of the node, empty for most internal nodes
    pub(crate) name: String,
    /// Comments attached to the node
    pub(crate) comments: Vec<String>,
    /// Indices of neighboring nodes
    pub(crate) neighbors: Vec<NodeId>,
    /// Indices of incident edges, aligned with `neighbors`
    pub(crate) edges: Vec<EdgeId>,
    /// Longest path in edges from this node to a tip of its subtree
    pub(crate) subtree_depth: Option<usize>,
    /// Rank of the tip in the sorted tip names, i.e. its bit in bipartitions
    pub(crate) tip_rank: Option<usize>,
    /// Opaque character states seen from above the node, never interpreted by the tree
    pub(crate) upstates: Vec<Vec<u8>>,
    /// Opaque character states seen from below the node
    pub(crate) downstates: Vec<Vec<u8>>,
    // Whether the node is deleted or not
    pub(crate) deleted: bool,
}

impl Node {
    /// Creates a new Node
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            name: String::new(),
            comments: vec![],
            neighbors: Vec::with_capacity(3),
            edges: Vec::with_capacity(3),
            subtree_depth: None,
            tip_rank: None,
            upstates: vec![],
            downstates: vec![],
            deleted: false,
        }
    }

    /// Empties the node and sets it as deleted
    pub(crate) fn delete(&mut self) {
        *self = Self::new(self.id);
        self.deleted = true;
    }

    /// Index of the node within its tree
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the node name. Unicity is not checked until the tip index is built.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Adds a comment to the node, written as `[comment]` in newick output
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Comments attached to the node
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Removes all comments from the node
    pub fn clear_comments(&mut self) {
        self.comments.clear();
    }

    /// Comments of the node joined by commas and surrounded by brackets
    pub fn comments_string(&self) -> String {
        format!("[{}]", self.comments.join(","))
    }

    /// Neighbors of the node, in stored order
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Edges incident to the node, aligned with [`Node::neighbors`]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Number of neighbors
    pub fn n_neighbors(&self) -> usize {
        self.neighbors.len()
    }

    /// Position of a neighbor in the neighbor list
    pub fn neighbor_position(&self, neighbor: &NodeId) -> Option<usize> {
        self.neighbors.iter().position(|n| n == neighbor)
    }

    /// Check if the node is a tip node (exactly one neighbor)
    pub fn is_tip(&self) -> bool {
        self.neighbors.len() == 1
    }

    /// Upward character states attached to the node
    pub fn upstates(&self) -> &[Vec<u8>] {
        &self.upstates
    }

    /// Replaces the upward character states of the node
    pub fn set_upstates(&mut self, states: Vec<Vec<u8>>) {
        self.upstates = states;
    }

    /// Downward character states attached to the node
    pub fn downstates(&self) -> &[Vec<u8>] {
        &self.downstates
    }

    /// Replaces the downward character states of the node
    pub fn set_downstates(&mut self, states: Vec<Vec<u8>>) {
        self.downstates = states;
    }

    pub(crate) fn push_neighbor(&mut self, neighbor: NodeId, edge: EdgeId) {
        self.neighbors.push(neighbor);
        self.edges.push(edge);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.comments == other.comments
            && self.neighbors.len() == other.neighbors.len()
    }
}

impl Eq for Node {}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} Id[{}] Rank[{:?}] Depth[{:?}] Comments[{:?}] Neighbors({:?}) Edges({:?})",
            self.name,
            self.id,
            self.tip_rank,
            self.subtree_depth,
            self.comments,
            self.neighbors,
            self.edges,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tip_status_follows_degree() {
        let mut node = Node::new(0);
        assert!(!node.is_tip());
        node.push_neighbor(1, 0);
        assert!(node.is_tip());
        node.push_neighbor(2, 1);
        assert!(!node.is_tip());
        assert_eq!(node.neighbor_position(&2), Some(1));
        assert_eq!(node.neighbors().len(), node.edges().len());
    }

    #[test]
    fn comments_string() {
        let mut node = Node::new(0);
        node.add_comment("a=1");
        node.add_comment("b");
        assert_eq!(node.comments_string(), "[a=1,b]");
        node.clear_comments();
        assert_eq!(node.comments_string(), "[]");
    }

    #[test]
    fn delete_resets_node() {
        let mut node = Node::new(4);
        node.set_name("A");
        node.push_neighbor(1, 0);
        node.set_upstates(vec![b"AC".to_vec()]);
        node.set_downstates(vec![b"GT".to_vec()]);
        node.delete();
        assert!(node.deleted);
        assert_eq!(node.id(), 4);
        assert!(node.name().is_empty());
        assert!(node.neighbors().is_empty());
        assert!(node.upstates().is_empty());
        assert!(node.downstates().is_empty());
    }
}
