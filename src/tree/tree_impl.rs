use itertools::Itertools;
use std::collections::HashMap;
use std::fmt::Display;
use std::iter::zip;

use thiserror::Error;
use tracing::debug;

use super::edge::Edge;
use super::node::Node;
use super::{EdgeId, NodeId};

/// Derived data that a [`Tree`] computes on demand and caches on its nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Mapping from tip names to tip nodes and taxon ranks
    TipIndex,
    /// Per-edge bitsets, hashes and taxon counts
    Bipartitions,
    /// Per-node subtree depths
    SubtreeDepths,
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKind::TipIndex => write!(f, "tip index"),
            IndexKind::Bipartitions => write!(f, "bipartition index"),
            IndexKind::SubtreeDepths => write!(f, "subtree depths"),
        }
    }
}

/// Errors that can occur when building, indexing and manipulating [`Tree`] structs.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree has no root node and we are trying to do something
    /// that requires a root node
    #[error("No root node found")]
    RootNotFound,
    /// The requested node with index [`NodeId`] does not exist in the tree
    #[error("There is no node with index: {0}")]
    NodeNotFound(NodeId),
    /// The requested edge with index [`EdgeId`] does not exist in the tree
    #[error("There is no edge with index: {0}")]
    EdgeNotFound(EdgeId),
    /// The node cannot be reached from the root
    #[error("Node {0} is not connected to the root")]
    Disconnected(NodeId),
    /// Derived data was queried before it was computed
    #[error("The {0} of the tree is not initialized.")]
    IndexNotInitialized(IndexKind),
    /// Derived data was queried after the topology changed
    #[error("The {0} of the tree is outdated, the tree was modified since it was computed.")]
    StaleIndex(IndexKind),
    /// The tip name is absent from the tip index
    #[error("No tip named {0} in the index")]
    TipNotFound(String),
    /// Several tips share the same name
    #[error("Cannot create a tip index when several tips are named {0:?}")]
    DuplicateTipName(String),
    /// The trees we want to compare have different tips indices
    #[error("The trees have different tips indices.")]
    DifferentTipIndices,
    /// The edge cannot be contracted
    #[error("Could not contract edge {0}, its child node is a tip or the root")]
    CannotContractEdge(EdgeId),
    /// The depth range used for collapsing is empty
    #[error("Invalid depth range: min depth {min} is greater than max depth {max}")]
    InvalidDepthRange {
        /// Lower bound of the range
        min: usize,
        /// Upper bound of the range
        max: usize,
    },
    /// There was a [`std::io::Error`] when writing the tree to a file
    #[error("Error writing tree to file")]
    IoError(#[from] std::io::Error),
}

/// Differences between the tip names of two trees
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TipDiff {
    /// Tips only present in the reference tree, in traversal order
    pub only_reference: Vec<String>,
    /// Tips only present in the compared tree, in traversal order
    pub only_compared: Vec<String>,
    /// Number of tips present in both trees
    pub common: usize,
}

impl Display for TipDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for name in self.only_reference.iter() {
            writeln!(f, "< {name}")?;
        }
        for name in self.only_compared.iter() {
            writeln!(f, "> {name}")?;
        }
        writeln!(f, "= {}", self.common)
    }
}

/// A Phylogenetic tree
///
/// The tree owns all its nodes and edges in two arenas, nodes and edges refer
/// to each other through their indices.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) root: Option<NodeId>,
    pub(crate) tip_index: HashMap<String, NodeId>,
    /// Incremented by every structural mutation
    pub(crate) version: u64,
    pub(crate) tip_index_version: Option<u64>,
    pub(crate) bipartitions_version: Option<u64>,
    pub(crate) depths_version: Option<u64>,
}

/// Base methods to add and get [`Node`] and [`Edge`] objects to and from the [`Tree`].
///
/// ----
/// ----
impl Tree {
    /// Create a new empty Tree object
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            root: None,
            tip_index: HashMap::new(),
            version: 0,
            tip_index_version: None,
            bipartitions_version: None,
            depths_version: None,
        }
    }

    // ############################
    // # ADDING AND GETTING NODES #
    // ############################

    /// Add a new unconnected node to the tree.
    /// The first node created in an empty tree becomes its root.
    pub fn new_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    /// Add a new named, unconnected node to the tree.
    pub fn new_named_node(&mut self, name: &str) -> NodeId {
        let id = self.new_node();
        self.nodes[id].set_name(name);
        id
    }

    /// Connects two nodes with a new edge directed from `parent` to `child`.
    ///
    /// # Example
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.new_node();
    /// let a = tree.new_named_node("A");
    /// let b = tree.new_named_node("B");
    ///
    /// let edge = tree.connect_nodes(&root, &a).unwrap();
    /// tree.connect_nodes(&root, &b).unwrap();
    ///
    /// assert_eq!(tree.edge(&edge).unwrap().right(), a);
    /// assert_eq!(tree.get(&root).unwrap().neighbors(), &[a, b]);
    /// assert!(tree.get(&a).unwrap().is_tip());
    /// assert!(tree.is_rooted().unwrap());
    /// ```
    pub fn connect_nodes(&mut self, parent: &NodeId, child: &NodeId) -> Result<EdgeId, TreeError> {
        self.get(parent)?;
        self.get(child)?;

        let id = self.edges.len();
        self.edges.push(Edge::new(id, *parent, *child));
        self.nodes[*parent].push_neighbor(*child, id);
        self.nodes[*child].push_neighbor(*parent, id);
        self.touch();

        Ok(id)
    }

    /// Sets the root of the tree. This does not reorient edges, use
    /// [`Tree::reroot`] to move the root of a connected tree.
    pub fn set_root(&mut self, root: &NodeId) -> Result<(), TreeError> {
        self.get(root)?;
        self.root = Some(*root);
        self.touch();
        Ok(())
    }

    /// Gets the root node. In the case of unrooted trees this node is a
    /// multifurcation point that usually has 3 neighbors.
    pub fn root(&self) -> Result<NodeId, TreeError> {
        self.root.ok_or(TreeError::RootNotFound)
    }

    /// Get a reference to a specific Node of the tree
    pub fn get(&self, id: &NodeId) -> Result<&Node, TreeError> {
        match self.nodes.get(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Get a mutable reference to a specific Node of the tree
    pub fn get_mut(&mut self, id: &NodeId) -> Result<&mut Node, TreeError> {
        match self.nodes.get_mut(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Get a reference to a specific Edge of the tree
    pub fn edge(&self, id: &EdgeId) -> Result<&Edge, TreeError> {
        match self.edges.get(*id) {
            Some(edge) if !edge.deleted => Ok(edge),
            _ => Err(TreeError::EdgeNotFound(*id)),
        }
    }

    /// Get a mutable reference to a specific Edge of the tree
    pub fn edge_mut(&mut self, id: &EdgeId) -> Result<&mut Edge, TreeError> {
        match self.edges.get_mut(*id) {
            Some(edge) if !edge.deleted => Ok(edge),
            _ => Err(TreeError::EdgeNotFound(*id)),
        }
    }

    /// Get a reference to a node in the tree by name.
    /// If several nodes match, the one with the lowest index is returned.
    pub fn get_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|node| node.name == name)
    }

    /// Iterates over the nodes of the tree in arena order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| !node.deleted)
    }

    /// Iterates over the edges of the tree in arena order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| !edge.deleted)
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        self.nodes().count()
    }

    /// Number of edges in the tree
    pub fn n_edges(&self) -> usize {
        self.edges().count()
    }

    /// Returns true if the root has exactly two neighbors
    pub fn is_rooted(&self) -> Result<bool, TreeError> {
        Ok(self.get(&self.root()?)?.n_neighbors() == 2)
    }

    /// Topology version, incremented by every structural mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The edge linking a node to its parent, [`None`] for the root
    pub fn parent_edge(&self, node: &NodeId) -> Option<EdgeId> {
        let node = self.get(node).ok()?;
        node.edges
            .iter()
            .copied()
            .find(|e| self.edges[*e].right == node.id)
    }

    /// Edges whose child side is an internal node
    pub fn internal_edges(&self) -> Vec<EdgeId> {
        self.edges()
            .filter(|e| !self.nodes[e.right].is_tip() && !self.nodes[e.left].is_tip())
            .map(|e| e.id)
            .collect()
    }

    /// Returns the node ids of the tips, in pre-order
    pub fn tips(&self) -> Result<Vec<NodeId>, TreeError> {
        let mut tips = vec![];
        self.pre_order_iterative(|current, _, _| {
            if self.nodes[current].is_tip() {
                tips.push(current);
            }
            true
        })?;
        Ok(tips)
    }

    /// Returns the tips sorted by name, i.e. in taxon rank order
    pub fn sorted_tips(&self) -> Result<Vec<NodeId>, TreeError> {
        let mut tips = self.tips()?;
        tips.sort_by(|a, b| self.nodes[*a].name.cmp(&self.nodes[*b].name));
        Ok(tips)
    }

    /// Returns the names of the tips, in pre-order
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(t3,(t1,t2),t0);").unwrap();
    /// assert_eq!(tree.all_tip_names().unwrap(), vec!["t3", "t1", "t2", "t0"]);
    /// ```
    pub fn all_tip_names(&self) -> Result<Vec<String>, TreeError> {
        Ok(self
            .tips()?
            .into_iter()
            .map(|id| self.nodes[id].name.clone())
            .collect())
    }

    /// Number of tips in the tree
    pub fn n_tips(&self) -> Result<usize, TreeError> {
        Ok(self.tips()?.len())
    }

    /// Marks every derived index as outdated
    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    /// Checks that an index was computed for the current topology
    pub(crate) fn check_index(&self, kind: IndexKind) -> Result<(), TreeError> {
        let built = match kind {
            IndexKind::TipIndex => self.tip_index_version,
            IndexKind::Bipartitions => self.bipartitions_version,
            IndexKind::SubtreeDepths => self.depths_version,
        };
        match built {
            None => Err(TreeError::IndexNotInitialized(kind)),
            Some(version) if version != self.version => Err(TreeError::StaleIndex(kind)),
            Some(_) => Ok(()),
        }
    }
}

/// Methods to build and query the tip index, which maps tip names to their rank
/// in the bipartition bitsets.
///
/// ----
/// ----
impl Tree {
    // ##############
    // # TIP INDEX  #
    // ##############

    /// Rebuilds the tip index from scratch.
    ///
    /// Tips are sorted by name (byte-wise order) and each tip gets its
    /// position in that order as rank. Fails if two tips share a name, in which
    /// case the index is left empty. Renaming tips is not a structural change,
    /// call this again after doing so.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(C,(A,D),B);").unwrap();
    /// tree.update_tip_index().unwrap();
    ///
    /// assert_eq!(tree.tip_index("A").unwrap(), 0);
    /// assert_eq!(tree.tip_index("D").unwrap(), 3);
    /// assert!(tree.tip_index("E").is_err());
    /// ```
    pub fn update_tip_index(&mut self) -> Result<(), TreeError> {
        self.tip_index.clear();
        self.tip_index_version = None;
        self.bipartitions_version = None;

        let tips = self.sorted_tips()?;
        if let Some((a, _)) = tips
            .iter()
            .tuple_windows()
            .find(|(a, b)| self.nodes[**a].name == self.nodes[**b].name)
        {
            return Err(TreeError::DuplicateTipName(self.nodes[*a].name.clone()));
        }

        for (rank, id) in tips.into_iter().enumerate() {
            self.nodes[id].tip_rank = Some(rank);
            self.tip_index.insert(self.nodes[id].name.clone(), id);
        }
        self.tip_index_version = Some(self.version);
        debug!("Indexed {} tips", self.tip_index.len());

        Ok(())
    }

    /// Assigns tip ranks from the tip index of a reference tree instead of
    /// sorting the tips of this tree. Bipartitions of both trees are then
    /// comparable. The two trees must have exactly the same tip names.
    pub fn align_tip_index(&mut self, reference: &Tree) -> Result<(), TreeError> {
        reference.check_index(IndexKind::TipIndex)?;
        self.tip_index.clear();
        self.tip_index_version = None;
        self.bipartitions_version = None;

        let tips = self.tips()?;
        if tips.len() != reference.tip_index.len() {
            return Err(TreeError::DifferentTipIndices);
        }

        let mut index = HashMap::with_capacity(tips.len());
        for id in tips {
            let name = &self.nodes[id].name;
            let rank = reference.tip_index(name)?;
            if index.insert(name.clone(), id).is_some() {
                return Err(TreeError::DuplicateTipName(name.clone()));
            }
            self.nodes[id].tip_rank = Some(rank);
        }
        self.tip_index = index;
        self.tip_index_version = Some(self.version);
        debug!("Aligned {} tips on reference index", self.tip_index.len());

        Ok(())
    }

    /// Checks that both trees have the same tip names with the same ranks
    pub fn compare_tip_indexes(&self, other: &Tree) -> Result<(), TreeError> {
        self.check_index(IndexKind::TipIndex)?;
        other.check_index(IndexKind::TipIndex)?;

        if self.tip_index.len() != other.tip_index.len() {
            return Err(TreeError::DifferentTipIndices);
        }
        for (name, id) in self.tip_index.iter() {
            match other.tip_index(name) {
                Ok(rank) if Some(rank) == self.nodes[*id].tip_rank => {}
                _ => return Err(TreeError::DifferentTipIndices),
            }
        }

        Ok(())
    }

    fn indexed_tip(&self, name: &str) -> Result<&Node, TreeError> {
        self.check_index(IndexKind::TipIndex)?;
        if self.tip_index.is_empty() {
            return Err(TreeError::IndexNotInitialized(IndexKind::TipIndex));
        }
        self.tip_index
            .get(name)
            .map(|id| &self.nodes[*id])
            .ok_or_else(|| TreeError::TipNotFound(name.to_string()))
    }

    /// Rank of the tip with the given name
    pub fn tip_index(&self, name: &str) -> Result<usize, TreeError> {
        self.indexed_tip(name)?
            .tip_rank
            .ok_or(TreeError::IndexNotInitialized(IndexKind::TipIndex))
    }

    /// Node id of the tip with the given name
    pub fn tip_id(&self, name: &str) -> Result<NodeId, TreeError> {
        Ok(self.indexed_tip(name)?.id)
    }

    /// Checks if a tip with the given name is in the index
    pub fn exists_tip(&self, name: &str) -> Result<bool, TreeError> {
        match self.indexed_tip(name) {
            Ok(_) => Ok(true),
            Err(TreeError::TipNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Rank of a tip node
    pub fn tip_rank(&self, node: &NodeId) -> Result<usize, TreeError> {
        self.check_index(IndexKind::TipIndex)?;
        self.get(node)?
            .tip_rank
            .ok_or(TreeError::IndexNotInitialized(IndexKind::TipIndex))
    }

    /// Attaches opaque character states to the tip with the given name, as its
    /// upward states
    pub fn set_tip_states(&mut self, name: &str, states: Vec<Vec<u8>>) -> Result<(), TreeError> {
        let id = self.tip_id(name)?;
        self.nodes[id].set_upstates(states);
        Ok(())
    }

    /// Lists the tips that are only in one of the two trees.
    /// Both trees must have an up to date tip index.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut reference = Tree::from_newick("(t1,t2,(t3,t4));").unwrap();
    /// let mut compared = Tree::from_newick("(t10,t2,(t3,t4));").unwrap();
    /// reference.update_tip_index().unwrap();
    /// compared.update_tip_index().unwrap();
    ///
    /// let diff = reference.diff_tips(&compared).unwrap();
    /// assert_eq!(diff.to_string(), "< t1\n> t10\n= 3\n");
    /// ```
    pub fn diff_tips(&self, other: &Tree) -> Result<TipDiff, TreeError> {
        let mut diff = TipDiff::default();

        for name in self.all_tip_names()? {
            if other.exists_tip(&name)? {
                diff.common += 1;
            } else {
                diff.only_reference.push(name);
            }
        }
        for name in other.all_tip_names()? {
            if !self.exists_tip(&name)? {
                diff.only_compared.push(name);
            }
        }

        Ok(diff)
    }
}

/// Methods that change the topology of the [`Tree`]. All of them invalidate the
/// derived indices.
///
/// ----
/// ----
impl Tree {
    // ##################
    // # ALTER THE TREE #
    // ##################

    /// Contracts an edge: its child node is removed and the other neighbors of
    /// the child are attached to the parent, at the position the child had,
    /// in the same order. The length of the removed edge is discarded. Edges
    /// with a tip at either end cannot be contracted.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,(B,C)D:0.5,E);").unwrap();
    /// let d = tree.get_by_name("D").unwrap().id();
    /// let edge = tree.parent_edge(&d).unwrap();
    ///
    /// tree.contract_edge(&edge).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(A,B,C,E);");
    /// ```
    pub fn contract_edge(&mut self, edge: &EdgeId) -> Result<(), TreeError> {
        let (parent, child) = {
            let edge = self.edge(edge)?;
            (edge.left, edge.right)
        };
        if self.get(&child)?.is_tip()
            || self.get(&parent)?.is_tip()
            || self.root == Some(child)
        {
            return Err(TreeError::CannotContractEdge(*edge));
        }
        let position = self
            .get(&parent)?
            .neighbor_position(&child)
            .ok_or(TreeError::Disconnected(child))?;

        let (moved_nodes, moved_edges): (Vec<_>, Vec<_>) = zip(
            self.nodes[child].neighbors.iter().copied(),
            self.nodes[child].edges.iter().copied(),
        )
        .filter(|(neighbor, _)| *neighbor != parent)
        .unzip();

        for (neighbor, moved) in zip(moved_nodes.iter(), moved_edges.iter()) {
            self.edges[*moved].replace_end(&child, parent);
            let node = &mut self.nodes[*neighbor];
            if let Some(i) = node.neighbor_position(&child) {
                node.neighbors[i] = parent;
            }
        }

        let parent_node = &mut self.nodes[parent];
        parent_node
            .neighbors
            .splice(position..=position, moved_nodes);
        parent_node.edges.splice(position..=position, moved_edges);

        self.nodes[child].delete();
        self.edges[*edge].delete();
        self.touch();

        Ok(())
    }

    /// Moves the root of the tree to the given node, reversing the orientation of
    /// every edge on the path between the old and the new root.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,(B,C)D,E);").unwrap();
    /// let d = tree.get_by_name("D").unwrap().id();
    ///
    /// tree.reroot(&d).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "((A,E),B,C)D;");
    /// ```
    pub fn reroot(&mut self, new_root: &NodeId) -> Result<(), TreeError> {
        self.get(new_root)?;
        let root = self.root()?;

        let mut path = vec![];
        let mut current = *new_root;
        while current != root {
            let edge = self
                .parent_edge(&current)
                .ok_or(TreeError::Disconnected(*new_root))?;
            current = self.edges[edge].left;
            path.push(edge);
        }

        for edge in path {
            let edge = &mut self.edges[edge];
            std::mem::swap(&mut edge.left, &mut edge.right);
        }
        self.root = Some(*new_root);
        self.touch();
        debug!("Rerooted tree on node {new_root}");

        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (A,B,(C,D)E)F; built by hand
    fn build_simple_tree() -> Result<Tree, TreeError> {
        let mut tree = Tree::new();
        let root = tree.new_named_node("F"); // 0
        for name in ["A", "B", "E"] {
            let child = tree.new_named_node(name); // 1, 2, 3
            tree.connect_nodes(&root, &child)?;
        }
        for name in ["C", "D"] {
            let child = tree.new_named_node(name); // 4, 5
            tree.connect_nodes(&3, &child)?;
        }

        Ok(tree)
    }

    #[test]
    fn neighbors_and_edges_stay_aligned() {
        let tree = build_simple_tree().unwrap();
        for node in tree.nodes() {
            assert_eq!(node.neighbors().len(), node.edges().len());
            for (neighbor, edge) in zip(node.neighbors(), node.edges()) {
                let edge = tree.edge(edge).unwrap();
                assert_eq!(edge.other_end(&node.id()), Some(*neighbor));
            }
        }
    }

    #[test]
    fn test_tips() {
        let tree = build_simple_tree().unwrap();
        assert_eq!(tree.tips().unwrap(), vec![1, 2, 4, 5]);
        assert_eq!(tree.all_tip_names().unwrap(), vec!["A", "B", "C", "D"]);
        assert_eq!(tree.n_tips().unwrap(), 4);
        assert!(!tree.is_rooted().unwrap());
        assert_eq!(tree.internal_edges(), vec![2]);
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = Tree::new();
        assert!(matches!(tree.root(), Err(TreeError::RootNotFound)));
        assert!(matches!(tree.tips(), Err(TreeError::RootNotFound)));
    }

    #[test]
    fn tip_index_is_a_bijection() {
        let mut tree = Tree::from_newick("((t4,t0),(t2,(t1,t3)));").unwrap();
        tree.update_tip_index().unwrap();

        let mut ranks = vec![];
        for name in tree.all_tip_names().unwrap() {
            let id = tree.tip_id(&name).unwrap();
            let rank = tree.tip_index(&name).unwrap();
            assert_eq!(tree.get(&id).unwrap().name(), name);
            assert_eq!(tree.tip_rank(&id).unwrap(), rank);
            ranks.push(rank);
        }
        ranks.sort();
        assert_eq!(ranks, (0..5).collect::<Vec<_>>());
        assert_eq!(tree.tip_index("t3").unwrap(), 3);
    }

    #[test]
    fn tip_index_errors() {
        let mut tree = Tree::from_newick("(A,B,(C,A));").unwrap();
        assert!(matches!(
            tree.tip_index("A"),
            Err(TreeError::IndexNotInitialized(IndexKind::TipIndex))
        ));
        assert!(matches!(
            tree.update_tip_index(),
            Err(TreeError::DuplicateTipName(name)) if name == "A"
        ));
        // The index is left unusable
        assert!(tree.tip_id("B").is_err());
        assert!(tree.exists_tip("B").is_err());

        let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        tree.update_tip_index().unwrap();
        assert!(matches!(
            tree.tip_index("Z"),
            Err(TreeError::TipNotFound(name)) if name == "Z"
        ));
        assert!(!tree.exists_tip("Z").unwrap());
        assert!(tree.exists_tip("C").unwrap());
    }

    #[test]
    fn mutation_invalidates_tip_index() {
        let mut tree = Tree::from_newick("(A,B,(C,D)E);").unwrap();
        tree.update_tip_index().unwrap();
        let e = tree.get_by_name("E").unwrap().id();
        tree.contract_edge(&tree.parent_edge(&e).unwrap()).unwrap();
        assert!(matches!(
            tree.tip_index("A"),
            Err(TreeError::StaleIndex(IndexKind::TipIndex))
        ));
        tree.update_tip_index().unwrap();
        assert_eq!(tree.tip_index("D").unwrap(), 3);
    }

    #[test]
    fn align_on_reference() {
        let mut reference = Tree::from_newick("(A,B,(C,D));").unwrap();
        let mut other = Tree::from_newick("((D,A),C,B);").unwrap();
        reference.update_tip_index().unwrap();
        other.align_tip_index(&reference).unwrap();
        reference.compare_tip_indexes(&other).unwrap();
        assert_eq!(other.tip_index("D").unwrap(), 3);

        let mut missing = Tree::from_newick("((D,A),C,X);").unwrap();
        assert!(matches!(
            missing.align_tip_index(&reference),
            Err(TreeError::TipNotFound(name)) if name == "X"
        ));
        let mut smaller = Tree::from_newick("(D,A,C);").unwrap();
        assert!(matches!(
            smaller.align_tip_index(&reference),
            Err(TreeError::DifferentTipIndices)
        ));
        smaller.update_tip_index().unwrap();
        assert!(reference.compare_tip_indexes(&smaller).is_err());
    }

    #[test]
    fn tip_states() {
        let mut tree = Tree::from_newick("(A,B,C);").unwrap();
        tree.update_tip_index().unwrap();
        tree.set_tip_states("B", vec![b"ACGT".to_vec()]).unwrap();
        let b = tree.tip_id("B").unwrap();
        assert_eq!(tree.get(&b).unwrap().upstates(), &[b"ACGT".to_vec()]);
        assert!(tree.get(&b).unwrap().downstates().is_empty());
        assert!(tree.set_tip_states("Q", vec![]).is_err());
    }

    #[test]
    fn diff_tips() {
        let mut reference = Tree::from_newick("(t1,t2,(t3,t4));").unwrap();
        let mut compared = Tree::from_newick("(t10,t2,(t3,t4));").unwrap();
        reference.update_tip_index().unwrap();
        compared.update_tip_index().unwrap();

        let diff = reference.diff_tips(&compared).unwrap();
        assert_eq!(diff.only_reference, vec!["t1"]);
        assert_eq!(diff.only_compared, vec!["t10"]);
        assert_eq!(diff.common, 3);
        assert_eq!(diff.to_string(), "< t1\n> t10\n= 3\n");
    }

    #[test]
    fn contract_keeps_order_and_tips() {
        let mut tree = Tree::from_newick("(A,((B,C)G,D)H,E);").unwrap();
        let h = tree.get_by_name("H").unwrap().id();
        let root = tree.root().unwrap();
        let edges_before = tree.n_edges();
        let version = tree.version();

        tree.contract_edge(&tree.parent_edge(&h).unwrap()).unwrap();

        assert_eq!(tree.to_newick().unwrap(), "(A,(B,C)G,D,E);");
        assert_eq!(tree.root().unwrap(), root);
        assert_eq!(tree.n_edges(), edges_before - 1);
        assert!(tree.version() > version);
        assert!(tree.get(&h).is_err());

        // Moved edges now hang from the root
        let g = tree.get_by_name("G").unwrap().id();
        let edge = tree.parent_edge(&g).unwrap();
        assert_eq!(tree.edge(&edge).unwrap().left(), root);
    }

    #[test]
    fn cannot_contract_tip_edges() {
        let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        let a = tree.get_by_name("A").unwrap().id();
        let edge = tree.parent_edge(&a).unwrap();
        assert!(matches!(
            tree.contract_edge(&edge),
            Err(TreeError::CannotContractEdge(_))
        ));
        assert!(matches!(
            tree.contract_edge(&42),
            Err(TreeError::EdgeNotFound(42))
        ));
    }

    #[test]
    fn cannot_contract_below_a_tip_root() {
        let mut tree = Tree::from_newick("(A,B,(C,D)E)R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id();
        let r = tree.get_by_name("R").unwrap().id();
        tree.reroot(&a).unwrap();

        let edge = tree.parent_edge(&r).unwrap();
        let version = tree.version();
        assert!(matches!(
            tree.contract_edge(&edge),
            Err(TreeError::CannotContractEdge(_))
        ));
        assert_eq!(tree.version(), version);
        assert_eq!(tree.n_tips().unwrap(), 4);
        assert!(tree.get(&a).unwrap().is_tip());
    }

    #[test]
    fn reroot_flips_path() {
        let mut tree = Tree::from_newick("((A,B)X,(C,D)Y);").unwrap();
        let old_root = tree.root().unwrap();
        let a = tree.get_by_name("A").unwrap().id();
        let x = tree.get_by_name("X").unwrap().id();

        tree.reroot(&x).unwrap();
        assert_eq!(tree.root().unwrap(), x);
        assert_eq!(tree.parent_edge(&x), None);
        let old_root_edge = tree.parent_edge(&old_root).unwrap();
        assert_eq!(tree.edge(&old_root_edge).unwrap().left(), x);
        assert_eq!(tree.all_tip_names().unwrap().len(), 4);
        assert_eq!(tree.to_newick().unwrap(), "(((C,D)Y),A,B)X;");

        // Rerooting on a tip
        tree.reroot(&a).unwrap();
        assert_eq!(tree.root().unwrap(), a);
        assert_eq!(tree.parent_edge(&x).map(|e| tree.edge(&e).unwrap().left()), Some(a));
    }
}
