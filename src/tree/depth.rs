//! Two unrelated notions of depth live here:
//!  - the *subtree depth* of a node, the number of edges on the longest path
//!    to a tip below it, used to order neighbors canonically;
//!  - the *topological depth* of an edge, the number of taxa on the lighter
//!    side of its bipartition, used to collapse branches.

use std::iter::zip;

use tracing::debug;

use super::tree_impl::{IndexKind, Tree, TreeError};
use super::{EdgeId, NodeId};

impl Tree {
    // ##################
    // # SUBTREE DEPTHS #
    // ##################

    /// Computes the subtree depth of every node: 0 for tips, 1 + the largest
    /// depth among children for internal nodes.
    pub fn compute_subtree_depths(&mut self) -> Result<(), TreeError> {
        let mut visits = vec![];
        self.post_order_iterative(|current, previous, _| {
            visits.push((current, previous));
            true
        })?;

        let mut depths: Vec<Option<usize>> = vec![None; self.nodes.len()];
        for (current, previous) in visits {
            let node = &self.nodes[current];
            depths[current] = Some(if node.is_tip() {
                0
            } else {
                node.neighbors
                    .iter()
                    .filter(|n| Some(**n) != previous)
                    .filter_map(|n| depths[*n])
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0)
            });
        }

        for (node, depth) in zip(self.nodes.iter_mut(), depths) {
            node.subtree_depth = depth;
        }
        self.depths_version = Some(self.version);

        Ok(())
    }

    /// Subtree depth of a node, see [`Tree::compute_subtree_depths`]
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,(B,(C,D)E)F);").unwrap();
    /// tree.compute_subtree_depths().unwrap();
    ///
    /// let f = tree.get_by_name("F").unwrap().id();
    /// assert_eq!(tree.subtree_depth(&f).unwrap(), 2);
    /// assert_eq!(tree.subtree_depth(&tree.root().unwrap()).unwrap(), 3);
    /// ```
    pub fn subtree_depth(&self, node: &NodeId) -> Result<usize, TreeError> {
        self.check_index(IndexKind::SubtreeDepths)?;
        self.get(node)?
            .subtree_depth
            .ok_or(TreeError::IndexNotInitialized(IndexKind::SubtreeDepths))
    }

    /// Reorders the neighbors of every node so that shallower subtrees come
    /// first. The parent of a node is always moved in front and ties keep
    /// their relative order. Subtree depths must be up to date.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(((A,B),C),D,(E,F));").unwrap();
    /// tree.compute_subtree_depths().unwrap();
    /// tree.sort_neighbors_by_depth().unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "(D,(E,F),(C,(A,B)));");
    /// ```
    pub fn sort_neighbors_by_depth(&mut self) -> Result<(), TreeError> {
        self.check_index(IndexKind::SubtreeDepths)?;

        let mut visits = vec![];
        self.pre_order_iterative(|current, previous, _| {
            visits.push((current, previous));
            true
        })?;

        for (current, previous) in visits {
            let keys: Vec<Option<usize>> = self.nodes[current]
                .neighbors
                .iter()
                .map(|n| {
                    if Some(*n) == previous {
                        None
                    } else {
                        self.nodes[*n].subtree_depth
                    }
                })
                .collect();
            self.reorder_neighbors(current, &keys);
        }
        debug!("Sorted neighbors by subtree depth");

        Ok(())
    }

    /// Reorders the neighbors of every node by the number of tips below them,
    /// smaller subtrees first. The parent of a node is always moved in front
    /// and ties keep their relative order. Returns the number of tips in the tree.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,(((D,(E,F)),C),B));").unwrap();
    /// assert_eq!(tree.sort_neighbors_by_tips().unwrap(), 6);
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "(A,(B,(C,(D,(E,F)))));");
    /// ```
    pub fn sort_neighbors_by_tips(&mut self) -> Result<usize, TreeError> {
        let root = self.root()?;
        let mut visits = vec![];
        self.post_order_iterative(|current, previous, _| {
            visits.push((current, previous));
            true
        })?;

        let mut tips_below = vec![0; self.nodes.len()];
        for (current, previous) in visits {
            let node = &self.nodes[current];
            let keys: Vec<usize> = node
                .neighbors
                .iter()
                .map(|n| if Some(*n) == previous { 0 } else { tips_below[*n] })
                .collect();
            tips_below[current] = if node.is_tip() && current != root {
                1
            } else {
                keys.iter().sum::<usize>() + usize::from(node.is_tip())
            };
            self.reorder_neighbors(current, &keys);
        }

        Ok(tips_below[root])
    }

    /// Stable sort of the neighbors (and aligned edges) of a node by key
    fn reorder_neighbors<K: Ord + Copy>(&mut self, node: NodeId, keys: &[K]) {
        let node = &mut self.nodes[node];
        let mut order: Vec<usize> = (0..node.neighbors.len()).collect();
        order.sort_by_key(|i| keys[*i]);
        node.neighbors = order.iter().map(|i| node.neighbors[*i]).collect();
        node.edges = order.iter().map(|i| node.edges[*i]).collect();
    }

    // #####################
    // # TOPOLOGICAL DEPTH #
    // #####################

    /// Number of taxa on the lighter side of the bipartition of an edge.
    /// Bipartitions must be up to date.
    pub fn topological_depth(&self, edge: &EdgeId) -> Result<usize, TreeError> {
        Ok(self.bipartition(edge)?.topological_depth())
    }
}
