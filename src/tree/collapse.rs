use tracing::{debug, debug_span, trace};

use super::tree_impl::{Tree, TreeError};
use super::EdgeId;

/// Inclusive range of topological depths to collapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseDepth {
    min_depth: usize,
    max_depth: usize,
}

impl CollapseDepth {
    /// Creates a range, fails if `min_depth > max_depth`
    pub fn new(min_depth: usize, max_depth: usize) -> Result<Self, TreeError> {
        if min_depth > max_depth {
            return Err(TreeError::InvalidDepthRange {
                min: min_depth,
                max: max_depth,
            });
        }
        Ok(Self {
            min_depth,
            max_depth,
        })
    }

    /// Smallest collapsed depth
    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    /// Largest collapsed depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Checks if a depth falls in the range
    pub fn contains(&self, depth: usize) -> bool {
        (self.min_depth..=self.max_depth).contains(&depth)
    }
}

impl Tree {
    // ############
    // # COLLAPSE #
    // ############

    /// Lists the edges that [`Tree::collapse_topological_depth`] would contract,
    /// in pre-order. Edges touching a tip are never listed, nor are the two
    /// edges of the root of a rooted tree. Bipartitions must be up to date.
    pub fn collapsible_edges(&self, range: &CollapseDepth) -> Result<Vec<EdgeId>, TreeError> {
        let root = self.root()?;
        let rooted = self.is_rooted()?;

        let mut incoming = vec![];
        self.pre_order_iterative(|_, _, edge| {
            incoming.extend(edge);
            true
        })?;

        let mut candidates = vec![];
        for id in incoming {
            let edge = self.edge(&id)?;
            if self.get(&edge.left)?.is_tip() || self.get(&edge.right)?.is_tip() {
                continue;
            }
            if rooted && edge.left == root {
                continue;
            }
            if range.contains(self.topological_depth(&id)?) {
                candidates.push(id);
            }
        }

        Ok(candidates)
    }

    /// Contracts every internal edge whose topological depth is in `range` and
    /// returns the number of contracted edges. Tips, tip names and the root
    /// are left untouched. Bipartitions must be up to date, and all indexes
    /// must be rebuilt afterwards.
    /// ```
    /// use phylosplit::tree::{CollapseDepth, Tree};
    ///
    /// let mut tree = Tree::from_newick("((A,B),(C,D),(E,F),(G,(H,I)));").unwrap();
    /// tree.reinit_indexes().unwrap();
    ///
    /// let range = CollapseDepth::new(2, 2).unwrap();
    /// assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 4);
    /// assert_eq!(tree.to_newick().unwrap(), "(A,B,C,D,E,F,(G,H,I));");
    /// ```
    pub fn collapse_topological_depth(&mut self, range: &CollapseDepth) -> Result<usize, TreeError> {
        let span = debug_span!("collapse", min = range.min_depth, max = range.max_depth);
        let _enter = span.enter();

        // Contracting an edge does not change the split of any other edge
        let candidates = self.collapsible_edges(range)?;
        for edge in candidates.iter() {
            let contracted = self.edge(edge)?.to_string();
            trace!("Contracting edge {contracted}");
            self.contract_edge(edge)?;
        }
        debug!("Collapsed {} edges", candidates.len());

        Ok(candidates.len())
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::tree::IndexKind;

    fn indexed(newick: &str) -> Tree {
        let mut tree = Tree::from_newick(newick).unwrap();
        tree.reinit_indexes().unwrap();
        tree
    }

    #[test]
    fn depth_range() {
        assert!(matches!(
            CollapseDepth::new(3, 1),
            Err(TreeError::InvalidDepthRange { min: 3, max: 1 })
        ));
        let range = CollapseDepth::new(2, 4).unwrap();
        assert_eq!((range.min_depth(), range.max_depth()), (2, 4));
        assert!(!range.contains(1));
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert!(CollapseDepth::new(0, 0).unwrap().contains(0));
    }

    #[test]
    fn root_edges_of_rooted_trees_are_kept() {
        let mut tree = indexed("((A,B)x,(C,D)y);");
        let range = CollapseDepth::new(0, 10).unwrap();
        assert!(tree.collapsible_edges(&range).unwrap().is_empty());
        assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 0);
        assert_eq!(tree.to_newick().unwrap(), "((A,B)x,(C,D)y);");
    }

    #[test]
    fn unrooted_root_edges_can_collapse() {
        let mut tree = indexed("(A,B,(C,D)x);");
        let range = CollapseDepth::new(2, 2).unwrap();
        assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 1);
        assert_eq!(tree.to_newick().unwrap(), "(A,B,C,D);");
    }

    #[test]
    fn only_depths_in_range() {
        // depths: (A,B) 2, (C,(D,E)) 3, (D,E) 2, ((F,G),H) 3, (F,G) 2
        let newick = "((A,B),(C,(D,E)),((F,G),H));";
        let mut tree = indexed(newick);
        let range = CollapseDepth::new(3, 3).unwrap();
        assert_eq!(tree.collapsible_edges(&range).unwrap().len(), 2);
        assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 2);
        assert_eq!(tree.to_newick().unwrap(), "((A,B),C,(D,E),(F,G),H);");

        let tips_before = Tree::from_newick(newick).unwrap().n_tips().unwrap();
        assert_eq!(tree.n_tips().unwrap(), tips_before);
    }

    #[test]
    fn collapse_needs_fresh_bipartitions() {
        let mut tree = Tree::from_newick("(A,B,(C,(D,E)));").unwrap();
        let range = CollapseDepth::new(0, 5).unwrap();
        assert!(matches!(
            tree.collapse_topological_depth(&range),
            Err(TreeError::IndexNotInitialized(IndexKind::Bipartitions))
        ));

        tree.reinit_indexes().unwrap();
        assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 2);
        assert!(matches!(
            tree.collapse_topological_depth(&range),
            Err(TreeError::StaleIndex(IndexKind::Bipartitions))
        ));
    }

    #[traced_test]
    #[test]
    fn collapse_is_logged() {
        let mut tree = indexed("((A,B),(C,D),(E,F),(G,(H,I)));");
        let range = CollapseDepth::new(2, 3).unwrap();
        assert_eq!(tree.collapse_topological_depth(&range).unwrap(), 5);
        assert!(logs_contain("Collapsed 5 edges"));
        assert!(logs_contain("Contracting edge"));
    }
}
