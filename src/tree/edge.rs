use std::fmt::{Debug, Display};

use fixedbitset::FixedBitSet;

use super::{EdgeId, EdgeLength, NodeId};

/// The split of the taxa induced by removing an [`Edge`] from the tree.
///
/// Bit `i` of the bitset is set when the taxon of rank `i` lies on the
/// right (child) side of the edge.
#[derive(Clone, PartialEq, Eq)]
pub struct Bipartition {
    pub(crate) bitset: FixedBitSet,
    pub(crate) hash_left: u64,
    pub(crate) hash_right: u64,
    pub(crate) ntax_left: usize,
    pub(crate) ntax_right: usize,
}

impl Bipartition {
    /// Taxa on the right (child) side of the edge
    pub fn bitset(&self) -> &FixedBitSet {
        &self.bitset
    }

    /// Taxa on the left (parent) side of the edge
    pub fn left_bitset(&self) -> FixedBitSet {
        let mut left = self.bitset.clone();
        left.toggle_range(..);
        left
    }

    /// Hash of the taxon set on the left side
    pub fn hash_left(&self) -> u64 {
        self.hash_left
    }

    /// Hash of the taxon set on the right side
    pub fn hash_right(&self) -> u64 {
        self.hash_right
    }

    /// Number of taxa on the left side
    pub fn ntax_left(&self) -> usize {
        self.ntax_left
    }

    /// Number of taxa on the right side
    pub fn ntax_right(&self) -> usize {
        self.ntax_right
    }

    /// Total number of taxa the bipartition is defined over
    pub fn ntax(&self) -> usize {
        self.ntax_left + self.ntax_right
    }

    /// Number of taxa on the lighter side of the split
    pub fn topological_depth(&self) -> usize {
        self.ntax_left.min(self.ntax_right)
    }

    /// A bipartition is trivial when one side holds at most one taxon
    pub fn is_trivial(&self) -> bool {
        self.topological_depth() <= 1
    }

    /// Checks if two bipartitions split the taxa the same way, whatever
    /// the orientation of their edges.
    ///
    /// Hashes are compared first, bitsets are only compared when the hashes
    /// match. Both bipartitions must be computed with the same tip ranks.
    pub fn same_split(&self, other: &Self) -> bool {
        if self.ntax() != other.ntax() {
            return false;
        }
        if self.hash_right == other.hash_right && self.ntax_right == other.ntax_right {
            return self.bitset == other.bitset;
        }
        if self.hash_right == other.hash_left && self.ntax_right == other.ntax_left {
            let mut flipped = other.bitset.clone();
            flipped.toggle_range(..);
            return self.bitset == flipped;
        }
        false
    }
}

impl Debug for Bipartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bits: String = (0..self.bitset.len())
            .map(|i| if self.bitset.contains(i) { '1' } else { '0' })
            .collect();
        f.debug_struct("Bipartition")
            .field("bitset", &bits)
            .field("hash_left", &format_args!("0x{:X}", self.hash_left))
            .field("hash_right", &format_args!("0x{:X}", self.hash_right))
            .field("ntax_left", &self.ntax_left)
            .field("ntax_right", &self.ntax_right)
            .finish()
    }
}

#[derive(Clone)]
/// A branch of the tree, directed from the parent side (left) to the child
/// side (right) under the current root.
pub struct Edge {
    /// Index of the edge in the tree arena
    pub(crate) id: EdgeId,
    pub(crate) left: NodeId,
    pub(crate) right: NodeId,
    pub(crate) length: Option<EdgeLength>,
    pub(crate) support: Option<f64>,
    pub(crate) pvalue: Option<f64>,
    pub(crate) comments: Vec<String>,
    /// Length of the branch in units of synonymous mutations
    pub(crate) syn_length: Option<EdgeLength>,
    pub(crate) bipartition: Option<Bipartition>,
    pub(crate) deleted: bool,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, left: NodeId, right: NodeId) -> Self {
        Self {
            id,
            left,
            right,
            length: None,
            support: None,
            pvalue: None,
            comments: vec![],
            syn_length: None,
            bipartition: None,
            deleted: false,
        }
    }

    /// Empties the edge and sets it as deleted
    pub(crate) fn delete(&mut self) {
        *self = Self::new(self.id, self.left, self.right);
        self.deleted = true;
    }

    /// Index of the edge within its tree
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Node on the parent side of the edge
    pub fn left(&self) -> NodeId {
        self.left
    }

    /// Node on the child side of the edge
    pub fn right(&self) -> NodeId {
        self.right
    }

    /// Length of the branch, if set
    pub fn length(&self) -> Option<EdgeLength> {
        self.length
    }

    /// Sets or unsets the length of the branch
    pub fn set_length(&mut self, length: Option<EdgeLength>) {
        self.length = length;
    }

    /// Support of the branch, if set
    pub fn support(&self) -> Option<f64> {
        self.support
    }

    /// Sets or unsets the support of the branch
    pub fn set_support(&mut self, support: Option<f64>) {
        self.support = support;
    }

    /// P-value of the support, written as `support/pvalue` in newick output
    pub fn pvalue(&self) -> Option<f64> {
        self.pvalue
    }

    /// Sets or unsets the p-value of the branch support
    pub fn set_pvalue(&mut self, pvalue: Option<f64>) {
        self.pvalue = pvalue;
    }

    /// Branch length in synonymous mutation units
    pub fn syn_length(&self) -> Option<EdgeLength> {
        self.syn_length
    }

    /// Sets or unsets the synonymous branch length
    pub fn set_syn_length(&mut self, length: Option<EdgeLength>) {
        self.syn_length = length;
    }

    /// Adds a `key=value` comment to the edge
    pub fn add_comment(&mut self, comment: impl Into<String>) {
        self.comments.push(comment.into());
    }

    /// Comments attached to the edge
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Values of all `key=value` comments of the edge with the given key
    pub fn comment_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.comments
            .iter()
            .filter_map(move |c| c.split_once('=').filter(|(k, _)| *k == key))
            .map(|(_, v)| v)
    }

    /// Amino acid changes noted on the branch. Comments look like
    /// `AA=<gene>:<residue>:<alleles>` and are returned as `AA=<gene>:<residue>`,
    /// without the alleles.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,B,(C,D)E);").unwrap();
    /// let e = tree.get_by_name("E").unwrap().id();
    /// let edge = tree.parent_edge(&e).unwrap();
    /// tree.edge_mut(&edge).unwrap().add_comment("AA=S:614:DG");
    ///
    /// assert_eq!(tree.edge(&edge).unwrap().aa_residues(), vec!["AA=S:614"]);
    /// ```
    pub fn aa_residues(&self) -> Vec<String> {
        self.comments
            .iter()
            .filter(|c| c.split(':').next().and_then(|f| f.split('=').next()) == Some("AA"))
            .map(|c| c.splitn(3, ':').take(2).collect::<Vec<_>>().join(":"))
            .collect()
    }

    /// Returns the node at the other end of the edge
    pub fn other_end(&self, node: &NodeId) -> Option<NodeId> {
        if self.left == *node {
            Some(self.right)
        } else if self.right == *node {
            Some(self.left)
        } else {
            None
        }
    }

    /// Replaces one end of the edge, keeping its orientation
    pub(crate) fn replace_end(&mut self, old: &NodeId, new: NodeId) {
        if self.left == *old {
            self.left = new;
        } else if self.right == *old {
            self.right = new;
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.length {
            Some(l) => write!(f, "{}->{} ({l})", self.left, self.right),
            None => write!(f, "{}->{}", self.left, self.right),
        }
    }
}

impl Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Id[{}] {}->{} Length[{:?}] Support[{:?}] PValue[{:?}] Comments[{:?}]",
            self.id, self.left, self.right, self.length, self.support, self.pvalue, self.comments,
        )
    }
}
