use std::collections::HashMap;
use std::iter::zip;

use fixedbitset::FixedBitSet;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use super::edge::Bipartition;
use super::tree_impl::{IndexKind, Tree, TreeError};
use super::EdgeId;

const TIP_HASH_SEED: u64 = 0x7469_705f_6861_7368;

/// Hash of a single taxon, side hashes are wrapping sums of these
fn tip_hash(rank: usize) -> u64 {
    xxh64(&(rank as u64).to_le_bytes(), TIP_HASH_SEED)
}

/// Methods that compute and compare the bipartitions induced by the edges of a [`Tree`].
///
/// ----
/// ----
impl Tree {
    // #################
    // # BIPARTITIONS  #
    // #################

    /// Computes the bipartition of every edge in a single post-order pass.
    /// The tip index must be up to date.
    ///
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,B,(C,D)E);").unwrap();
    /// tree.update_tip_index().unwrap();
    /// tree.update_bipartitions().unwrap();
    ///
    /// let e = tree.get_by_name("E").unwrap().id();
    /// let split = tree.bipartition(&tree.parent_edge(&e).unwrap()).unwrap();
    ///
    /// assert_eq!(split.bitset().ones().collect::<Vec<_>>(), vec![2, 3]);
    /// assert_eq!((split.ntax_left(), split.ntax_right()), (2, 2));
    /// ```
    pub fn update_bipartitions(&mut self) -> Result<(), TreeError> {
        self.check_index(IndexKind::TipIndex)?;
        self.bipartitions_version = None;

        let ntax = self.tip_index.len();
        let total_hash = (0..ntax).map(tip_hash).fold(0u64, u64::wrapping_add);

        let mut steps = vec![];
        self.post_order_iterative(|current, _, edge| {
            if let Some(edge) = edge {
                steps.push((current, edge));
            }
            true
        })?;

        let mut computed: Vec<Option<Bipartition>> = vec![None; self.edges.len()];
        for (node_id, edge_id) in steps {
            let node = &self.nodes[node_id];
            let mut bitset = FixedBitSet::with_capacity(ntax);
            let mut hash = 0u64;
            let mut count = 0;

            if node.is_tip() {
                let rank = node
                    .tip_rank
                    .ok_or(TreeError::IndexNotInitialized(IndexKind::TipIndex))?;
                bitset.insert(rank);
                hash = tip_hash(rank);
                count = 1;
            }

            for child_edge in node.edges.iter().filter(|e| **e != edge_id) {
                if let Some(below) = &computed[*child_edge] {
                    bitset.union_with(&below.bitset);
                    hash = hash.wrapping_add(below.hash_right);
                    count += below.ntax_right;
                }
            }

            computed[edge_id] = Some(Bipartition {
                bitset,
                hash_left: total_hash.wrapping_sub(hash),
                hash_right: hash,
                ntax_left: ntax.saturating_sub(count),
                ntax_right: count,
            });
        }

        for (edge, bipartition) in zip(self.edges.iter_mut(), computed) {
            edge.bipartition = bipartition;
        }
        self.bipartitions_version = Some(self.version);
        debug!("Indexed bipartitions of {} edges over {ntax} taxa", self.n_edges());

        Ok(())
    }

    /// Rebuilds the tip index then the bipartitions
    pub fn reinit_indexes(&mut self) -> Result<(), TreeError> {
        self.update_tip_index()?;
        self.update_bipartitions()
    }

    /// Bipartition induced by an edge
    pub fn bipartition(&self, edge: &EdgeId) -> Result<&Bipartition, TreeError> {
        self.check_index(IndexKind::Bipartitions)?;
        self.edge(edge)?
            .bipartition
            .as_ref()
            .ok_or(TreeError::IndexNotInitialized(IndexKind::Bipartitions))
    }

    /// Bipartitions of every edge, in edge order
    pub fn bipartitions(&self) -> Result<Vec<(EdgeId, &Bipartition)>, TreeError> {
        self.edges()
            .map(|edge| Ok((edge.id, self.bipartition(&edge.id)?)))
            .collect()
    }

    /// Finds an edge of this tree splitting the taxa like `target`.
    /// `target` must be computed with the same tip ranks.
    pub fn find_bipartition(&self, target: &Bipartition) -> Result<Option<EdgeId>, TreeError> {
        for (id, bipartition) in self.bipartitions()? {
            if bipartition.same_split(target) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Number of non trivial bipartitions of this tree that are also found in
    /// `other`. Both trees must share their tip ranks, see
    /// [`Tree::align_tip_index`].
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let mut reference = Tree::from_newick("((A,B),C,(D,(E,F)));").unwrap();
    /// let mut other = Tree::from_newick("((A,C),B,(D,(E,F)));").unwrap();
    /// reference.reinit_indexes().unwrap();
    /// other.align_tip_index(&reference).unwrap();
    /// other.update_bipartitions().unwrap();
    ///
    /// // {D,E,F} and {E,F} are shared, {A,B} is not
    /// assert_eq!(reference.common_bipartitions(&other).unwrap(), 2);
    /// ```
    pub fn common_bipartitions(&self, other: &Tree) -> Result<usize, TreeError> {
        self.compare_tip_indexes(other)?;

        let mut by_hash: HashMap<u64, Vec<&Bipartition>> = HashMap::new();
        for (_, bipartition) in other.bipartitions()? {
            if !bipartition.is_trivial() {
                let key = bipartition.hash_left.min(bipartition.hash_right);
                by_hash.entry(key).or_default().push(bipartition);
            }
        }

        let mut common = 0;
        for (_, bipartition) in self.bipartitions()? {
            if bipartition.is_trivial() {
                continue;
            }
            let key = bipartition.hash_left.min(bipartition.hash_right);
            if by_hash
                .get(&key)
                .is_some_and(|candidates| candidates.iter().any(|c| c.same_split(bipartition)))
            {
                common += 1;
            }
        }

        Ok(common)
    }
}
