//! Bipartitions, topological depths and Newick/Nexus serialization of
//! phylogenetic trees.
//!
//! ```
//! use phylosplit::tree::{CollapseDepth, Tree};
//!
//! let mut tree = Tree::from_newick("((A,B),(C,D),(E,(F,G)));").unwrap();
//! tree.reinit_indexes().unwrap();
//!
//! let range = CollapseDepth::new(2, 2).unwrap();
//! tree.collapse_topological_depth(&range).unwrap();
//!
//! assert_eq!(tree.to_newick().unwrap(), "(A,B,C,D,(E,F,G));");
//! ```

use std::collections::VecDeque;

use rand::prelude::*;

use tree::{Tree, TreeError};

pub mod tree;

fn random_length(rng: &mut impl Rng, brlens: bool) -> Option<f64> {
    if brlens {
        Some(rng.gen())
    } else {
        None
    }
}

/// Generates a random binary tree with `n_leaves` tips named `Tip_{i}`.
/// Branch lengths are uniformly distributed in `[0, 1)`.
pub fn generate_tree(n_leaves: usize, brlens: bool) -> Result<Tree, TreeError> {
    let mut tree = Tree::new();
    let mut rng = thread_rng();

    let mut next_deq = VecDeque::new();
    next_deq.push_back(tree.new_node());

    for _ in 0..n_leaves.saturating_sub(1) {
        let parent = if rng.gen_bool(0.5) {
            next_deq.pop_front()
        } else {
            next_deq.pop_back()
        }
        .ok_or(TreeError::RootNotFound)?;

        for _ in 0..2 {
            let child = tree.new_node();
            let edge = tree.connect_nodes(&parent, &child)?;
            tree.edge_mut(&edge)?.set_length(random_length(&mut rng, brlens));
            next_deq.push_back(child);
        }
    }

    for (i, id) in next_deq.iter().enumerate() {
        tree.get_mut(id)?.set_name(format!("Tip_{i}"));
    }

    Ok(tree)
}

/// Generates a caterpillar tree by adding children to the last node added to the tree
/// until we reach the desired number of leaves. Its height is `n_leaves - 1`.
pub fn generate_caterpillar(n_leaves: usize, brlens: bool) -> Result<Tree, TreeError> {
    let mut tree = Tree::new();
    let mut rng = thread_rng();

    let mut parent = tree.new_node();
    for i in 1..n_leaves {
        let tip = tree.new_named_node(&format!("Tip_{i}"));
        let edge = tree.connect_nodes(&parent, &tip)?;
        tree.edge_mut(&edge)?.set_length(random_length(&mut rng, brlens));

        let next = if i == n_leaves - 1 {
            tree.new_named_node(&format!("Tip_{}", i + 1))
        } else {
            tree.new_node()
        };
        let edge = tree.connect_nodes(&parent, &next)?;
        tree.edge_mut(&edge)?.set_length(random_length(&mut rng, brlens));
        parent = next;
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_trees_are_binary() {
        for n in [2, 10, 257] {
            let mut tree = generate_tree(n, true).unwrap();
            assert_eq!(tree.n_tips().unwrap(), n);
            assert_eq!(tree.size(), 2 * n - 1);
            assert!(tree.is_rooted().unwrap());
            assert!(tree.edges().all(|e| e.length().is_some()));
            tree.update_tip_index().unwrap();
        }
    }

    #[test]
    fn caterpillar_shape() {
        let mut tree = generate_caterpillar(50, false).unwrap();
        assert_eq!(tree.n_tips().unwrap(), 50);
        assert!(tree.edges().all(|e| e.length().is_none()));

        tree.compute_subtree_depths().unwrap();
        assert_eq!(tree.subtree_depth(&tree.root().unwrap()).unwrap(), 49);

        tree.reinit_indexes().unwrap();
        let depths: Vec<_> = tree
            .internal_edges()
            .iter()
            .map(|e| tree.topological_depth(e).unwrap())
            .collect();
        assert_eq!(depths.iter().max(), Some(&25));
    }
}
