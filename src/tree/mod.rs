//! Build, index and manipulate phylogenetic trees.
//!
//! This module defines the essential structs to represent phylogenetic trees:
//!  - The [`Node`] struct that represents a vertex of a phylogenetic tree.
//!  - The [`Edge`] struct that represents a branch between two [`Node`] objects.
//!  - The [`Tree`] struct that owns every [`Node`] and [`Edge`] in an arena.
//!
//! Nodes and edges refer to each other through [`NodeId`] and [`EdgeId`] indices
//! into the arena, never through references.
//!
//! Derived data (the tip index, the per-edge [`Bipartition`] and the subtree
//! depths) is only valid for the topology it was computed on. Every structural
//! mutation bumps [`Tree::version`] and any query on derived data computed for an
//! older version fails with [`TreeError::StaleIndex`].

mod bipartition;
mod collapse;
mod depth;
mod edge;
mod newick;
mod node;
mod parser;
mod traversal;
mod tree_impl;

pub use self::collapse::CollapseDepth;
pub use self::edge::{Bipartition, Edge};
pub use self::newick::{CommentStyle, NewickOptions};
pub use self::node::Node;
pub use self::parser::{parse_newick_trees, NewickParseError};
pub use self::traversal::TraversalOrder;
pub use self::tree_impl::{IndexKind, TipDiff, Tree, TreeError};

/// A type that represents Identifiers of [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type NodeId = usize;

/// A type that represents Identifiers of [`Edge`] objects
/// within phylogenetic [`Tree`] object.
pub type EdgeId = usize;

/// A type that represents branch lengths between [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type EdgeLength = f64;
