//! Depth-first walks over a [`Tree`].
//!
//! Every walk calls a visitor with `(current, previous, incoming_edge)` and
//! never goes back into `previous`. The visitor returns `false` to stop the
//! walk: remaining siblings are skipped and the stop propagates to the start
//! of the walk. Walks return `true` when they visited the whole tree.

use super::tree_impl::{Tree, TreeError};
use super::{EdgeId, NodeId};

/// Order in which a depth-first walk visits the nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Node first, then its children in stored neighbor order
    PreOrder,
    /// Children in stored neighbor order, then the node
    PostOrder,
    /// Children in reverse stored neighbor order, then the node
    ReversePostOrder,
}

impl TraversalOrder {
    fn is_pre(&self) -> bool {
        matches!(self, TraversalOrder::PreOrder)
    }

    /// Index of the `k`-th neighbor to visit among `n`
    fn neighbor_index(&self, k: usize, n: usize) -> usize {
        match self {
            TraversalOrder::ReversePostOrder => n - 1 - k,
            _ => k,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    previous: Option<NodeId>,
    edge: Option<EdgeId>,
    cursor: usize,
}

impl Tree {
    // ###################
    // # TREE TRAVERSALS #
    // ###################

    /// Pre-order walk from the root.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let mut names = vec![];
    /// tree.pre_order(|current, _, _| {
    ///     names.push(tree.get(&current).unwrap().name().to_string());
    ///     true
    /// }).unwrap();
    ///
    /// assert_eq!(names, vec!["F", "B", "A", "D", "C", "E", "G", "I", "H"])
    /// ```
    pub fn pre_order<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse(TraversalOrder::PreOrder, visitor)
    }

    /// Post-order walk from the root.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let mut names = vec![];
    /// tree.post_order(|current, _, _| {
    ///     names.push(tree.get(&current).unwrap().name().to_string());
    ///     true
    /// }).unwrap();
    ///
    /// assert_eq!(names, vec!["A", "C", "E", "D", "B", "H", "I", "G", "F"])
    /// ```
    pub fn post_order<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse(TraversalOrder::PostOrder, visitor)
    }

    /// Post-order walk from the root, children visited in reverse order.
    pub fn post_order_rev<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse(TraversalOrder::ReversePostOrder, visitor)
    }

    /// Recursive walk from the root in the given order.
    pub fn traverse<F>(&self, order: TraversalOrder, mut visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        let root = self.root()?;
        self.get(&root)?;
        Ok(self.walk_recursive(order, root, None, None, &mut visitor))
    }

    /// Recursive walk starting at `start`, treating `previous` as already visited.
    /// `previous` must be a neighbor of `start` if given.
    pub fn traverse_from<F>(
        &self,
        order: TraversalOrder,
        start: &NodeId,
        previous: Option<&NodeId>,
        mut visitor: F,
    ) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        let (previous, edge) = self.incoming(start, previous)?;
        Ok(self.walk_recursive(order, *start, previous, edge, &mut visitor))
    }

    fn walk_recursive<F>(
        &self,
        order: TraversalOrder,
        current: NodeId,
        previous: Option<NodeId>,
        edge: Option<EdgeId>,
        visitor: &mut F,
    ) -> bool
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        if order.is_pre() && !visitor(current, previous, edge) {
            return false;
        }

        let node = &self.nodes[current];
        let n = node.neighbors.len();
        for k in 0..n {
            let i = order.neighbor_index(k, n);
            let neighbor = node.neighbors[i];
            if Some(neighbor) != previous
                && !self.walk_recursive(order, neighbor, Some(current), Some(node.edges[i]), visitor)
            {
                return false;
            }
        }

        order.is_pre() || visitor(current, previous, edge)
    }

    /// Pre-order walk from the root using an explicit stack instead of recursion.
    /// Use it on very deep trees.
    pub fn pre_order_iterative<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse_iterative(TraversalOrder::PreOrder, visitor)
    }

    /// Post-order walk from the root using an explicit stack instead of recursion.
    pub fn post_order_iterative<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse_iterative(TraversalOrder::PostOrder, visitor)
    }

    /// Reverse post-order walk from the root using an explicit stack instead of recursion.
    pub fn post_order_rev_iterative<F>(&self, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        self.traverse_iterative(TraversalOrder::ReversePostOrder, visitor)
    }

    /// Walk from the root in the given order using an explicit stack.
    /// Visits nodes in exactly the same order as [`Tree::traverse`].
    pub fn traverse_iterative<F>(&self, order: TraversalOrder, visitor: F) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        let root = self.root()?;
        self.traverse_iterative_from(order, &root, None, visitor)
    }

    /// Walk starting at `start` in the given order using an explicit stack.
    pub fn traverse_iterative_from<F>(
        &self,
        order: TraversalOrder,
        start: &NodeId,
        previous: Option<&NodeId>,
        mut visitor: F,
    ) -> Result<bool, TreeError>
    where
        F: FnMut(NodeId, Option<NodeId>, Option<EdgeId>) -> bool,
    {
        let (previous, edge) = self.incoming(start, previous)?;
        if order.is_pre() && !visitor(*start, previous, edge) {
            return Ok(false);
        }

        let mut stack = vec![Frame {
            node: *start,
            previous,
            edge,
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = &self.nodes[frame.node];
            let n = node.neighbors.len();

            let mut next = None;
            while frame.cursor < n {
                let i = order.neighbor_index(frame.cursor, n);
                frame.cursor += 1;
                if Some(node.neighbors[i]) != frame.previous {
                    next = Some((node.neighbors[i], node.edges[i]));
                    break;
                }
            }

            match next {
                Some((child, edge)) => {
                    let parent = frame.node;
                    if order.is_pre() && !visitor(child, Some(parent), Some(edge)) {
                        return Ok(false);
                    }
                    stack.push(Frame {
                        node: child,
                        previous: Some(parent),
                        edge: Some(edge),
                        cursor: 0,
                    });
                }
                None => {
                    let done = *frame;
                    stack.pop();
                    if !order.is_pre() && !visitor(done.node, done.previous, done.edge) {
                        return Ok(false);
                    }
                }
            }
        }

        Ok(true)
    }

    /// Resolves the edge between a start node and the node considered visited
    fn incoming(
        &self,
        start: &NodeId,
        previous: Option<&NodeId>,
    ) -> Result<(Option<NodeId>, Option<EdgeId>), TreeError> {
        let node = self.get(start)?;
        match previous {
            None => Ok((None, None)),
            Some(previous) => {
                let i = node
                    .neighbor_position(previous)
                    .ok_or(TreeError::Disconnected(*previous))?;
                Ok((Some(*previous), Some(node.edges[i])))
            }
        }
    }

    /// Returns a vector containing node ids in pre-order from the root
    pub fn preorder_nodes(&self) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![];
        self.pre_order_iterative(|current, _, _| {
            indices.push(current);
            true
        })?;
        Ok(indices)
    }

    /// Returns a vector containing node ids in post-order from the root
    pub fn postorder_nodes(&self) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![];
        self.post_order_iterative(|current, _, _| {
            indices.push(current);
            true
        })?;
        Ok(indices)
    }
}
