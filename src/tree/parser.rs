use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::tree_impl::{Tree, TreeError};
use super::NodeId;

/// Errors that can occur when parsing newick files.
#[derive(Error, Debug)]
pub enum NewickParseError {
    /// There is an unclosed bracket in the newick String
    #[error("Missing a closing bracket.")]
    UnclosedBracket,
    /// A `[` comment is never closed
    #[error("Missing a closing square bracket at the end of a comment.")]
    UnclosedComment,
    /// The newick string is missing a final semi-colon
    #[error("The tree is missing a semi colon at the end.")]
    NoClosingSemicolon,
    /// We are trying to close a subtree but have no parent node.
    #[error("Parent node of subtree not found")]
    NoSubtreeParent,
    /// There was a [`TreeError`] when building a tree from the newick string
    #[error("Problem with building the tree.")]
    TreeError(#[from] TreeError),
    /// There was a [`std::num::ParseFloatError`] when parsing branch lengths
    #[error("Could not parse a branch length")]
    FloatError(#[from] std::num::ParseFloatError),
    /// There was a [`std::io::Error`] when reading a newick file
    #[error("Problem reading file")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Name,
    Length,
    Comment,
}

/// Fields read since the last node was finished
#[derive(Debug, Default)]
struct Pending {
    name: String,
    length: String,
    comment: String,
    node_comments: Vec<String>,
    edge_comments: Vec<String>,
}

/// Reads an unnamed internal label of the form `support` or `support/pvalue`
fn parse_support(label: &str) -> Option<(f64, Option<f64>)> {
    match label.split_once('/') {
        Some((support, pvalue)) => Some((support.parse().ok()?, Some(pvalue.parse().ok()?))),
        None => Some((label.parse().ok()?, None)),
    }
}

impl Tree {
    /// Read a newick formatted string and build a [`Tree`] struct from it.
    /// Anything after the first `;` is ignored, see [`parse_newick_trees`]
    /// to read several trees.
    /// # Example
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)0.95/0.01:0.5)F;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.size(), 6);
    /// assert_eq!(tree.n_tips().unwrap(), 4);
    /// assert_eq!(tree.is_rooted().unwrap(), false);
    ///
    /// let c = tree.get_by_name("C").unwrap().id();
    /// let inner = tree.get(&c).unwrap().neighbors()[0];
    /// let edge = tree.edge(&tree.parent_edge(&inner).unwrap()).unwrap();
    /// assert_eq!(edge.support(), Some(0.95));
    /// assert_eq!(edge.pvalue(), Some(0.01));
    /// assert_eq!(edge.length(), Some(0.5));
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, NewickParseError> {
        let mut tree = Tree::new();

        let mut parsing = Field::Name;
        let mut resume = Field::Name;
        let mut pending = Pending::default();
        let mut current_index: Option<NodeId> = None;
        let mut parent_stack: Vec<NodeId> = Vec::new();
        let mut quote: Option<char> = None;

        for c in newick.chars() {
            // Quoted names are kept verbatim, quotes included
            if let Some(q) = quote {
                if parsing == Field::Name {
                    pending.name.push(c);
                    if c == q {
                        quote = None;
                    }
                    continue;
                }
            }

            if parsing == Field::Comment && c != ']' {
                pending.comment.push(c);
                continue;
            }

            match c {
                '"' | '\'' if parsing == Field::Name => {
                    quote = Some(c);
                    pending.name.push(c);
                }
                '[' => {
                    resume = parsing;
                    parsing = Field::Comment;
                }
                ']' => {
                    let comment = std::mem::take(&mut pending.comment);
                    match resume {
                        Field::Length => pending.edge_comments.push(comment),
                        _ => pending.node_comments.push(comment),
                    }
                    parsing = resume;
                }
                '(' => {
                    // Start subtree
                    let node = tree.new_node();
                    if let Some(parent) = parent_stack.last() {
                        tree.connect_nodes(parent, &node)?;
                    }
                    parent_stack.push(node);
                }
                ':' => {
                    parsing = Field::Length;
                }
                ',' | ')' | ';' => {
                    let node = match current_index.take() {
                        Some(node) => node,
                        None => match parent_stack.last() {
                            Some(parent) => {
                                let child = tree.new_node();
                                tree.connect_nodes(parent, &child)?;
                                child
                            }
                            // A tree reduced to a single node
                            None if c == ';' && tree.size() == 0 => tree.new_node(),
                            None => return Err(NewickParseError::NoSubtreeParent),
                        },
                    };
                    Self::finish_node(&mut tree, node, std::mem::take(&mut pending))?;
                    parsing = Field::Name;

                    match c {
                        ')' => {
                            let closed = parent_stack
                                .pop()
                                .ok_or(NewickParseError::NoSubtreeParent)?;
                            current_index = Some(closed);
                        }
                        ';' => {
                            if !parent_stack.is_empty() {
                                return Err(NewickParseError::UnclosedBracket);
                            }
                            debug!("Parsed newick tree with {} nodes", tree.size());
                            return Ok(tree);
                        }
                        _ => {}
                    }
                }
                c if c.is_whitespace() => {}
                _ => match parsing {
                    Field::Name => pending.name.push(c),
                    Field::Length => pending.length.push(c),
                    Field::Comment => pending.comment.push(c),
                },
            }
        }

        if parsing == Field::Comment {
            return Err(NewickParseError::UnclosedComment);
        }
        Err(NewickParseError::NoClosingSemicolon)
    }

    /// Stores the fields read for a node on the node and its parent edge
    fn finish_node(tree: &mut Tree, node: NodeId, pending: Pending) -> Result<(), NewickParseError> {
        let Pending {
            name,
            length,
            node_comments,
            edge_comments,
            ..
        } = pending;

        let is_tip = tree.get(&node)?.is_tip();
        let mut name = Some(name);

        if let Some(edge) = tree.parent_edge(&node) {
            let edge = tree.edge_mut(&edge)?;
            if !length.is_empty() {
                edge.set_length(Some(length.parse()?));
            }
            // The `&` of annotations is written back by the serializer
            for comment in edge_comments {
                match comment.strip_prefix('&') {
                    Some(annotation) => edge.add_comment(annotation),
                    None => edge.add_comment(comment),
                }
            }
            if !is_tip {
                if let Some((support, pvalue)) = name.as_deref().and_then(parse_support) {
                    edge.set_support(Some(support));
                    edge.set_pvalue(pvalue);
                    name = None;
                }
            }
        }

        let node = tree.get_mut(&node)?;
        if let Some(name) = name {
            node.set_name(name);
        }
        for comment in node_comments {
            node.add_comment(comment);
        }

        Ok(())
    }

    /// Creates a tree from a newick file
    pub fn from_file(path: &Path) -> Result<Self, NewickParseError> {
        let newick_string = fs::read_to_string(path)?;
        Self::from_newick(&newick_string)
    }
}

/// Reads every `;` terminated tree of a newick string, e.g. one tree per line.
/// ```
/// use phylosplit::tree::parse_newick_trees;
///
/// let trees = parse_newick_trees("(A,B,(C,D));\n((A,C),B,D);\n").unwrap();
/// assert_eq!(trees.len(), 2);
/// assert_eq!(trees[1].to_newick().unwrap(), "((A,C),B,D);");
/// ```
pub fn parse_newick_trees(newicks: &str) -> Result<Vec<Tree>, NewickParseError> {
    let mut trees = vec![];
    let mut start = 0;
    let mut in_comment = false;
    let mut quote: Option<char> = None;

    for (i, c) in newicks.char_indices() {
        match (c, quote, in_comment) {
            (_, Some(q), _) if c == q => quote = None,
            (_, Some(_), _) => {}
            (']', None, true) => in_comment = false,
            (_, None, true) => {}
            ('[', None, false) => in_comment = true,
            ('"' | '\'', None, false) => quote = Some(c),
            (';', None, false) => {
                trees.push(Tree::from_newick(&newicks[start..=i])?);
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_comment {
        return Err(NewickParseError::UnclosedComment);
    }
    if !newicks[start..].trim().is_empty() {
        return Err(NewickParseError::NoClosingSemicolon);
    }

    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_newick() {
        let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
        assert_eq!(tree.size(), 6);
        assert_eq!(tree.all_tip_names().unwrap(), vec!["A", "B", "C", "D"]);

        let root = tree.root().unwrap();
        assert_eq!(tree.get(&root).unwrap().name(), "F");
        let e = tree.get_by_name("E").unwrap().id();
        let edge = tree.edge(&tree.parent_edge(&e).unwrap()).unwrap();
        assert_eq!(edge.length(), Some(0.5));
        assert_eq!(edge.left(), root);
    }

    #[test]
    fn read_newick_fails() {
        let cases = [
            ("(A,B,(C,D);", "UnclosedBracket"),
            ("(A,B,(C,D))", "NoClosingSemicolon"),
            ("(A,B)[unclosed;", "UnclosedComment"),
            ("(A,B));", "NoSubtreeParent"),
            ("A,B;", "NoSubtreeParent"),
            ("(A:x,B);", "FloatError"),
        ];
        for (newick, expected) in cases {
            let err = Tree::from_newick(newick).unwrap_err();
            let matched = match err {
                NewickParseError::UnclosedBracket => "UnclosedBracket",
                NewickParseError::NoClosingSemicolon => "NoClosingSemicolon",
                NewickParseError::UnclosedComment => "UnclosedComment",
                NewickParseError::NoSubtreeParent => "NoSubtreeParent",
                NewickParseError::FloatError(_) => "FloatError",
                _ => "other",
            };
            assert_eq!(matched, expected, "parsing {newick}");
        }
    }

    #[test]
    fn single_node_trees() {
        let tree = Tree::from_newick("A;").unwrap();
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.get(&tree.root().unwrap()).unwrap().name(), "A");

        let tree = Tree::from_newick(";").unwrap();
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.n_edges(), 0);
    }

    #[test]
    fn comments_go_to_nodes_or_edges() {
        let tree =
            Tree::from_newick("(A[tip]:1[&AA=S:D614G],B,(C,D)E[x][y]:2[NT=A1T][NT=G2C]);").unwrap();

        let a = tree.get_by_name("A").unwrap();
        assert_eq!(a.comments(), &["tip"]);
        let edge = tree.edge(&tree.parent_edge(&a.id()).unwrap()).unwrap();
        assert_eq!(edge.comments(), &["AA=S:D614G"]);

        let e = tree.get_by_name("E").unwrap();
        assert_eq!(e.comments(), &["x", "y"]);
        let edge = tree.edge(&tree.parent_edge(&e.id()).unwrap()).unwrap();
        assert_eq!(edge.comment_values("NT").collect::<Vec<_>>(), vec!["A1T", "G2C"]);
    }

    #[test]
    fn numeric_labels() {
        let tree = Tree::from_newick("((A,B)100:0.1,(C,D)0.7/0.05,1)2;").unwrap();
        let supports: Vec<_> = tree
            .edges()
            .filter_map(|e| e.support().map(|s| (s, e.pvalue())))
            .collect();
        assert_eq!(supports, vec![(100.0, None), (0.7, Some(0.05))]);

        // Numeric tips and roots are names
        assert!(tree.get_by_name("1").is_some());
        assert_eq!(tree.get(&tree.root().unwrap()).unwrap().name(), "2");
    }

    #[test]
    fn quoted_names() {
        let tree = Tree::from_newick("('a b',\"c,(d)\",'e[f]');").unwrap();
        assert_eq!(
            tree.all_tip_names().unwrap(),
            vec!["'a b'", "\"c,(d)\"", "'e[f]'"]
        );
    }

    #[test]
    fn whitespace_is_ignored() {
        let tree = Tree::from_newick("(A : 0.1,\n  B,\n  (C, D) E\n);\n").unwrap();
        assert_eq!(tree.all_tip_names().unwrap(), vec!["A", "B", "C", "D"]);
        assert!(tree.get_by_name("E").is_some());
    }

    #[test]
    fn several_trees() {
        let trees = parse_newick_trees("(A,B,(C,D));\n('x;y',B,C);\n(A,[;]B);").unwrap();
        assert_eq!(trees.len(), 3);
        assert_eq!(trees[1].all_tip_names().unwrap(), vec!["'x;y'", "B", "C"]);
        assert_eq!(trees[2].get_by_name("B").unwrap().comments(), &[";"]);

        assert!(parse_newick_trees("").unwrap().is_empty());
        assert!(matches!(
            parse_newick_trees("(A,B);(C,D)"),
            Err(NewickParseError::NoClosingSemicolon)
        ));
    }
}
