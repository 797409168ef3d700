//! Newick and Nexus writers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::tree_impl::{Tree, TreeError};
use super::{EdgeId, NodeId};

/// How node comments are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// Every comment in its own `[...]` block
    #[default]
    Brackets,
    /// All comments of a node joined in a single `[&...]` block, only written
    /// for the kinds of nodes that are enabled
    Annotations {
        /// Annotate internal nodes, the root included
        internal: bool,
        /// Annotate tips
        tips: bool,
    },
}

/// Options of the newick writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewickOptions {
    /// How node comments are written
    pub comments: CommentStyle,
}

impl NewickOptions {
    /// Node comments written as `[&...]` blocks for the enabled kinds of nodes
    pub fn optional_comments(annotate_nodes: bool, annotate_tips: bool) -> Self {
        Self {
            comments: CommentStyle::Annotations {
                internal: annotate_nodes,
                tips: annotate_tips,
            },
        }
    }

    fn node_comments(&self, comments: &[String], is_tip: bool) -> String {
        if comments.is_empty() {
            return String::new();
        }
        match self.comments {
            CommentStyle::Brackets => comments.iter().map(|c| format!("[{c}]")).collect(),
            CommentStyle::Annotations { internal, tips } => {
                if (is_tip && tips) || (!is_tip && internal) {
                    format!("[&{}]", comments.join(","))
                } else {
                    String::new()
                }
            }
        }
    }
}

/// Groups `key=value` comments by key: `&k1={"v1","v2"},k2={"v3"}`
fn aggregate_comments(comments: &[String]) -> String {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for comment in comments {
        let (key, value) = comment.split_once('=').unwrap_or((comment.as_str(), ""));
        groups.entry(key).or_default().push(format!("\"{value}\""));
    }

    let groups = groups
        .into_iter()
        .map(|(key, values)| format!("{key}={{{}}}", values.join(",")))
        .collect::<Vec<_>>();

    format!("&{}", groups.join(","))
}

/// A node being written, `opened` once its `(` is out
#[derive(Debug, Clone, Copy)]
struct WriteFrame {
    node: NodeId,
    previous: Option<NodeId>,
    edge: Option<EdgeId>,
    cursor: usize,
    opened: bool,
}

impl Tree {
    // ###################
    // # WRITE THE TREE  #
    // ###################

    /// Writes what follows a node name: support, node comments, branch length
    /// and branch comments
    fn write_branch(
        &self,
        child: NodeId,
        edge: EdgeId,
        options: &NewickOptions,
        newick: &mut String,
    ) -> Result<(), TreeError> {
        let child = self.get(&child)?;
        let edge = self.edge(&edge)?;
        if let (Some(support), true) = (edge.support, child.name.is_empty()) {
            newick.push_str(&format!("{support}"));
            if let Some(pvalue) = edge.pvalue {
                newick.push_str(&format!("/{pvalue}"));
            }
        }
        newick.push_str(&options.node_comments(&child.comments, child.is_tip()));
        if let Some(length) = edge.length {
            newick.push_str(&format!(":{length}"));
        }
        if !edge.comments.is_empty() {
            newick.push_str(&format!("[{}]", aggregate_comments(&edge.comments)));
        }

        Ok(())
    }

    /// Writes the subtree of `start` with an explicit stack, so the depth of
    /// the tree is not bounded by the call stack
    fn write_subtree(
        &self,
        start: NodeId,
        options: &NewickOptions,
        newick: &mut String,
    ) -> Result<(), TreeError> {
        let mut stack = vec![WriteFrame {
            node: start,
            previous: None,
            edge: None,
            cursor: 0,
            opened: false,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = self.get(&frame.node)?;

            let mut next = None;
            while frame.cursor < node.neighbors.len() {
                let i = frame.cursor;
                frame.cursor += 1;
                if Some(node.neighbors[i]) != frame.previous {
                    next = Some((node.neighbors[i], node.edges[i]));
                    break;
                }
            }

            match next {
                Some((child, edge)) => {
                    newick.push(if frame.opened { ',' } else { '(' });
                    frame.opened = true;
                    let parent = frame.node;
                    stack.push(WriteFrame {
                        node: child,
                        previous: Some(parent),
                        edge: Some(edge),
                        cursor: 0,
                        opened: false,
                    });
                }
                None => {
                    let done = *frame;
                    stack.pop();
                    if done.opened {
                        newick.push(')');
                    }
                    newick.push_str(&node.name);
                    if let Some(edge) = done.edge {
                        self.write_branch(done.node, edge, options, newick)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Writes the tree as a newick formatted string with the given options
    pub fn to_newick_with(&self, options: &NewickOptions) -> Result<String, TreeError> {
        let root = self.root()?;
        let mut newick = String::new();
        self.write_subtree(root, options, &mut newick)?;

        let root = self.get(&root)?;
        // The root follows the internal node setting even without children
        newick.push_str(&options.node_comments(&root.comments, false));
        newick.push(';');

        Ok(newick)
    }

    /// Writes the tree as a newick formatted string. Children are written in
    /// stored neighbor order.
    /// # Example
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)0.9/0.05:0.5)F;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), newick);
    /// ```
    pub fn to_newick(&self) -> Result<String, TreeError> {
        self.to_newick_with(&NewickOptions::default())
    }

    /// Writes the tree as a newick formatted string, node comments are only
    /// written as `[&...]` annotations on the enabled kinds of nodes.
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A[a=1],B[b=2],(C,D)E[e=3])[r=4];").unwrap();
    ///
    /// assert_eq!(
    ///     tree.newick_optional_comments(true, false).unwrap(),
    ///     "(A,B,(C,D)E[&e=3])[&r=4];"
    /// );
    /// assert_eq!(
    ///     tree.newick_optional_comments(false, true).unwrap(),
    ///     "(A[&a=1],B[&b=2],(C,D)E);"
    /// );
    /// ```
    pub fn newick_optional_comments(
        &self,
        annotate_nodes: bool,
        annotate_tips: bool,
    ) -> Result<String, TreeError> {
        self.to_newick_with(&NewickOptions::optional_comments(annotate_nodes, annotate_tips))
    }

    /// Writes the tree in a nexus document with the given newick options.
    pub fn to_nexus_with(&self, options: &NewickOptions) -> Result<String, TreeError> {
        let newick = self.to_newick_with(options)?;
        let mut labels = self.all_tip_names()?;
        labels.sort();

        let mut nexus = String::from("#NEXUS\n");
        nexus.push_str("BEGIN TAXA;\n");
        nexus.push_str(&format!(" DIMENSIONS NTAX={};\n", labels.len()));
        let mut taxlabels = String::from(" TAXLABELS");
        for label in labels.iter() {
            taxlabels.push(' ');
            taxlabels.push_str(label);
        }
        nexus.push_str(&format!("{taxlabels};\n"));
        nexus.push_str("END;\n");
        nexus.push_str("BEGIN TREES;\n");
        nexus.push_str(&format!("  TREE tree1 = {newick}\n"));
        nexus.push_str("END;\n");

        Ok(nexus)
    }

    /// Writes the tree in a nexus document
    /// ```
    /// use phylosplit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(C,(A,B));").unwrap();
    /// let expected = concat!(
    ///     "#NEXUS\n",
    ///     "BEGIN TAXA;\n",
    ///     " DIMENSIONS NTAX=3;\n",
    ///     " TAXLABELS A B C;\n",
    ///     "END;\n",
    ///     "BEGIN TREES;\n",
    ///     "  TREE tree1 = (C,(A,B));\n",
    ///     "END;\n",
    /// );
    ///
    /// assert_eq!(tree.to_nexus().unwrap(), expected);
    /// ```
    pub fn to_nexus(&self) -> Result<String, TreeError> {
        self.to_nexus_with(&NewickOptions::default())
    }

    /// Writes the tree to a newick file
    pub fn to_file(&self, path: &Path) -> Result<(), TreeError> {
        fs::write(path, self.to_newick()? + "\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let newicks = [
            "(A,B,(C,D));",
            "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;",
            "((A:1e-7,B:2)100:3,C:0.5);",
            "((A,B)0.8/0.01,(C,D)1)R;",
            "(A[x][y]:1,B);",
            "((A)x,B);",
        ];
        for newick in newicks {
            let tree = Tree::from_newick(newick).unwrap();
            let expected = newick.replace("1e-7", "0.0000001");
            assert_eq!(tree.to_newick().unwrap(), expected);
        }
    }

    #[test]
    fn minimal_float_formatting() {
        let mut tree = Tree::from_newick("(A,B,(C,D)E);").unwrap();
        let e = tree.get_by_name("E").unwrap().id();
        let edge = tree.parent_edge(&e).unwrap();
        tree.edge_mut(&edge).unwrap().set_length(Some(1.0));
        tree.edge_mut(&edge).unwrap().set_support(Some(0.25));
        assert_eq!(tree.to_newick().unwrap(), "(A,B,(C,D)E:1);");

        // The support is only written for unnamed nodes
        tree.get_mut(&e).unwrap().set_name("");
        assert_eq!(tree.to_newick().unwrap(), "(A,B,(C,D)0.25:1);");
    }

    #[test]
    fn edge_comments_are_grouped() {
        let mut tree = Tree::from_newick("(A,B,(C,D)E:0.5);").unwrap();
        let e = tree.get_by_name("E").unwrap().id();
        let edge = tree.parent_edge(&e).unwrap();
        for comment in ["NT=A1T", "AA=S:L12I", "NT=G2C", "free"] {
            tree.edge_mut(&edge).unwrap().add_comment(comment);
        }
        assert_eq!(
            tree.to_newick().unwrap(),
            r#"(A,B,(C,D)E:0.5[&AA={"S:L12I"},NT={"A1T","G2C"},free={""}]);"#
        );

        // Grouped annotations are read back as a single comment
        let reparsed = Tree::from_newick(&tree.to_newick().unwrap()).unwrap();
        let e = reparsed.get_by_name("E").unwrap().id();
        let edge = reparsed.edge(&reparsed.parent_edge(&e).unwrap()).unwrap();
        assert_eq!(edge.comments().len(), 1);
    }

    #[test]
    fn node_comment_styles() {
        let tree = Tree::from_newick("(A[t1][t2],(B,C)D[n])[r];").unwrap();
        assert_eq!(tree.to_newick().unwrap(), "(A[t1][t2],(B,C)D[n])[r];");
        assert_eq!(
            tree.newick_optional_comments(true, true).unwrap(),
            "(A[&t1,t2],(B,C)D[&n])[&r];"
        );
        assert_eq!(
            tree.newick_optional_comments(false, false).unwrap(),
            "(A,(B,C)D);"
        );
    }

    #[test]
    fn nexus_with_annotations() {
        let tree = Tree::from_newick("(b[x=1],a,(d,c)[y=2]);").unwrap();
        let nexus = tree
            .to_nexus_with(&NewickOptions::optional_comments(true, false))
            .unwrap();
        let lines: Vec<_> = nexus.lines().collect();
        assert_eq!(lines[0], "#NEXUS");
        assert_eq!(lines[2], " DIMENSIONS NTAX=4;");
        assert_eq!(lines[3], " TAXLABELS a b c d;");
        assert_eq!(lines[6], "  TREE tree1 = (b,a,(d,c)[&y=2]);");
        assert_eq!(lines[7], "END;");
    }

    #[test]
    fn write_to_file() {
        let tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        let path = std::env::temp_dir().join(format!("phylosplit-{}.nwk", std::process::id()));
        tree.to_file(&path).unwrap();
        let read = Tree::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read.to_newick().unwrap(), "(A,B,(C,D));");
    }
}
