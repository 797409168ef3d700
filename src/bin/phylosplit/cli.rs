use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A command line tool to collapse, compare and reformat phylogenetic trees
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Print debug logs to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    /// The command to execute
    pub command: Commands,
}

/// Output format of trees
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One newick string per tree
    Newick,
    /// One nexus document per tree
    Nexus,
}

/// Canonical ordering applied to the children of every node before writing
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    /// Keep the input order
    None,
    /// Shallower subtrees first
    Depth,
    /// Subtrees with fewer tips first
    Tips,
}

/// The available commands in the `phylosplit` tool
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collapse internal branches by topological depth
    ///
    /// The topological depth of a branch is the number of tips on the
    /// smaller side of the bipartition it induces. Branches whose depth is in
    /// [min-depth, max-depth] are removed, their child nodes are merged
    /// into their parents. Branches leading to tips and the two branches
    /// of the root of a rooted tree are never collapsed.
    #[clap(verbatim_doc_comment)]
    CollapseDepth {
        /// Input newick file, one or more trees (stdin if absent)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Minimum topological depth of collapsed branches
        #[arg(short, long, default_value_t = 0)]
        min_depth: usize,
        /// Maximum topological depth of collapsed branches
        #[arg(short = 'M', long, default_value_t = 0)]
        max_depth: usize,
        /// Output newick file (stdout if absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the tips that are only in one of two trees
    ///
    /// Prints `< name` for tips only in the reference tree, `> name` for
    /// tips only in the compared tree and `= n` with the number of
    /// common tips.
    #[clap(verbatim_doc_comment)]
    Difftips {
        /// Reference tree
        #[arg(short = 'i', long)]
        reftree: PathBuf,
        /// Tree to compare to the reference
        #[arg(short, long)]
        compared: PathBuf,
    },

    /// Write trees in another format, optionally in a canonical order
    Reformat {
        /// Input newick file, one or more trees (stdin if absent)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (stdout if absent)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(value_enum, short, long, default_value_t = Format::Newick)]
        format: Format,
        /// Reorder children before writing
        #[arg(value_enum, short, long, default_value_t = Sort::None)]
        sort: Sort,
        /// Write comments of internal nodes as [&...] annotations
        #[arg(long)]
        annotate_nodes: bool,
        /// Write comments of tips as [&...] annotations
        #[arg(long)]
        annotate_tips: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
