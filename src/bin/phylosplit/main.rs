#![warn(missing_docs)]
//! The `phylosplit` binary is a command line tool, using the `[phylosplit]` crate.
//! It collapses, compares and reformats phylogenetic trees directly in the terminal.

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use phylosplit::tree::{parse_newick_trees, CollapseDepth, NewickOptions, Tree};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
    process,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// contains the struct representing the command line arguments
/// parsed by [`clap`] and used to execute this binary
pub mod cli;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads every tree of a file, or of stdin if no path is given
fn read_trees(input: Option<&Path>) -> Result<Vec<Tree>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let trees = parse_newick_trees(&text)?;
    debug!("Read {} trees", trees.len());
    Ok(trees)
}

fn writer(output: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    Ok(BufWriter::new(match output {
        Some(path) => Box::new(File::create(path)?) as Box<dyn Write>,
        None => Box::new(io::stdout()) as Box<dyn Write>,
    }))
}

fn run(args: cli::Args) -> Result<()> {
    match args.command {
        cli::Commands::CollapseDepth {
            input,
            min_depth,
            max_depth,
            output,
        } => {
            let range = CollapseDepth::new(min_depth, max_depth)?;
            let mut out = writer(output.as_deref())?;
            let mut total = 0;
            for mut tree in read_trees(input.as_deref())? {
                tree.reinit_indexes()?;
                total += tree.collapse_topological_depth(&range)?;
                writeln!(out, "{}", tree.to_newick()?)?;
            }
            out.flush()?;
            info!("Collapsed {total} branches");
        }
        cli::Commands::Difftips { reftree, compared } => {
            let mut reftree = Tree::from_file(&reftree)?;
            let mut compared = Tree::from_file(&compared)?;
            reftree.update_tip_index()?;
            compared.update_tip_index()?;
            print!("{}", reftree.diff_tips(&compared)?);
        }
        cli::Commands::Reformat {
            input,
            output,
            format,
            sort,
            annotate_nodes,
            annotate_tips,
        } => {
            let options = if annotate_nodes || annotate_tips {
                NewickOptions::optional_comments(annotate_nodes, annotate_tips)
            } else {
                NewickOptions::default()
            };
            let mut out = writer(output.as_deref())?;
            for mut tree in read_trees(input.as_deref())? {
                match sort {
                    cli::Sort::None => {}
                    cli::Sort::Depth => {
                        tree.compute_subtree_depths()?;
                        tree.sort_neighbors_by_depth()?;
                    }
                    cli::Sort::Tips => {
                        tree.sort_neighbors_by_tips()?;
                    }
                }
                match format {
                    cli::Format::Newick => writeln!(out, "{}", tree.to_newick_with(&options)?)?,
                    cli::Format::Nexus => write!(out, "{}", tree.to_nexus_with(&options)?)?,
                }
            }
            out.flush()?;
        }
        cli::Commands::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}
