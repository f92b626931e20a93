//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: flat probe-gated refinement of a query
//! - explore: planner-driven hierarchical refinement
//! - config: print the effective configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Probeloop - probe-gated control loops with budgets and strategy switching
#[derive(Parser, Debug)]
#[command(name = "probeloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Options shared by the refinement commands
#[derive(Args, Debug, Clone)]
pub struct RefineArgs {
    /// Query text to refine
    pub query: String,

    /// Corpus file with one `topic | text` document per line (built-in sample if omitted)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Lower bound of the target hit band
    #[arg(long, default_value_t = 2)]
    pub min_hits: usize,

    /// Upper bound of the target hit band
    #[arg(long, default_value_t = 4)]
    pub max_hits: usize,

    /// Print the step log as JSON
    #[arg(long)]
    pub json: bool,
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refine a query with the flat orchestrator
    Run(RefineArgs),

    /// Refine a query with the planner-driven orchestrator
    Explore(RefineArgs),

    /// Print the effective configuration as YAML
    Config,
}
