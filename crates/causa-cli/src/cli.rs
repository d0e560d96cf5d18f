use crate::support::PATH_SAMPLE_LIMIT;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "causa",
    about = "Causa: structural verification of a system's causal reality graph",
    version
)]
pub struct Cli {
    /// Path to causa.toml (defaults to ./causa.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a graph and render its existence verdict
    Analyze {
        /// Graph document (JSON)
        graph: PathBuf,

        /// Verification context (JSON); overrides a context embedded in the graph
        #[arg(long)]
        context: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Skip the counterfactual simulator
        #[arg(long)]
        no_counterfactuals: bool,
    },

    /// Print node/edge statistics and the graph digest
    Stats {
        /// Graph document (JSON)
        graph: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List simple causal paths between two nodes
    Paths {
        /// Graph document (JSON)
        graph: PathBuf,

        /// Source node id
        #[arg(long)]
        from: String,

        /// Target node id
        #[arg(long)]
        to: String,

        /// Maximum number of paths to print
        #[arg(long, default_value_t = PATH_SAMPLE_LIMIT)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the formal statement of every axiom
    Axioms {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
