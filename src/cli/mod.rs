pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fido",
    version,
    about = "Curate raw protein sequences into an aligned, cluster-labelled dataset",
    long_about = "fido filters candidate protein sequences by length, composition and homology to a \
                  reference, clusters near-duplicates, aligns everything against a profile built \
                  from the cluster representatives, and writes one labelled row per sequence."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full curation pipeline
    Curate(commands::curate::CurateArgs),

    /// Join an aligned FASTA with a cluster table into the final dataset
    Assemble(commands::assemble::AssembleArgs),

    /// Collect candidate sequences with a remote BLAST search
    Fetch(commands::fetch::FetchArgs),

    /// Show where each external tool resolves
    Tools(commands::tools::ToolsArgs),
}
