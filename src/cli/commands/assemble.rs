use crate::bio::{ClusterTable, DatasetAssembler, FastaStore};
use crate::cli::output::*;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AssembleArgs {
    /// Aligned FASTA (e.g. hmmalign output)
    #[arg(long, value_name = "FILE")]
    pub aligned: PathBuf,

    /// Two-column representative/member TSV
    #[arg(long, value_name = "FILE")]
    pub clusters: PathBuf,

    /// Output CSV
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: AssembleArgs) -> anyhow::Result<()> {
    section_header("Dataset Assembly");

    let aligned = FastaStore::load(&args.aligned)
        .with_context(|| format!("Failed to read alignment {}", args.aligned.display()))?;
    let clusters = ClusterTable::load(&args.clusters)
        .with_context(|| format!("Failed to read cluster table {}", args.clusters.display()))?;
    info(&format!(
        "{} aligned sequences, {} cluster entries",
        format_number(aligned.len()),
        format_number(clusters.len())
    ));

    let dataset = DatasetAssembler::new().assemble(&aligned, &clusters)?;
    dataset
        .save(&args.output)
        .with_context(|| format!("Failed to write dataset {}", args.output.display()))?;

    success(&format!(
        "Wrote {} rows (width {}) to {}",
        format_number(dataset.len()),
        dataset.width,
        args.output.display()
    ));
    Ok(())
}
