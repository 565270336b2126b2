use crate::cli::output::*;
use crate::core::paths::StagePaths;
use crate::core::pipeline::{PipelineDriver, PipelineInputs};
use crate::tools::Toolchain;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CurateArgs {
    /// Candidate sequences (FASTA)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Reference sequence used as the homology-search query (FASTA)
    #[arg(short, long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Directory receiving every intermediate and final file
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Minimum identity (0.0-1.0) for two sequences to share a cluster
    #[arg(long, value_name = "FRACTION")]
    pub min_seq_id: Option<f64>,

    /// Prefix for the final dataset and run report
    #[arg(long, value_name = "NAME")]
    pub proj_name: Option<String>,

    /// Sequences to force into clustering and alignment (FASTA)
    #[arg(long, value_name = "FILE")]
    pub add_ref: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", env = "FIDO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Kill any external tool running longer than this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not check that the external tools are installed before starting
    #[arg(long)]
    pub skip_tool_check: bool,
}

pub fn run(args: CurateArgs) -> anyhow::Result<()> {
    let mut config = super::resolve_config(args.config.as_deref())?;
    if let Some(min_seq_id) = args.min_seq_id {
        config.clustering.min_seq_id = min_seq_id;
    }
    if args.timeout.is_some() {
        config.tools.timeout_secs = args.timeout;
    }
    config.validate()?;

    section_header("Sequence Curation");
    info(&format!("Input: {}", args.input.display()));
    info(&format!("Reference: {}", args.reference.display()));
    if let Some(anchors) = &args.add_ref {
        info(&format!("Anchor sequences: {}", anchors.display()));
    }
    info(&format!(
        "Length window ({}, {}), identity ({}, {}), coverage > {}, cluster identity {}",
        config.filter.min_length,
        config.filter.max_length,
        config.filter.min_identity,
        config.filter.max_identity,
        config.filter.min_coverage,
        config.clustering.min_seq_id
    ));

    if args.skip_tool_check {
        warning("Skipping external tool check");
    } else {
        for (tool, path) in Toolchain::verify(&config.tools)? {
            tracing::debug!("{} resolved to {}", tool, path.display());
        }
        success("External tools found");
    }

    let toolchain = Toolchain::from_config(&config.tools);
    let paths = StagePaths::new(&args.output, args.proj_name);
    let mut inputs = PipelineInputs::new(&args.input, &args.reference);
    if let Some(anchors) = args.add_ref {
        inputs = inputs.with_anchors(anchors);
    }

    action(&format!("Running pipeline into {}", args.output.display()));
    let driver = PipelineDriver::new(config, paths, toolchain);
    let report = driver.run(&inputs)?;

    print_report(&report);
    success(&format!(
        "Dataset written to {}",
        driver.paths().dataset().display()
    ));
    info(&format!("Run report: {}", driver.paths().report().display()));
    Ok(())
}
