use crate::bio::FastaStore;
use crate::cli::output::*;
use crate::download::{fetch_full_sequences, EntrezClient, QBlastClient, RetryPolicy};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct FetchArgs {
    /// Query protein sequence, or a FASTA file whose first record is used
    pub query: String,

    /// Output FASTA
    #[arg(short, long, value_name = "FILE", default_value = "blast_full_sequences.fasta")]
    pub output: PathBuf,

    /// Maximum number of hits to request
    #[arg(short = 'n', long, value_name = "N")]
    pub num_alignments: Option<usize>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE", env = "FIDO_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Sequence text of the query argument
fn resolve_query(query: &str) -> anyhow::Result<String> {
    let path = Path::new(query);
    if !path.is_file() {
        return Ok(query.trim().to_string());
    }
    let store = FastaStore::load(path)
        .with_context(|| format!("Failed to read query file {}", path.display()))?;
    let record = store
        .iter()
        .next()
        .with_context(|| format!("Query file {} contains no sequences", path.display()))?;
    Ok(record.to_string())
}

pub fn run(args: FetchArgs) -> anyhow::Result<()> {
    let config = super::resolve_config(args.config.as_deref())?;
    config.validate()?;
    let remote = &config.remote;
    let hit_count = args.num_alignments.unwrap_or(remote.hit_count);

    let query = resolve_query(&args.query)?;
    if query.is_empty() {
        anyhow::bail!("Query sequence is empty");
    }

    section_header("Remote BLAST Retrieval");
    info(&format!(
        "Query of length {}, requesting up to {} hits",
        query.len(),
        hit_count
    ));
    if remote.email.is_none() {
        warning("No contact email configured; NCBI may throttle anonymous requests");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Waiting for remote BLAST search...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let accessions = QBlastClient::new(remote)?.search(&query, hit_count);
    spinner.finish_and_clear();
    let accessions = accessions?;

    if accessions.is_empty() {
        warning("Remote search returned no hits; nothing to fetch");
        return Ok(());
    }
    success(&format!("Remote search returned {} accessions", format_number(accessions.len())));

    let policy = RetryPolicy::from_config(remote);
    let batches = accessions.len().div_ceil(policy.batch_size) as u64;
    let pb = ProgressBar::new(batches);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} batches {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    action("Fetching full-length sequences");
    let source = EntrezClient::new(remote)?;
    let outcome = fetch_full_sequences(&source, &accessions, &policy, Some(&pb));
    pb.finish_and_clear();

    outcome
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    for failed in &outcome.failed_batches {
        warning(&format!(
            "Batch {} ({} accessions) failed: {}",
            failed.index + 1,
            failed.accessions.len(),
            failed.error
        ));
    }
    success(&format!(
        "Saved {} sequences to {}",
        format_number(outcome.len()),
        args.output.display()
    ));
    Ok(())
}
