use clap::Parser;
use colored::*;
use fido::cli::{Cli, Commands};
use fido::FidoError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins, then FIDO_LOG, then the verbosity flag
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("FIDO_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// Exit code for the first library error found in the chain
fn exit_code(error: &anyhow::Error) -> i32 {
    let fido_error = error.chain().find_map(|cause| cause.downcast_ref::<FidoError>());
    match fido_error {
        Some(FidoError::Config(_)) => 2,
        Some(FidoError::Io(_)) => 3,
        Some(FidoError::MalformedInput { .. }) | Some(FidoError::Csv(_)) => 4,
        Some(FidoError::MissingAccession { .. }) | Some(FidoError::InvariantViolation(_)) => 5,
        Some(FidoError::ToolInvocation { .. }) | Some(FidoError::ToolTimeout { .. }) => 6,
        Some(FidoError::Network(_)) => 7,
        None => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Curate(args) => fido::cli::commands::curate::run(args),
        Commands::Assemble(args) => fido::cli::commands::assemble::run(args),
        Commands::Fetch(args) => fido::cli::commands::fetch::run(args),
        Commands::Tools(args) => fido::cli::commands::tools::run(args),
    }
}
