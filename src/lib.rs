pub mod bio;
pub mod cli;
pub mod core;
pub mod download;
pub mod tools;
pub mod utils;

pub use crate::bio::{ClusterTable, DatasetAssembler, FastaStore, HomologyFilter, LengthCompositionFilter};
pub use crate::core::{config::FidoConfig, pipeline::PipelineDriver};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FidoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed input in {source_name} (line {line}): {message}")]
    MalformedInput {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Accession '{accession}' not found in {context}")]
    MissingAccession { accession: String, context: String },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{tool} failed: {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("{tool} timed out after {seconds} seconds")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FidoError>;
