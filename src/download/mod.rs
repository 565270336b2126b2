//! Remote retrieval of candidate sequences from NCBI

pub mod ncbi;

pub use ncbi::{
    fetch_full_sequences, EntrezClient, FailedBatch, FetchOutcome, QBlastClient, RemoteSequence,
    RetryPolicy, SequenceSource,
};
