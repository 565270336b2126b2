use crate::bio::fasta::FastaStore;
use crate::bio::sequence::FastaRecord;
use crate::core::config::Thresholds;
use serde::{Deserialize, Serialize};

/// Counts reported after a filtering pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub kept: usize,
    pub removed: usize,
    pub average_kept_length: f64,
}

/// Keeps records whose length lies strictly inside `(min_length, max_length)`
/// and that contain no ambiguous residue (`X`).
#[derive(Debug, Clone, Copy)]
pub struct LengthCompositionFilter {
    min_length: usize,
    max_length: usize,
}

impl LengthCompositionFilter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            min_length: thresholds.min_length,
            max_length: thresholds.max_length,
        }
    }

    /// Both bounds are exclusive: a sequence exactly `min_length` or
    /// `max_length` long is rejected.
    pub fn accepts(&self, record: &FastaRecord) -> bool {
        let len = record.len();
        len > self.min_length && len < self.max_length && !record.has_ambiguous_residue()
    }

    /// Filter `input` into a new store; `input` is left untouched.
    pub fn apply(&self, input: &FastaStore) -> (FastaStore, FilterSummary) {
        let kept = input.filtered(|record| self.accepts(record));
        let summary = FilterSummary {
            kept: kept.len(),
            removed: input.len() - kept.len(),
            average_kept_length: kept.average_length(),
        };

        tracing::info!(
            "Sequences kept: {} Sequences removed: {}",
            summary.kept,
            summary.removed
        );
        tracing::info!("Average sequence length: {}", summary.average_kept_length as usize);

        (kept, summary)
    }
}
