//! Reference-homology filtering over BLAST tabular hits.
//!
//! Hits come from `blastp -outfmt "10 sseqid sacc evalue pident nident qcovhsp qcovs"`:
//! comma-separated, no header, one line per HSP.

use crate::bio::accession::lookup_key;
use crate::bio::fasta::FastaStore;
use crate::core::config::Thresholds;
use crate::{FidoError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One line of homology-search output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentHit {
    pub subject_id: String,
    pub subject_accession: String,
    pub e_value: f64,
    pub percent_identity: f64,
    pub identical_count: u64,
    pub query_coverage_hsp: f64,
    pub query_coverage_subject: f64,
}

/// Parse comma-separated hit lines. Blank lines are skipped.
pub fn parse_hits<R: Read>(reader: R, source_name: &str) -> Result<Vec<AlignmentHit>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut hits = Vec::new();
    for (index, row) in csv_reader.deserialize::<AlignmentHit>().enumerate() {
        let hit = row.map_err(|e| FidoError::MalformedInput {
            source_name: source_name.to_string(),
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1),
            message: e.to_string(),
        })?;
        hits.push(hit);
    }
    Ok(hits)
}

pub fn load_hits<P: AsRef<Path>>(path: P) -> Result<Vec<AlignmentHit>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse_hits(file, &path.display().to_string())
}

/// Counts reported after homology filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomologySummary {
    pub hits: usize,
    pub qualifying_hits: usize,
    pub retained: usize,
    pub pool_size: usize,
}

/// Retains pool records with at least one hit inside the identity window and
/// above the coverage floor. All three comparisons are strict.
#[derive(Debug, Clone, Copy)]
pub struct HomologyFilter {
    min_identity: f64,
    max_identity: f64,
    min_coverage: f64,
}

impl HomologyFilter {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            min_identity: thresholds.min_identity,
            max_identity: thresholds.max_identity,
            min_coverage: thresholds.min_coverage,
        }
    }

    pub fn qualifies(&self, hit: &AlignmentHit) -> bool {
        hit.percent_identity > self.min_identity
            && hit.percent_identity < self.max_identity
            && hit.query_coverage_hsp > self.min_coverage
    }

    /// Find the pool accession a hit refers to: the subject id first, then
    /// the bare subject accession.
    fn resolve<'a>(&self, pool: &'a FastaStore, hit: &AlignmentHit) -> Result<&'a str> {
        [hit.subject_id.as_str(), hit.subject_accession.as_str()]
            .into_iter()
            .map(lookup_key)
            .find_map(|key| pool.get(key).map(|record| record.accession.as_str()))
            .ok_or_else(|| FidoError::MissingAccession {
                accession: hit.subject_id.clone(),
                context: "the homology-search candidate pool".to_string(),
            })
    }

    /// Apply the filter to an already-parsed hit list.
    ///
    /// Every hit must refer to a pool record; a hit that does not means the
    /// search ran against the wrong database and is an error even if the hit
    /// would not have qualified.
    pub fn apply(&self, pool: &FastaStore, hits: &[AlignmentHit]) -> Result<(FastaStore, HomologySummary)> {
        let mut retained = FastaStore::new();
        let mut qualifying_hits = 0;

        for hit in hits {
            let accession = self.resolve(pool, hit)?;
            if !self.qualifies(hit) {
                continue;
            }
            qualifying_hits += 1;
            if let Some(record) = pool.get(accession) {
                retained.insert(record.clone());
            }
        }

        let summary = HomologySummary {
            hits: hits.len(),
            qualifying_hits,
            retained: retained.len(),
            pool_size: pool.len(),
        };
        tracing::info!(
            "Homology filter: {} of {} hits qualified, {} of {} sequences retained",
            summary.qualifying_hits,
            summary.hits,
            summary.retained,
            summary.pool_size
        );
        Ok((retained, summary))
    }
}
