//! Final dataset assembly: aligned sequences joined with cluster labels.

use crate::bio::accession::lookup_key;
use crate::bio::cluster::ClusterTable;
use crate::bio::fasta::FastaStore;
use crate::bio::sequence::GAP;
use crate::utils::atomic::write_atomic;
use crate::{FidoError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Column names of the dataset file, in order
pub const DATASET_COLUMNS: [&str; 4] = ["index", "accession", "sequence", "cluster_ID"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub index: usize,
    pub accession: String,
    #[serde(rename = "sequence")]
    pub aligned_sequence: String,
    #[serde(rename = "cluster_ID")]
    pub cluster_id: String,
}

/// Assembled dataset; every row's sequence is exactly `width` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub rows: Vec<DatasetRow>,
    pub width: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(DATASET_COLUMNS)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the dataset to `path`. Nothing is created if writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, |writer| self.write_csv(writer))?;
        tracing::info!("Wrote {} dataset rows to {}", self.len(), path.display());
        Ok(())
    }
}

/// Pad every sequence with `-` on the right up to `width`.
pub fn pad_sequences(aligned: &FastaStore) -> (Vec<(String, String)>, usize) {
    let width = aligned.max_length();
    let padded = aligned
        .iter()
        .map(|record| {
            let mut sequence = record.sequence.clone();
            sequence.resize(width, GAP);
            (record.accession.clone(), String::from_utf8_lossy(&sequence).into_owned())
        })
        .collect();
    (padded, width)
}

/// Joins an aligned FASTA with a cluster table into dataset rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct DatasetAssembler;

impl DatasetAssembler {
    pub fn new() -> Self {
        DatasetAssembler
    }

    /// Build one row per aligned record, in input order.
    ///
    /// Fails with `InvariantViolation` if padding did not equalise lengths and
    /// with `MissingAccession` if any record has no cluster entry.
    pub fn assemble(&self, aligned: &FastaStore, clusters: &ClusterTable) -> Result<Dataset> {
        let (padded, width) = pad_sequences(aligned);

        if let Some((accession, sequence)) = padded.iter().find(|(_, s)| s.len() != width) {
            return Err(FidoError::InvariantViolation(format!(
                "sequence '{}' has length {} after padding, expected {}",
                accession,
                sequence.len(),
                width
            )));
        }

        let rows = padded
            .into_iter()
            .enumerate()
            .map(|(index, (accession, aligned_sequence))| {
                let key = lookup_key(&accession).to_string();
                let cluster_id = clusters
                    .representative_of(&key)
                    .ok_or_else(|| FidoError::MissingAccession {
                        accession: key.clone(),
                        context: "the cluster table".to_string(),
                    })?
                    .to_string();
                Ok(DatasetRow {
                    index,
                    accession: key,
                    aligned_sequence,
                    cluster_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Assembled {} rows of width {}", rows.len(), width);
        Ok(Dataset { rows, width })
    }
}
