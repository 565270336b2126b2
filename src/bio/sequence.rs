use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol used for alignment gaps and right padding.
pub const GAP: u8 = b'-';

/// Residue code for an unknown/ambiguous amino acid.
pub const AMBIGUOUS_RESIDUE: u8 = b'X';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FastaRecord {
    pub accession: String,
    pub sequence: Vec<u8>,
}

impl FastaRecord {
    pub fn new(accession: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            accession: accession.into(),
            sequence: sequence.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn has_ambiguous_residue(&self) -> bool {
        self.sequence.contains(&AMBIGUOUS_RESIDUE)
    }

    /// Number of gap symbols in the sequence
    pub fn gap_count(&self) -> usize {
        self.sequence.iter().filter(|&&c| c == GAP).count()
    }

    pub fn header(&self) -> String {
        format!(">{}", self.accession)
    }
}

impl fmt::Display for FastaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.sequence))
    }
}
