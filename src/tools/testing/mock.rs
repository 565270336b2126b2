//! Mock collaborators for exercising the pipeline without BLAST, MMseqs2,
//! Clustal Omega or HMMER installed

use crate::bio::sequence::{FastaRecord, GAP};
use crate::bio::FastaStore;
use crate::tools::traits::{ClusterOutput, Clusterer, HomologySearch, MultipleAligner, ProfileAligner, Toolchain};
use crate::tools::mmseqs::MmseqsClusterer;
use crate::{FidoError, Result};
use std::path::Path;

/// Pad every record with gaps to the longest one in `input`.
fn pad_to_longest(input: &Path, output: &Path) -> Result<()> {
    let store = FastaStore::load(input)?;
    let width = store.max_length();
    let padded: FastaStore = store
        .iter()
        .map(|record| {
            let mut sequence = record.sequence.clone();
            sequence.resize(width, GAP);
            FastaRecord::new(record.accession.clone(), sequence)
        })
        .collect();
    padded.save(output, false)
}

/// Writes a fixed block of tabular hits
#[derive(Debug, Clone, Default)]
pub struct MockSearch {
    hits: String,
}

impl MockSearch {
    pub fn new(hits: impl Into<String>) -> Self {
        Self { hits: hits.into() }
    }
}

impl HomologySearch for MockSearch {
    fn search(
        &self,
        _query: &Path,
        _pool_fasta: &Path,
        _db_prefix: &Path,
        hits_out: &Path,
        report_out: Option<&Path>,
    ) -> Result<()> {
        std::fs::write(hits_out, &self.hits)?;
        if let Some(report) = report_out {
            std::fs::write(report, "mock pairwise report\n")?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock-search"
    }
}

/// Places every sequence in its own cluster unless groups are given
#[derive(Debug, Clone, Default)]
pub struct MockClusterer {
    /// `(representative, member)` pairs that override the singleton default
    assignments: Vec<(String, String)>,
}

impl MockClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignment(mut self, representative: &str, member: &str) -> Self {
        self.assignments
            .push((representative.to_string(), member.to_string()));
        self
    }

    fn representative_of<'a>(&'a self, member: &'a str) -> &'a str {
        self.assignments
            .iter()
            .find(|(_, m)| m == member)
            .map(|(rep, _)| rep.as_str())
            .unwrap_or(member)
    }
}

impl Clusterer for MockClusterer {
    fn cluster(
        &self,
        input: &Path,
        _min_seq_id: f64,
        out_prefix: &Path,
        _tmp_dir: &Path,
    ) -> Result<ClusterOutput> {
        let store = FastaStore::load(input)?;
        let outputs = MmseqsClusterer::outputs_for(out_prefix);

        let mut table = String::new();
        for accession in store.accessions() {
            table.push_str(&format!("{}\t{}\n", self.representative_of(accession), accession));
        }
        let representatives = store.filtered(|r| self.representative_of(&r.accession) == r.accession);

        std::fs::write(&outputs.members, table)?;
        representatives.save(&outputs.representatives, false)?;
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "mock-clusterer"
    }
}

/// "Aligns" by right-padding with gaps
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAligner;

impl MultipleAligner for MockAligner {
    fn align(&self, input: &Path, output: &Path) -> Result<()> {
        pad_to_longest(input, output)
    }

    fn name(&self) -> &str {
        "mock-aligner"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProfileAligner;

impl ProfileAligner for MockProfileAligner {
    fn build_and_align(
        &self,
        aligned_reps: &Path,
        full_db: &Path,
        hmm_out: &Path,
        alignment_out: &Path,
    ) -> Result<()> {
        let reps = FastaStore::load(aligned_reps)?;
        std::fs::write(hmm_out, format!("HMMER3/f mock profile from {} sequences\n", reps.len()))?;
        pad_to_longest(full_db, alignment_out)
    }

    fn name(&self) -> &str {
        "mock-profile"
    }
}

/// Fails every call the way a crashed binary would
#[derive(Debug, Clone, Default)]
pub struct FailingTool {
    message: String,
}

impl FailingTool {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(FidoError::ToolInvocation {
            tool: "failing-tool".to_string(),
            message: self.message.clone(),
        })
    }
}

impl HomologySearch for FailingTool {
    fn search(&self, _: &Path, _: &Path, _: &Path, _: &Path, _: Option<&Path>) -> Result<()> {
        self.fail()
    }

    fn name(&self) -> &str {
        "failing-tool"
    }
}

impl Clusterer for FailingTool {
    fn cluster(&self, _: &Path, _: f64, _: &Path, _: &Path) -> Result<ClusterOutput> {
        self.fail()
    }

    fn name(&self) -> &str {
        "failing-tool"
    }
}

impl MultipleAligner for FailingTool {
    fn align(&self, _: &Path, _: &Path) -> Result<()> {
        self.fail()
    }

    fn name(&self) -> &str {
        "failing-tool"
    }
}

impl ProfileAligner for FailingTool {
    fn build_and_align(&self, _: &Path, _: &Path, _: &Path, _: &Path) -> Result<()> {
        self.fail()
    }

    fn name(&self) -> &str {
        "failing-tool"
    }
}

impl Toolchain {
    /// All-mock toolchain whose search reports `hits`
    pub fn mock(hits: impl Into<String>) -> Self {
        Self {
            search: Box::new(MockSearch::new(hits)),
            clusterer: Box::new(MockClusterer::new()),
            aligner: Box::new(MockAligner),
            profile: Box::new(MockProfileAligner),
        }
    }
}
