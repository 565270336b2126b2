/// Trait definitions for the external collaborators of the curation pipeline
///
/// Each stage that shells out to a third-party program goes through one of
/// these, so the driver can be exercised with in-process mocks.
use crate::core::config::ToolsConfig;
use crate::tools::{blast, clustalo, hmmer, mmseqs};
use crate::Result;
use std::path::{Path, PathBuf};

/// Files written by a clustering run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterOutput {
    /// FASTA of one representative per cluster
    pub representatives: PathBuf,
    /// Two-column TSV of `representative<TAB>member`
    pub members: PathBuf,
}

/// Pairwise homology search of a query against a sequence pool
pub trait HomologySearch: Send + Sync {
    /// Build a database from `pool_fasta` at `db_prefix`, search `query`
    /// against it and write tabular hits to `hits_out`.
    fn search(
        &self,
        query: &Path,
        pool_fasta: &Path,
        db_prefix: &Path,
        hits_out: &Path,
        report_out: Option<&Path>,
    ) -> Result<()>;

    fn name(&self) -> &str;
}

/// Identity-threshold sequence clustering
pub trait Clusterer: Send + Sync {
    fn cluster(
        &self,
        input: &Path,
        min_seq_id: f64,
        out_prefix: &Path,
        tmp_dir: &Path,
    ) -> Result<ClusterOutput>;

    fn name(&self) -> &str;
}

/// De novo multiple sequence alignment
pub trait MultipleAligner: Send + Sync {
    fn align(&self, input: &Path, output: &Path) -> Result<()>;

    fn name(&self) -> &str;
}

/// Profile construction from an alignment, followed by aligning a larger
/// sequence set to that profile
pub trait ProfileAligner: Send + Sync {
    fn build_and_align(
        &self,
        aligned_reps: &Path,
        full_db: &Path,
        hmm_out: &Path,
        alignment_out: &Path,
    ) -> Result<()>;

    fn name(&self) -> &str;
}

/// The set of collaborators one pipeline run uses
pub struct Toolchain {
    pub search: Box<dyn HomologySearch>,
    pub clusterer: Box<dyn Clusterer>,
    pub aligner: Box<dyn MultipleAligner>,
    pub profile: Box<dyn ProfileAligner>,
}

impl Toolchain {
    /// Real external programs resolved from configuration
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self {
            search: Box::new(blast::BlastSearch::from_config(config)),
            clusterer: Box::new(mmseqs::MmseqsClusterer::from_config(config)),
            aligner: Box::new(clustalo::ClustalOmega::from_config(config)),
            profile: Box::new(hmmer::HmmerProfileAligner::from_config(config)),
        }
    }

    /// Check every backing program is installed
    pub fn verify(config: &ToolsConfig) -> Result<Vec<(crate::tools::Tool, PathBuf)>> {
        let runner = crate::tools::ToolRunner::from_config(config);
        crate::tools::Tool::ALL
            .iter()
            .map(|tool| {
                let program = tool.program(config);
                runner.verify(*tool, &program).map(|resolved| (*tool, resolved))
            })
            .collect()
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("search", &self.search.name())
            .field("clusterer", &self.clusterer.name())
            .field("aligner", &self.aligner.name())
            .field("profile", &self.profile.name())
            .finish()
    }
}
