/// HMMER profile build and alignment (hmmbuild + hmmalign)
use crate::core::config::ToolsConfig;
use crate::tools::runner::{ToolInvocation, ToolRunner};
use crate::tools::traits::ProfileAligner;
use crate::tools::types::Tool;
use crate::Result;
use std::path::{Path, PathBuf};

pub struct HmmerProfileAligner {
    hmmbuild: PathBuf,
    hmmalign: PathBuf,
    runner: ToolRunner,
}

impl HmmerProfileAligner {
    pub fn new(hmmbuild: PathBuf, hmmalign: PathBuf, runner: ToolRunner) -> Self {
        Self {
            hmmbuild,
            hmmalign,
            runner,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            Tool::HmmBuild.program(config),
            Tool::HmmAlign.program(config),
            ToolRunner::from_config(config),
        )
    }

    pub fn build_invocation(&self, aligned_reps: &Path, hmm_out: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::HmmBuild, &self.hmmbuild)
            .arg(hmm_out)
            .arg(aligned_reps)
            .output(hmm_out)
    }

    /// Aligned FASTA output so the result parses like any other FASTA file
    pub fn align_invocation(&self, hmm: &Path, full_db: &Path, alignment_out: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::HmmAlign, &self.hmmalign)
            .arg("--outformat")
            .arg("afa")
            .arg("-o")
            .arg(alignment_out)
            .arg(hmm)
            .arg(full_db)
            .output(alignment_out)
    }
}

impl ProfileAligner for HmmerProfileAligner {
    fn build_and_align(
        &self,
        aligned_reps: &Path,
        full_db: &Path,
        hmm_out: &Path,
        alignment_out: &Path,
    ) -> Result<()> {
        self.runner.run(&self.build_invocation(aligned_reps, hmm_out))?;
        self.runner
            .run(&self.align_invocation(hmm_out, full_db, alignment_out))
    }

    fn name(&self) -> &str {
        "hmmer"
    }
}
