/// BLAST+ protein search (makeblastdb + blastp)
use crate::core::config::ToolsConfig;
use crate::tools::runner::{ToolInvocation, ToolRunner};
use crate::tools::traits::HomologySearch;
use crate::tools::types::Tool;
use crate::Result;
use std::path::{Path, PathBuf};

/// Tabular columns requested from blastp, in the order `AlignmentHit` reads them
pub const OUTPUT_FORMAT: &str = "10 sseqid sacc evalue pident nident qcovhsp qcovs";

/// Report every alignment rather than blastp's default 250
pub const MAX_ALIGNMENTS: u64 = 1_000_000;

pub struct BlastSearch {
    makeblastdb: PathBuf,
    blastp: PathBuf,
    runner: ToolRunner,
    verbose_report: bool,
}

impl BlastSearch {
    pub fn new(makeblastdb: PathBuf, blastp: PathBuf, runner: ToolRunner) -> Self {
        Self {
            makeblastdb,
            blastp,
            runner,
            verbose_report: true,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        let mut search = Self::new(
            Tool::MakeBlastDb.program(config),
            Tool::Blastp.program(config),
            ToolRunner::from_config(config),
        );
        search.verbose_report = config.verbose_blast_report;
        search
    }

    pub fn make_database(&self, pool_fasta: &Path, db_prefix: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::MakeBlastDb, &self.makeblastdb)
            .arg("-in")
            .arg(pool_fasta)
            .arg("-dbtype")
            .arg("prot")
            .arg("-out")
            .arg(db_prefix)
    }

    pub fn tabular_search(&self, query: &Path, db_prefix: &Path, hits_out: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::Blastp, &self.blastp)
            .arg("-db")
            .arg(db_prefix)
            .arg("-query")
            .arg(query)
            .arg("-out")
            .arg(hits_out)
            .arg("-outfmt")
            .arg(OUTPUT_FORMAT)
            .arg("-num_alignments")
            .arg(MAX_ALIGNMENTS.to_string())
            .output(hits_out)
    }

    pub fn pairwise_report(&self, query: &Path, db_prefix: &Path, report_out: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::Blastp, &self.blastp)
            .arg("-db")
            .arg(db_prefix)
            .arg("-query")
            .arg(query)
            .arg("-out")
            .arg(report_out)
            .output(report_out)
    }
}

impl HomologySearch for BlastSearch {
    fn search(
        &self,
        query: &Path,
        pool_fasta: &Path,
        db_prefix: &Path,
        hits_out: &Path,
        report_out: Option<&Path>,
    ) -> Result<()> {
        self.runner.run(&self.make_database(pool_fasta, db_prefix))?;
        self.runner.run(&self.tabular_search(query, db_prefix, hits_out))?;

        if self.verbose_report {
            if let Some(report) = report_out {
                self.runner.run(&self.pairwise_report(query, db_prefix, report))?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "blastp"
    }
}
