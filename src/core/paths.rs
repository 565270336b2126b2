//! File layout of a curation run under its output directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePaths {
    pub output_dir: PathBuf,
    pub project: Option<String>,
}

impl StagePaths {
    pub fn new<P: AsRef<Path>>(output_dir: P, project: Option<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            project: project.filter(|p| !p.trim().is_empty()),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    fn project_file(&self, name: &str) -> PathBuf {
        match &self.project {
            Some(project) => self.output_dir.join(format!("{}_{}", project, name)),
            None => self.output_dir.join(name),
        }
    }

    pub fn length_filtered(&self) -> PathBuf {
        self.file("step_1_filtered.fasta")
    }

    pub fn blast_dir(&self) -> PathBuf {
        self.file("blastp_data")
    }

    pub fn blast_db(&self) -> PathBuf {
        self.blast_dir().join("blast_fasta_db")
    }

    pub fn blast_hits(&self) -> PathBuf {
        self.blast_dir().join("blast_alignments.log")
    }

    pub fn blast_report(&self) -> PathBuf {
        self.blast_dir().join("blast_alignments_verbose.log")
    }

    pub fn homology_filtered(&self) -> PathBuf {
        self.file("step_2_blastp_filtered.fasta")
    }

    pub fn cluster_dir(&self) -> PathBuf {
        self.file("mmseq_hmmer_data")
    }

    pub fn cluster_prefix(&self) -> PathBuf {
        self.cluster_dir().join("step_3_temp_mmseq")
    }

    pub fn cluster_tmp(&self) -> PathBuf {
        self.cluster_dir().join("tmp")
    }

    pub fn representatives(&self) -> PathBuf {
        self.cluster_dir().join("step_3_temp_mmseq_rep_seq.fasta")
    }

    pub fn cluster_table(&self) -> PathBuf {
        self.cluster_dir().join("step_3_temp_mmseq_cluster.tsv")
    }

    pub fn aligned_representatives(&self) -> PathBuf {
        self.file("step_4_rep_seq_aligned.fasta")
    }

    pub fn profile_hmm(&self) -> PathBuf {
        self.file("rep_seq_hmm")
    }

    pub fn full_alignment(&self) -> PathBuf {
        self.file("full_db_alignment.fasta")
    }

    pub fn dataset(&self) -> PathBuf {
        self.project_file("final_alignment_with_clust_ids.csv")
    }

    pub fn report(&self) -> PathBuf {
        self.project_file("pipeline_report.json")
    }

    /// Directories that must exist before the first stage runs
    pub fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.output_dir.clone(),
            self.blast_dir(),
            self.cluster_dir(),
            self.cluster_tmp(),
        ]
    }
}
