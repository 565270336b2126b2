/// MMseqs2 `easy-cluster` wrapper
use crate::core::config::ToolsConfig;
use crate::tools::runner::{ToolInvocation, ToolRunner};
use crate::tools::traits::{ClusterOutput, Clusterer};
use crate::tools::types::Tool;
use crate::Result;
use std::path::{Path, PathBuf};

pub struct MmseqsClusterer {
    binary_path: PathBuf,
    runner: ToolRunner,
}

impl MmseqsClusterer {
    pub fn new(binary_path: PathBuf, runner: ToolRunner) -> Self {
        Self { binary_path, runner }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(Tool::Mmseqs.program(config), ToolRunner::from_config(config))
    }

    /// Files easy-cluster writes for a given prefix
    pub fn outputs_for(out_prefix: &Path) -> ClusterOutput {
        let with_suffix = |suffix: &str| {
            let mut name = out_prefix.as_os_str().to_os_string();
            name.push(suffix);
            PathBuf::from(name)
        };
        ClusterOutput {
            representatives: with_suffix("_rep_seq.fasta"),
            members: with_suffix("_cluster.tsv"),
        }
    }

    pub fn invocation(
        &self,
        input: &Path,
        min_seq_id: f64,
        out_prefix: &Path,
        tmp_dir: &Path,
    ) -> ToolInvocation {
        let outputs = Self::outputs_for(out_prefix);
        ToolInvocation::new(Tool::Mmseqs, &self.binary_path)
            .arg("easy-cluster")
            .arg(input)
            .arg(out_prefix)
            .arg(tmp_dir)
            .arg("--min-seq-id")
            .arg(min_seq_id.to_string())
            .output(outputs.representatives)
            .output(outputs.members)
    }
}

impl Clusterer for MmseqsClusterer {
    fn cluster(
        &self,
        input: &Path,
        min_seq_id: f64,
        out_prefix: &Path,
        tmp_dir: &Path,
    ) -> Result<ClusterOutput> {
        std::fs::create_dir_all(tmp_dir)?;
        self.runner
            .run(&self.invocation(input, min_seq_id, out_prefix, tmp_dir))?;
        Ok(Self::outputs_for(out_prefix))
    }

    fn name(&self) -> &str {
        "mmseqs easy-cluster"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_follow_prefix() {
        let outputs = MmseqsClusterer::outputs_for(Path::new("run/mmseq_hmmer_data/step_3_temp_mmseq"));
        assert_eq!(
            outputs.representatives,
            PathBuf::from("run/mmseq_hmmer_data/step_3_temp_mmseq_rep_seq.fasta")
        );
        assert_eq!(
            outputs.members,
            PathBuf::from("run/mmseq_hmmer_data/step_3_temp_mmseq_cluster.tsv")
        );
    }

    #[test]
    fn test_invocation_arguments() {
        let clusterer = MmseqsClusterer::from_config(&ToolsConfig::default());
        let invocation =
            clusterer.invocation(Path::new("in.fasta"), 0.9, Path::new("pfx"), Path::new("tmp"));

        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["easy-cluster", "in.fasta", "pfx", "tmp", "--min-seq-id", "0.9"]);
        assert_eq!(invocation.outputs.len(), 2);
    }
}
