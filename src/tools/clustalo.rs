/// Clustal Omega multiple sequence alignment
use crate::core::config::ToolsConfig;
use crate::tools::runner::{ToolInvocation, ToolRunner};
use crate::tools::traits::MultipleAligner;
use crate::tools::types::Tool;
use crate::Result;
use std::path::{Path, PathBuf};

pub struct ClustalOmega {
    binary_path: PathBuf,
    runner: ToolRunner,
}

impl ClustalOmega {
    pub fn new(binary_path: PathBuf, runner: ToolRunner) -> Self {
        Self { binary_path, runner }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(Tool::ClustalOmega.program(config), ToolRunner::from_config(config))
    }

    pub fn invocation(&self, input: &Path, output: &Path) -> ToolInvocation {
        ToolInvocation::new(Tool::ClustalOmega, &self.binary_path)
            .arg("-i")
            .arg(input)
            .arg("--dealign")
            .arg("-o")
            .arg(output)
            .arg("--outfmt=fasta")
            .arg("--force")
            .output(output)
    }
}

impl MultipleAligner for ClustalOmega {
    fn align(&self, input: &Path, output: &Path) -> Result<()> {
        self.runner.run(&self.invocation(input, output))
    }

    fn name(&self) -> &str {
        "clustalo"
    }
}
