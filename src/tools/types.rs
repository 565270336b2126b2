//! External executables driven by the curation pipeline

use crate::core::config::ToolsConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    MakeBlastDb,
    Blastp,
    Mmseqs,
    ClustalOmega,
    HmmBuild,
    HmmAlign,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::MakeBlastDb,
        Tool::Blastp,
        Tool::Mmseqs,
        Tool::ClustalOmega,
        Tool::HmmBuild,
        Tool::HmmAlign,
    ];

    /// Get the display name of the tool
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::MakeBlastDb => "makeblastdb",
            Tool::Blastp => "BLASTP",
            Tool::Mmseqs => "MMseqs2",
            Tool::ClustalOmega => "Clustal Omega",
            Tool::HmmBuild => "hmmbuild",
            Tool::HmmAlign => "hmmalign",
        }
    }

    /// Get the binary name for the tool
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::MakeBlastDb => "makeblastdb",
            Tool::Blastp => "blastp",
            Tool::Mmseqs => "mmseqs",
            Tool::ClustalOmega => "clustalo",
            Tool::HmmBuild => "hmmbuild",
            Tool::HmmAlign => "hmmalign",
        }
    }

    /// Path to invoke for this tool under the given configuration
    pub fn program(&self, config: &ToolsConfig) -> PathBuf {
        match self {
            Tool::MakeBlastDb | Tool::Blastp => match &config.blast_bin_dir {
                Some(dir) => dir.join(self.binary_name()),
                None => PathBuf::from(self.binary_name()),
            },
            Tool::Mmseqs => config.mmseqs.clone(),
            Tool::ClustalOmega => config.clustalo.clone(),
            Tool::HmmBuild | Tool::HmmAlign => config.hmmer_bin_dir.join(self.binary_name()),
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
