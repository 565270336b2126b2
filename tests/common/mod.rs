/// Shared fixtures for the integration tests
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Hit line for a reference search that matched ACC1 with 45% identity and 60% coverage
pub const ACC1_HIT: &str = "S1,ACC1,1e-50,45.0,100,60.0,80.0\n";

/// Scratch directory holding the inputs and output directory of one run
pub struct TestEnvironment {
    temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestEnvironment {
    pub fn new() -> Self {
        TestEnvironment {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path("out")
    }
}

/// Protein sequence of exactly `len` residues
#[allow(dead_code)]
pub fn protein(len: usize) -> String {
    "ACDEFGHIKLMNPQRSTVWY".chars().cycle().take(len).collect()
}

/// Three candidates of lengths 5, 50 and 700. Only ACC1 fits the default
/// window; the short one carries an ambiguous residue.
#[allow(dead_code)]
pub fn candidate_fasta() -> String {
    format!(
        ">ACC0 short fragment\nMKXLT\n>ACC1 putative kinase [Homo sapiens]\n{}\n>ACC2 long\n{}\n",
        protein(50),
        protein(700)
    )
}

#[allow(dead_code)]
pub fn reference_fasta() -> String {
    format!(">REF reference\n{}\n", protein(60))
}
