/// External tool wrappers and the process runner they share
pub mod blast;
pub mod clustalo;
pub mod hmmer;
pub mod mmseqs;
pub mod runner;
pub mod testing;
pub mod traits;
pub mod types;

pub use runner::{ToolInvocation, ToolRunner};
pub use traits::{ClusterOutput, Clusterer, HomologySearch, MultipleAligner, ProfileAligner, Toolchain};
pub use types::Tool;
