pub mod accession;
pub mod cluster;
pub mod dataset;
pub mod fasta;
pub mod filter;
pub mod homology;
pub mod sequence;

pub use cluster::ClusterTable;
pub use dataset::{Dataset, DatasetAssembler, DatasetRow};
pub use fasta::FastaStore;
pub use filter::{FilterSummary, LengthCompositionFilter};
pub use homology::{AlignmentHit, HomologyFilter, HomologySummary};
pub use sequence::FastaRecord;
