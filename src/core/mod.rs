pub mod config;
pub mod paths;
pub mod pipeline;

pub use config::{FidoConfig, Thresholds};
pub use paths::StagePaths;
pub use pipeline::{PipelineDriver, PipelineInputs, PipelineReport, Stage};
