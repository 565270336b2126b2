pub mod assemble;
pub mod curate;
pub mod fetch;
pub mod tools;

use crate::core::config::{load_config, FidoConfig};
use std::path::Path;

/// Configuration from `path`, or the defaults when none is given
pub(crate) fn resolve_config(path: Option<&Path>) -> anyhow::Result<FidoConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            Ok(load_config(path)?)
        }
        None => Ok(FidoConfig::default()),
    }
}
