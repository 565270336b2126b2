use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FidoConfig {
    #[serde(default)]
    pub filter: Thresholds,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Filter thresholds. Every comparison against these is strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_min_identity")]
    pub min_identity: f64,
    /// Set above 100 to keep identical sequences
    #[serde(default = "default_max_identity")]
    pub max_identity: f64,
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Minimum sequence identity (0.0-1.0) for two sequences to share a cluster
    #[serde(default = "default_min_seq_id")]
    pub min_seq_id: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory holding `makeblastdb` and `blastp` (PATH lookup when unset)
    #[serde(default)]
    pub blast_bin_dir: Option<PathBuf>,
    #[serde(default = "default_mmseqs")]
    pub mmseqs: PathBuf,
    #[serde(default = "default_clustalo")]
    pub clustalo: PathBuf,
    /// Directory holding `hmmbuild` and `hmmalign`
    #[serde(default = "default_hmmer_bin_dir")]
    pub hmmer_bin_dir: PathBuf,
    /// Kill an external tool after this many seconds (no limit when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Also write a human-readable BLAST report next to the tabular hits
    #[serde(default = "default_verbose_blast_report")]
    pub verbose_blast_report: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Contact address sent to NCBI with every request
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    #[serde(default = "default_hit_count")]
    pub hit_count: usize,
    #[serde(default = "default_expect")]
    pub expect: f64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

// Default value functions
fn default_min_length() -> usize { 0 }
fn default_max_length() -> usize { 600 }
fn default_min_identity() -> f64 { 30.0 }
fn default_max_identity() -> f64 { 101.0 }
fn default_min_coverage() -> f64 { 50.0 }
fn default_min_seq_id() -> f64 { 0.9 }
fn default_mmseqs() -> PathBuf { PathBuf::from("mmseqs") }
fn default_clustalo() -> PathBuf { PathBuf::from("./clustalo") }
fn default_hmmer_bin_dir() -> PathBuf { PathBuf::from("./hmmer/bin") }
fn default_verbose_blast_report() -> bool { true }
fn default_tool_name() -> String { "fido".to_string() }
fn default_hit_count() -> usize { 500 }
fn default_expect() -> f64 { 1e-4 }
fn default_batch_size() -> usize { 50 }
fn default_batch_delay_ms() -> u64 { 1000 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_backoff_ms() -> u64 { 5000 }
fn default_poll_interval_secs() -> u64 { 10 }
fn default_max_polls() -> u32 { 120 }

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            min_identity: default_min_identity(),
            max_identity: default_max_identity(),
            min_coverage: default_min_coverage(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_seq_id: default_min_seq_id(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            blast_bin_dir: None,
            mmseqs: default_mmseqs(),
            clustalo: default_clustalo(),
            hmmer_bin_dir: default_hmmer_bin_dir(),
            timeout_secs: None,
            verbose_blast_report: default_verbose_blast_report(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            email: None,
            tool_name: default_tool_name(),
            hit_count: default_hit_count(),
            expect: default_expect(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: default_max_polls(),
        }
    }
}

impl FidoConfig {
    /// Reject values no stage could run with.
    pub fn validate(&self) -> Result<(), crate::FidoError> {
        let invalid = |msg: String| Err(crate::FidoError::Config(msg));

        if self.filter.min_length >= self.filter.max_length {
            return invalid(format!(
                "min_length ({}) must be below max_length ({})",
                self.filter.min_length, self.filter.max_length
            ));
        }
        if self.filter.min_identity >= self.filter.max_identity {
            return invalid(format!(
                "min_identity ({}) must be below max_identity ({})",
                self.filter.min_identity, self.filter.max_identity
            ));
        }
        if !(0.0..=1.0).contains(&self.clustering.min_seq_id) {
            return invalid(format!(
                "min_seq_id must be between 0 and 1, got {}",
                self.clustering.min_seq_id
            ));
        }
        if self.remote.batch_size == 0 {
            return invalid("remote batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FidoConfig, crate::FidoError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        crate::FidoError::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config: FidoConfig = toml::from_str(&contents)
        .map_err(|e| crate::FidoError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &FidoConfig) -> Result<(), crate::FidoError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::FidoError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FidoConfig::default();

        assert_eq!(config.filter.min_length, 0);
        assert_eq!(config.filter.max_length, 600);
        assert_eq!(config.filter.min_identity, 30.0);
        assert_eq!(config.filter.max_identity, 101.0);
        assert_eq!(config.filter.min_coverage, 50.0);
        assert_eq!(config.clustering.min_seq_id, 0.9);
        assert_eq!(config.tools.hmmer_bin_dir, PathBuf::from("./hmmer/bin"));
        assert_eq!(config.tools.timeout_secs, None);
        assert_eq!(config.remote.batch_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[filter]
max_length = 450
min_identity = 40.0

[tools]
mmseqs = "/opt/mmseqs/bin/mmseqs"
timeout_secs = 3600
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.filter.max_length, 450);
        assert_eq!(config.filter.min_identity, 40.0);
        // untouched fields fall back to defaults
        assert_eq!(config.filter.min_coverage, 50.0);
        assert_eq!(config.clustering.min_seq_id, 0.9);
        assert_eq!(config.tools.mmseqs, PathBuf::from("/opt/mmseqs/bin/mmseqs"));
        assert_eq!(config.tools.timeout_secs, Some(3600));
        assert_eq!(config.tools.clustalo, PathBuf::from("./clustalo"));
    }

    #[test]
    fn test_save_and_reload() {
        let mut config = FidoConfig::default();
        config.clustering.min_seq_id = 0.7;
        config.remote.email = Some("curator@example.org".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        save_config(temp_file.path(), &config).unwrap();
        let reloaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[filter\nmin_length = ").unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_validate_rejects_inverted_windows() {
        let mut config = FidoConfig::default();
        config.filter.min_length = 600;
        assert!(config.validate().is_err());

        let mut config = FidoConfig::default();
        config.filter.min_identity = 200.0;
        assert!(config.validate().is_err());

        let mut config = FidoConfig::default();
        config.clustering.min_seq_id = 1.5;
        assert!(config.validate().is_err());
    }
}
