/// Sequencing of the curation stages
///
/// Each stage reads the file the previous stage wrote. Core components work on
/// in-memory stores; this module is the only place that turns them into files
/// and hands those files to the external tools.
use crate::bio::homology::load_hits;
use crate::bio::{ClusterTable, DatasetAssembler, FastaStore, FilterSummary, HomologyFilter, HomologySummary, LengthCompositionFilter};
use crate::core::config::{FidoConfig, Thresholds};
use crate::core::paths::StagePaths;
use crate::tools::Toolchain;
use crate::utils::atomic::write_atomic;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stages in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    LengthFilter,
    HomologySearch,
    HomologyFilter,
    Clustering,
    RepresentativeAlignment,
    ProfileAlignment,
    Assembly,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::LengthFilter,
        Stage::HomologySearch,
        Stage::HomologyFilter,
        Stage::Clustering,
        Stage::RepresentativeAlignment,
        Stage::ProfileAlignment,
        Stage::Assembly,
    ];

    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0) + 1
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::LengthFilter => "length/composition filter",
            Stage::HomologySearch => "homology search",
            Stage::HomologyFilter => "homology filter",
            Stage::Clustering => "clustering",
            Stage::RepresentativeAlignment => "representative alignment",
            Stage::ProfileAlignment => "profile alignment",
            Stage::Assembly => "dataset assembly",
        };
        write!(f, "{}", name)
    }
}

/// Files supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInputs {
    /// Candidate sequences
    pub input: PathBuf,
    /// Query for the homology search
    pub reference: PathBuf,
    /// Sequences forced into clustering and alignment
    pub anchors: Option<PathBuf>,
}

impl PipelineInputs {
    pub fn new(input: impl Into<PathBuf>, reference: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            reference: reference.into(),
            anchors: None,
        }
    }

    pub fn with_anchors(mut self, anchors: impl Into<PathBuf>) -> Self {
        self.anchors = Some(anchors.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageArtifact {
    pub stage: Stage,
    pub path: PathBuf,
}

/// Summary of a completed run, written as JSON next to the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub inputs: PipelineInputs,
    pub thresholds: Thresholds,
    pub min_seq_id: f64,
    pub input_sequences: usize,
    pub length_filter: FilterSummary,
    pub homology: HomologySummary,
    pub anchors_added_to_pool: usize,
    pub anchors_added_to_representatives: usize,
    pub clusters: usize,
    pub aligned_sequences: usize,
    pub alignment_width: usize,
    pub dataset_rows: usize,
    pub artifacts: Vec<StageArtifact>,
}

impl PipelineReport {
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        write_atomic(path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, self).map_err(std::io::Error::from)?;
            writeln!(writer)?;
            Ok(())
        })
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| crate::FidoError::Io(std::io::Error::from(e)))
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn artifact(&self, stage: Stage) -> Option<&Path> {
        self.artifacts
            .iter()
            .rev()
            .find(|a| a.stage == stage)
            .map(|a| a.path.as_path())
    }
}

/// Runs every stage in order against one output directory.
pub struct PipelineDriver {
    config: FidoConfig,
    paths: StagePaths,
    toolchain: Toolchain,
}

impl PipelineDriver {
    pub fn new(config: FidoConfig, paths: StagePaths, toolchain: Toolchain) -> Self {
        Self {
            config,
            paths,
            toolchain,
        }
    }

    pub fn config(&self) -> &FidoConfig {
        &self.config
    }

    pub fn paths(&self) -> &StagePaths {
        &self.paths
    }

    /// Execute the full pipeline.
    ///
    /// Stops at the first failing stage. Files written by earlier stages are
    /// left in place; the failing stage leaves nothing behind.
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineReport> {
        let started_at = Utc::now();
        let thresholds = self.config.filter;
        let paths = &self.paths;

        for dir in paths.directories() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }

        let anchors = match &inputs.anchors {
            Some(path) => Some(load_anchors(path)?),
            None => None,
        };

        // 1. length and composition
        self.announce(Stage::LengthFilter);
        let candidates = FastaStore::load(&inputs.input)
            .with_context(|| stage_error(Stage::LengthFilter, &[&inputs.input]))?;
        let input_sequences = candidates.len();
        let (kept, length_filter) = LengthCompositionFilter::new(thresholds).apply(&candidates);
        let pool = kept
            .normalized()
            .with_context(|| stage_error(Stage::LengthFilter, &[&inputs.input]))?;
        if pool.is_empty() {
            bail!(
                "{}: no sequences in {} passed the length window ({}, {})",
                Stage::LengthFilter,
                inputs.input.display(),
                thresholds.min_length,
                thresholds.max_length
            );
        }
        pool.save(paths.length_filtered(), false)
            .with_context(|| stage_error(Stage::LengthFilter, &[&inputs.input]))?;

        // 2. homology search of the reference against the filtered pool
        self.announce(Stage::HomologySearch);
        self.toolchain
            .search
            .search(
                &inputs.reference,
                &paths.length_filtered(),
                &paths.blast_db(),
                &paths.blast_hits(),
                Some(&paths.blast_report()),
            )
            .with_context(|| stage_error(Stage::HomologySearch, &[&inputs.reference, &paths.length_filtered()]))?;

        // 3. homology filter
        self.announce(Stage::HomologyFilter);
        let hits = load_hits(paths.blast_hits())
            .with_context(|| stage_error(Stage::HomologyFilter, &[&paths.blast_hits()]))?;
        let (mut homologs, homology) = HomologyFilter::new(thresholds)
            .apply(&pool, &hits)
            .with_context(|| stage_error(Stage::HomologyFilter, &[&paths.blast_hits(), &paths.length_filtered()]))?;
        if homologs.is_empty() && anchors.as_ref().map_or(true, FastaStore::is_empty) {
            bail!(
                "{}: no sequences in {} passed the identity/coverage thresholds",
                Stage::HomologyFilter,
                paths.length_filtered().display()
            );
        }
        let anchors_added_to_pool = match &anchors {
            Some(anchors) => inject_anchors(&mut homologs, anchors, "homology-filtered pool"),
            None => 0,
        };
        homologs
            .save(paths.homology_filtered(), false)
            .with_context(|| stage_error(Stage::HomologyFilter, &[&paths.blast_hits()]))?;

        // 4. redundancy reduction
        self.announce(Stage::Clustering);
        let clustered = self
            .toolchain
            .clusterer
            .cluster(
                &paths.homology_filtered(),
                self.config.clustering.min_seq_id,
                &paths.cluster_prefix(),
                &paths.cluster_tmp(),
            )
            .with_context(|| stage_error(Stage::Clustering, &[&paths.homology_filtered()]))?;

        // 5. align the representatives, anchors included
        self.announce(Stage::RepresentativeAlignment);
        let mut representatives = FastaStore::load(&clustered.representatives)
            .with_context(|| stage_error(Stage::RepresentativeAlignment, &[&clustered.representatives]))?;
        let anchors_added_to_representatives = match &anchors {
            Some(anchors) => {
                let added = inject_anchors(&mut representatives, anchors, "representatives");
                if added > 0 {
                    representatives
                        .save(&clustered.representatives, false)
                        .with_context(|| {
                            stage_error(Stage::RepresentativeAlignment, &[&clustered.representatives])
                        })?;
                }
                added
            }
            None => 0,
        };
        self.toolchain
            .aligner
            .align(&clustered.representatives, &paths.aligned_representatives())
            .with_context(|| stage_error(Stage::RepresentativeAlignment, &[&clustered.representatives]))?;

        // 6. profile from the aligned representatives, applied to every homolog
        self.announce(Stage::ProfileAlignment);
        self.toolchain
            .profile
            .build_and_align(
                &paths.aligned_representatives(),
                &paths.homology_filtered(),
                &paths.profile_hmm(),
                &paths.full_alignment(),
            )
            .with_context(|| {
                stage_error(
                    Stage::ProfileAlignment,
                    &[&paths.aligned_representatives(), &paths.homology_filtered()],
                )
            })?;

        // 7. join alignment with cluster labels
        self.announce(Stage::Assembly);
        let aligned = FastaStore::load(paths.full_alignment())
            .with_context(|| stage_error(Stage::Assembly, &[&paths.full_alignment()]))?;
        let clusters = ClusterTable::load(&clustered.members)
            .with_context(|| stage_error(Stage::Assembly, &[&clustered.members]))?;
        let dataset = DatasetAssembler::new()
            .assemble(&aligned, &clusters)
            .with_context(|| stage_error(Stage::Assembly, &[&paths.full_alignment(), &clustered.members]))?;
        dataset
            .save(paths.dataset())
            .with_context(|| stage_error(Stage::Assembly, &[&paths.full_alignment(), &clustered.members]))?;

        let report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            inputs: inputs.clone(),
            thresholds,
            min_seq_id: self.config.clustering.min_seq_id,
            input_sequences,
            length_filter,
            homology,
            anchors_added_to_pool,
            anchors_added_to_representatives,
            clusters: clusters.representatives().len(),
            aligned_sequences: aligned.len(),
            alignment_width: dataset.width,
            dataset_rows: dataset.len(),
            artifacts: self.artifacts(&clustered.representatives, &clustered.members),
        };
        report
            .save(&paths.report())
            .with_context(|| format!("Failed to write run report {}", paths.report().display()))?;

        tracing::info!(
            "Pipeline finished: {} rows written to {}",
            report.dataset_rows,
            paths.dataset().display()
        );
        Ok(report)
    }

    fn announce(&self, stage: Stage) {
        tracing::info!("Stage {}/{}: {}", stage.number(), Stage::ALL.len(), stage);
    }

    fn artifacts(&self, representatives: &Path, members: &Path) -> Vec<StageArtifact> {
        let paths = &self.paths;
        let entry = |stage, path: PathBuf| StageArtifact { stage, path };
        vec![
            entry(Stage::LengthFilter, paths.length_filtered()),
            entry(Stage::HomologySearch, paths.blast_hits()),
            entry(Stage::HomologyFilter, paths.homology_filtered()),
            entry(Stage::Clustering, representatives.to_path_buf()),
            entry(Stage::Clustering, members.to_path_buf()),
            entry(Stage::RepresentativeAlignment, paths.aligned_representatives()),
            entry(Stage::ProfileAlignment, paths.full_alignment()),
            entry(Stage::Assembly, paths.dataset()),
        ]
    }
}

fn stage_error<P: AsRef<Path>>(stage: Stage, inputs: &[P]) -> String {
    let names = inputs
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Stage '{}' failed (inputs: {})", stage, names)
}

/// Anchor FASTA with accessions normalised the same way stage files are
fn load_anchors(path: &Path) -> Result<FastaStore> {
    let anchors = FastaStore::load(path)
        .and_then(|store| store.normalized())
        .with_context(|| format!("Failed to load anchor sequences from {}", path.display()))?;
    tracing::info!("Loaded {} anchor sequences from {}", anchors.len(), path.display());
    Ok(anchors)
}

fn inject_anchors(target: &mut FastaStore, anchors: &FastaStore, label: &str) -> usize {
    let added = target.merge_missing(anchors);
    tracing::info!("Added {} of {} anchor sequences to the {}", added, anchors.len(), label);
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_numbering() {
        assert_eq!(Stage::LengthFilter.number(), 1);
        assert_eq!(Stage::Assembly.number(), 7);
        assert_eq!(Stage::ProfileAlignment.to_string(), "profile alignment");
    }

    #[test]
    fn test_stage_error_lists_inputs() {
        let message = stage_error(Stage::Clustering, &[Path::new("a.fasta"), Path::new("b.tsv")]);
        assert_eq!(message, "Stage 'clustering' failed (inputs: a.fasta, b.tsv)");
    }

    #[test]
    fn test_inputs_builder() {
        let inputs = PipelineInputs::new("in.fasta", "ref.fasta").with_anchors("anchors.fasta");
        assert_eq!(inputs.anchors, Some(PathBuf::from("anchors.fasta")));
    }
}
