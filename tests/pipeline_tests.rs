/// End-to-end runs of the curation pipeline against in-process tools
mod common;

use common::{candidate_fasta, protein, reference_fasta, TestEnvironment, ACC1_HIT};
use fido::bio::FastaStore;
use fido::core::pipeline::{PipelineInputs, PipelineReport, Stage};
use fido::core::StagePaths;
use fido::tools::testing::{FailingTool, MockAligner, MockClusterer, MockProfileAligner, MockSearch};
use fido::tools::{ClusterOutput, Clusterer, Toolchain};
use fido::{FidoConfig, FidoError, PipelineDriver};
use pretty_assertions::assert_eq;
use std::path::Path;

fn setup() -> (TestEnvironment, PipelineInputs) {
    let env = TestEnvironment::new();
    let input = env.write("input.fasta", &candidate_fasta());
    let reference = env.write("reference.fasta", &reference_fasta());
    (env, PipelineInputs::new(input, reference))
}

fn driver(env: &TestEnvironment, project: Option<&str>, toolchain: Toolchain) -> PipelineDriver {
    PipelineDriver::new(
        FidoConfig::default(),
        StagePaths::new(env.output_dir(), project.map(str::to_string)),
        toolchain,
    )
}

fn fido_error(error: &anyhow::Error) -> Option<&FidoError> {
    error.chain().find_map(|cause| cause.downcast_ref::<FidoError>())
}

/// Writes a member table that leaves out one accession
struct DroppingClusterer {
    dropped: String,
}

impl Clusterer for DroppingClusterer {
    fn cluster(
        &self,
        input: &Path,
        min_seq_id: f64,
        out_prefix: &Path,
        tmp_dir: &Path,
    ) -> fido::Result<ClusterOutput> {
        let outputs = MockClusterer::new().cluster(input, min_seq_id, out_prefix, tmp_dir)?;
        let table = std::fs::read_to_string(&outputs.members)?;
        let kept: String = table
            .lines()
            .filter(|line| !line.ends_with(&format!("\t{}", self.dropped)))
            .map(|line| format!("{}\n", line))
            .collect();
        std::fs::write(&outputs.members, kept)?;
        Ok(outputs)
    }

    fn name(&self) -> &str {
        "dropping-clusterer"
    }
}

#[test]
fn test_single_survivor_end_to_end() {
    let (env, inputs) = setup();
    let driver = driver(&env, None, Toolchain::mock(ACC1_HIT));

    let report = driver.run(&inputs).unwrap();

    assert_eq!(report.input_sequences, 3);
    assert_eq!(report.length_filter.kept, 1);
    assert_eq!(report.length_filter.removed, 2);
    assert_eq!(report.homology.retained, 1);
    assert_eq!(report.dataset_rows, 1);
    assert_eq!(report.alignment_width, 50);

    let step_1 = FastaStore::load(driver.paths().length_filtered()).unwrap();
    assert_eq!(step_1.accessions().collect::<Vec<_>>(), vec!["ACC1"]);

    let csv = std::fs::read_to_string(driver.paths().dataset()).unwrap();
    assert_eq!(
        csv,
        format!("index,accession,sequence,cluster_ID\n0,ACC1,{},ACC1\n", protein(50))
    );
}

#[test]
fn test_report_written_with_project_prefix() {
    let (env, inputs) = setup();
    let driver = driver(&env, Some("kinase"), Toolchain::mock(ACC1_HIT));

    let report = driver.run(&inputs).unwrap();

    let dataset = env.output_dir().join("kinase_final_alignment_with_clust_ids.csv");
    let report_path = env.output_dir().join("kinase_pipeline_report.json");
    assert!(dataset.exists());
    assert!(!env.output_dir().join("final_alignment_with_clust_ids.csv").exists());

    let saved = PipelineReport::load(&report_path).unwrap();
    assert_eq!(saved, report);
    assert_eq!(saved.artifact(Stage::Assembly), Some(dataset.as_path()));
    assert!(saved.finished_at >= saved.started_at);
}

#[test]
fn test_anchors_join_clustering_and_alignment() {
    let (env, inputs) = setup();
    let anchors = env.write(
        "anchors.fasta",
        &format!(">sp|P00001 anchor kinase\n{}\n", protein(40)),
    );
    let toolchain = Toolchain {
        search: Box::new(MockSearch::new(ACC1_HIT)),
        clusterer: Box::new(MockClusterer::new().with_assignment("ACC1", "P00001")),
        aligner: Box::new(MockAligner),
        profile: Box::new(MockProfileAligner),
    };
    let driver = driver(&env, None, toolchain);

    let report = driver.run(&inputs.with_anchors(anchors)).unwrap();

    assert_eq!(report.anchors_added_to_pool, 1);
    // the anchor was clustered under ACC1, so it is re-added before alignment
    assert_eq!(report.anchors_added_to_representatives, 1);

    let pool = FastaStore::load(driver.paths().homology_filtered()).unwrap();
    assert_eq!(pool.accessions().collect::<Vec<_>>(), vec!["ACC1", "P00001"]);

    let aligned_reps = FastaStore::load(driver.paths().aligned_representatives()).unwrap();
    assert!(aligned_reps.contains("P00001"));

    let csv = std::fs::read_to_string(driver.paths().dataset()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[2].starts_with("1,P00001,"));
    assert!(rows[2].ends_with(",ACC1"));
}

#[test]
fn test_hit_outside_pool_aborts_run() {
    let (env, inputs) = setup();
    let driver = driver(&env, None, Toolchain::mock("S9,GHOST9,1e-20,80.0,90,90.0,90.0\n"));

    let err = driver.run(&inputs).unwrap_err();

    match fido_error(&err) {
        Some(FidoError::MissingAccession { accession, .. }) => assert_eq!(accession, "S9"),
        other => panic!("expected MissingAccession, got {:?}", other),
    }
    assert!(format!("{:#}", err).contains("homology filter"));
    assert!(driver.paths().length_filtered().exists());
    assert!(!driver.paths().homology_filtered().exists());
    assert!(!driver.paths().dataset().exists());
}

#[test]
fn test_missing_cluster_entry_leaves_no_dataset() {
    let (env, inputs) = setup();
    let anchors = env.write("anchors.fasta", &format!(">P00001\n{}\n", protein(40)));
    let toolchain = Toolchain {
        search: Box::new(MockSearch::new(ACC1_HIT)),
        clusterer: Box::new(DroppingClusterer {
            dropped: "P00001".to_string(),
        }),
        aligner: Box::new(MockAligner),
        profile: Box::new(MockProfileAligner),
    };
    let driver = driver(&env, None, toolchain);

    let err = driver.run(&inputs.with_anchors(anchors)).unwrap_err();

    assert!(matches!(
        fido_error(&err),
        Some(FidoError::MissingAccession { .. })
    ));
    assert!(driver.paths().full_alignment().exists());
    assert!(!driver.paths().dataset().exists());
    assert!(!driver.paths().report().exists());
}

#[test]
fn test_tool_failure_names_stage_and_keeps_upstream_files() {
    let (env, inputs) = setup();
    let toolchain = Toolchain {
        search: Box::new(MockSearch::new(ACC1_HIT)),
        clusterer: Box::new(MockClusterer::new()),
        aligner: Box::new(FailingTool::new("exited with code 1")),
        profile: Box::new(MockProfileAligner),
    };
    let driver = driver(&env, None, toolchain);

    let err = driver.run(&inputs).unwrap_err();

    assert!(matches!(
        fido_error(&err),
        Some(FidoError::ToolInvocation { .. })
    ));
    assert!(format!("{:#}", err).contains("representative alignment"));
    assert!(driver.paths().homology_filtered().exists());
    assert!(driver.paths().representatives().exists());
    assert!(!driver.paths().aligned_representatives().exists());
}

#[test]
fn test_nothing_passes_length_window() {
    let env = TestEnvironment::new();
    let input = env.write("input.fasta", ">A\nMKXV\n>B\nMKVL\n");
    let reference = env.write("reference.fasta", &reference_fasta());
    let mut config = FidoConfig::default();
    config.filter.min_length = 10;
    let driver = PipelineDriver::new(
        config,
        StagePaths::new(env.output_dir(), None),
        Toolchain::mock(""),
    );

    let err = driver.run(&PipelineInputs::new(input, reference)).unwrap_err();

    assert!(err.to_string().contains("no sequences"));
    assert!(!driver.paths().blast_hits().exists());
}

#[test]
fn test_malformed_input_reports_line() {
    let env = TestEnvironment::new();
    let input = env.write("input.fasta", "\nMKVLT\n>A\nMK\n");
    let reference = env.write("reference.fasta", &reference_fasta());
    let driver = driver(&env, None, Toolchain::mock(ACC1_HIT));

    let err = driver.run(&PipelineInputs::new(input, reference)).unwrap_err();

    match fido_error(&err) {
        Some(FidoError::MalformedInput { line, .. }) => assert_eq!(*line, 2),
        other => panic!("expected MalformedInput, got {:?}", other),
    }
}
