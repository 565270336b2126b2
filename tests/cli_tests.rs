/// Smoke tests for the `fido` binary
mod common;

use assert_cmd::Command;
use common::{candidate_fasta, reference_fasta, TestEnvironment};
use predicates::prelude::*;

fn fido() -> Command {
    let mut cmd = Command::cargo_bin("fido").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("FIDO_CONFIG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    fido()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("curate"))
        .stdout(predicate::str::contains("assemble"))
        .stdout(predicate::str::contains("fetch"));
}

#[test]
fn test_assemble_writes_dataset() {
    let env = TestEnvironment::new();
    let aligned = env.write("aligned.fasta", ">ACC1\nMKV--LT\n>ACC2\nMKVA\n");
    let clusters = env.write("clusters.tsv", "ACC1\tACC1\nACC1\tACC2\n");
    let output = env.path("dataset.csv");

    fido()
        .arg("assemble")
        .arg("--aligned")
        .arg(&aligned)
        .arg("--clusters")
        .arg(&clusters)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 rows"));

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "index,accession,sequence,cluster_ID\n0,ACC1,MKV--LT,ACC1\n1,ACC2,MKVA---,ACC1\n"
    );
}

#[test]
fn test_assemble_missing_cluster_exits_5() {
    let env = TestEnvironment::new();
    let aligned = env.write("aligned.fasta", ">ACC1\nMKV\n>ACC2\nMKV\n");
    let clusters = env.write("clusters.tsv", "ACC1\tACC1\n");
    let output = env.path("dataset.csv");

    fido()
        .args(["assemble", "--aligned"])
        .arg(&aligned)
        .arg("--clusters")
        .arg(&clusters)
        .arg("-o")
        .arg(&output)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("ACC2"));

    assert!(!output.exists());
}

#[test]
fn test_assemble_malformed_fasta_exits_4() {
    let env = TestEnvironment::new();
    let aligned = env.write("aligned.fasta", "MKV\n>ACC1\nMKV\n");
    let clusters = env.write("clusters.tsv", "ACC1\tACC1\n");

    fido()
        .args(["assemble", "--aligned"])
        .arg(&aligned)
        .arg("--clusters")
        .arg(&clusters)
        .arg("-o")
        .arg(env.path("dataset.csv"))
        .assert()
        .code(4);
}

#[test]
fn test_curate_rejects_bad_cluster_identity() {
    let env = TestEnvironment::new();
    let input = env.write("input.fasta", &candidate_fasta());
    let reference = env.write("reference.fasta", &reference_fasta());

    fido()
        .arg("curate")
        .arg("-i")
        .arg(&input)
        .arg("-r")
        .arg(&reference)
        .arg("-o")
        .arg(env.output_dir())
        .args(["--min-seq-id", "1.5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("min_seq_id"));
}

#[test]
fn test_curate_without_tools_exits_6() {
    let env = TestEnvironment::new();
    let input = env.write("input.fasta", &candidate_fasta());
    let reference = env.write("reference.fasta", &reference_fasta());
    let config = env.write(
        "fido.toml",
        "[tools]\nblast_bin_dir = \"/nonexistent/blast\"\nmmseqs = \"/nonexistent/mmseqs\"\n",
    );

    fido()
        .arg("curate")
        .arg("-i")
        .arg(&input)
        .arg("-r")
        .arg(&reference)
        .arg("-o")
        .arg(env.output_dir())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(6);

    assert!(!env.output_dir().exists());
}

#[test]
fn test_missing_config_file_exits_2() {
    let env = TestEnvironment::new();

    fido()
        .arg("curate")
        .args(["-i", "in.fasta", "-r", "ref.fasta", "-o"])
        .arg(env.output_dir())
        .arg("--config")
        .arg(env.path("absent.toml"))
        .assert()
        .code(2);
}

#[test]
fn test_tools_reports_missing_binaries_as_json() {
    let env = TestEnvironment::new();
    let config = env.write("fido.toml", "[tools]\nhmmer_bin_dir = \"/nonexistent/hmmer\"\n");

    fido()
        .args(["tools", "--format", "json", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"HmmAlign\""))
        .stdout(predicate::str::contains("/nonexistent/hmmer/hmmalign"));
}
