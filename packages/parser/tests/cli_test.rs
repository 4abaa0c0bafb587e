//! Tests for the `pdi-parser` binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("etl")
        .join(name)
}

fn pdi_parser() -> Command {
    let mut cmd = Command::cargo_bin("pdi-parser").unwrap();
    cmd.env_remove("PDI_FOLLOW_REFERENCES")
        .env_remove("PDI_MAX_DEPTH")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_job_command_reports_each_document() {
    pdi_parser()
        .arg("job")
        .arg(fixture("main_job.kjb"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Job: sub_job"))
        .stdout(predicate::str::contains("Transformation: load_customers"))
        .stdout(predicate::str::contains("Job: main_job"))
        .stdout(predicate::str::contains("| Caller step: Load customers"))
        .stdout(predicate::str::contains("| - RUN_DATE (default: 2016-11-24)"))
        .stdout(predicate::str::contains("Analyzed 3 document(s)"))
        .stdout(predicate::str::contains("Warnings: 1"))
        .stdout(predicate::str::contains("missing.ktr"));
}

#[test]
fn test_no_follow_flag() {
    pdi_parser()
        .args(["job", "--no-follow"])
        .arg(fixture("main_job.kjb"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1 document(s)"))
        .stdout(predicate::str::contains("Transformation: load_customers").not())
        .stdout(predicate::str::contains("Warnings").not());
}

#[test]
fn test_env_disables_following() {
    pdi_parser()
        .env("PDI_FOLLOW_REFERENCES", "false")
        .arg("analyze")
        .arg(fixture("main_job.kjb"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1 document(s)"));
}

#[test]
fn test_transformation_command_lists_variables() {
    pdi_parser()
        .arg("transformation")
        .arg(fixture("load_customers.ktr"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "| - BATCH_ID set by 'Set batch variables' scope ROOT_JOB",
        ))
        .stdout(predicate::str::contains("Transformation: child"));
}

#[test]
fn test_missing_root_fails() {
    pdi_parser()
        .arg("job")
        .arg(fixture("nope.kjb"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("was not found"));
}

#[test]
fn test_analyze_rejects_unknown_extension() {
    pdi_parser()
        .arg("analyze")
        .arg(fixture("notes.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a .kjb or .ktr file"));
}

#[test]
fn test_invalid_max_depth_env() {
    pdi_parser()
        .env("PDI_MAX_DEPTH", "deep")
        .arg("job")
        .arg(fixture("main_job.kjb"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("PDI_MAX_DEPTH must be a number"));
}
