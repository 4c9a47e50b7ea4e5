//! Filesystem edge cases: missing inputs, unusable output locations

use crate::common::{sample_data, CliTestRunner};
use std::fs;

#[test]
fn test_missing_old_file() {
    let runner = CliTestRunner::new().unwrap();
    let v2 = runner.fixture().create_csv("v2.csv", &sample_data::stock_v2()).unwrap();
    let missing = runner.fixture().root().join("nope.csv");

    let error = runner.expect_failure(&[missing.to_str().unwrap(), v2.to_str().unwrap()]);
    assert!(error.to_string().contains("File not found"));
    assert!(error.to_string().contains("nope.csv"));
}

#[test]
fn test_missing_new_file() {
    let runner = CliTestRunner::new().unwrap();
    let v1 = runner.fixture().create_csv("v1.csv", &sample_data::stock_v1()).unwrap();
    let missing = runner.fixture().root().join("v2_missing.csv");

    let error = runner.expect_failure(&[v1.to_str().unwrap(), missing.to_str().unwrap()]);
    assert!(error.to_string().contains("v2_missing.csv"));
}

#[test]
fn test_directory_as_input() {
    let runner = CliTestRunner::new().unwrap();
    let v1 = runner.fixture().create_csv("v1.csv", &sample_data::stock_v1()).unwrap();
    let dir = runner.fixture().root().join("folder");
    fs::create_dir_all(&dir).unwrap();

    let error = runner.expect_failure(&[v1.to_str().unwrap(), dir.to_str().unwrap()]);
    assert!(error.to_string().contains("not a file"));
}

#[test]
fn test_outdir_is_a_file() {
    let runner = CliTestRunner::new().unwrap();
    let v1 = runner.fixture().create_csv("v1.csv", &sample_data::stock_v1()).unwrap();
    let v2 = runner.fixture().create_csv("v2.csv", &sample_data::stock_v2()).unwrap();
    let blocker = runner.fixture().create_csv_raw("blocker", "not a directory").unwrap();

    let error = runner.expect_failure(&[
        v1.to_str().unwrap(), v2.to_str().unwrap(), "--outdir", blocker.to_str().unwrap(),
    ]);
    assert!(matches!(error, stockrecon::ReconError::Io(_)));
}

#[test]
fn test_rerun_overwrites_previous_results() {
    let runner = CliTestRunner::new().unwrap();
    let v1 = runner.fixture().create_csv("v1.csv", &sample_data::stock_v1()).unwrap();
    let v2 = runner.fixture().create_csv("v2.csv", &sample_data::stock_v2()).unwrap();

    let first = runner.expect_success(&[v1.to_str().unwrap(), v2.to_str().unwrap()]);
    let first_content = fs::read_to_string(&first.outputs.only_old).unwrap();

    let second = runner.expect_success(&[v1.to_str().unwrap(), v1.to_str().unwrap()]);
    let second_content = fs::read_to_string(&second.outputs.only_old).unwrap();

    assert_ne!(first_content, second_content);
    assert_eq!(second_content, "ItemNo,LocationCode,Qty,Reserved\n");
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let runner = CliTestRunner::new().unwrap();
    let v1 = runner.fixture().create_csv("v1.csv", &sample_data::stock_v1()).unwrap();
    let v2 = runner.fixture().create_csv("v2.csv", &sample_data::stock_v2()).unwrap();

    let first = runner.expect_success(&[v1.to_str().unwrap(), v2.to_str().unwrap(), "--prefix", "a"]);
    let second = runner.expect_success(&[v1.to_str().unwrap(), v2.to_str().unwrap(), "--prefix", "b"]);

    for (a, b) in first.outputs.all().iter().zip(second.outputs.all().iter()) {
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }
}
