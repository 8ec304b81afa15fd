use predicates::prelude::*;
use test_support::{cmd_bin, tempdir};

#[test]
fn numbers_with_project_fails_before_any_output() {
  let td = tempdir();
  let out_dir = td.path().join("out");

  cmd_bin("repo-change-report")
    .args(["--gerrit-url", "http://127.0.0.1:9", "--out-dir"])
    .arg(&out_dir)
    .args(["gerrit", "--project", "p", "--branch", "b", "--numbers", "1,2"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Parameter combination is wrong"));

  assert!(!out_dir.exists());
}

#[test]
fn gerrit_without_url_is_rejected() {
  let td = tempdir();
  cmd_bin("repo-change-report")
    .current_dir(td.path())
    .args(["gerrit", "--numbers", "1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--gerrit-url"));
  assert!(!td.path().join("result-dir").exists());
}

#[test]
fn missing_subcommand_is_an_error() {
  cmd_bin("repo-change-report")
    .assert()
    .failure()
    .stderr(predicate::str::contains("subcommand is required"));
}
