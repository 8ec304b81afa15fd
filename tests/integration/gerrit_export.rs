use std::path::Path;

use test_support::{cmd_bin, read_csv, read_fixture_json, read_fixture_text, tempdir};

const ENV: &str = "RCR_TEST_GERRIT_CHANGES_JSON";

fn gerrit(out_dir: &Path, query: &[&str]) -> assert_cmd::assert::Assert {
  cmd_bin("repo-change-report")
    .env(ENV, read_fixture_text("changes.json"))
    .args(["--gerrit-url", "http://review.invalid", "--prefix", "r", "--out-dir"])
    .arg(out_dir)
    .arg("gerrit")
    .args(query)
    .assert()
}

#[test]
fn fixture_has_three_changes() {
  let v: serde_json::Value = read_fixture_json("changes.json");
  assert_eq!(v.as_array().map(|a| a.len()), Some(3));
}

#[test]
fn numbers_query_writes_all_four_reports() {
  let td = tempdir();
  let out_dir = td.path().join("out");
  let assert = gerrit(&out_dir, &["--numbers", "1001,1002,1003", "--page-size", "2"]).success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  assert_eq!(stdout.lines().count(), 4);

  let changes = read_csv(&out_dir.join("r-changes.csv"));
  assert_eq!(
    changes[0],
    vec!["number", "change_id", "current_revision", "project", "branch", "num_patches", "date_created", "date_closed", "closed_by", "created_by", "reverted_by"]
  );
  // 1003 has no revisions and is skipped
  assert_eq!(changes.len(), 3);
  assert_eq!(
    changes[1],
    vec![
      "1001",
      "I1111111111111111111111111111111111111111",
      "aaaa000000000000000000000000000000000002",
      "platform/build",
      "master",
      "2",
      "2014-03-01 09:00:00.000000000",
      "2014-03-02 11:05:00.000000000",
      "merged",
      "cherry-pick",
      "I2222222222222222222222222222222222222222",
    ]
  );
  assert_eq!(changes[2][2], "bbbb000000000000000000000000000000000001");
  assert_eq!(changes[2][5], "1");
  assert_eq!(changes[2][7], "2014-03-06 08:00:00.000000000");
  assert_eq!(changes[2][8], "abandoned");
  assert_eq!(changes[2][9], "revert");
  assert_eq!(changes[2][10], "");

  let patchsets = read_csv(&out_dir.join("r-patchsets.csv"));
  assert_eq!(patchsets.len(), 4);
  assert_eq!(patchsets[1][1], "1");
  assert_eq!(patchsets[1][5], "2014-03-01 09:00:01.000000000");
  assert_eq!(patchsets[2][1], "2");
  assert_eq!(patchsets[2][3], "alice@example.com");
  assert!(patchsets[2][6].starts_with("Add ``build`` rule"));

  let reviews = read_csv(&out_dir.join("r-reviews.csv"));
  assert_eq!(reviews.len(), 8);
  assert_eq!(reviews[3], vec!["1001", "2", "Bob", "2014-03-02 11:00:00.000000000", "Patch Set 2: Code-Review+2 ``looks good``"]);
  assert_eq!(reviews[4][2], "Gerrit Code Review");
  assert_eq!(reviews[5][1], "");

  let files = read_csv(&out_dir.join("r-files.csv"));
  assert_eq!(files.len(), 6);
  assert_eq!(files[2], vec!["1001", "1", "core/Makefile", "", "3", "1"]);
  assert_eq!(files[5], vec!["1002", "1", "core/Makefile", "M", "1", "4"]);
}

#[test]
fn branch_query_filters_by_project_and_branch() {
  let td = tempdir();
  let out_dir = td.path().join("out");
  gerrit(&out_dir, &["--project", "platform/build", "--branch", "master"]).success();

  let changes = read_csv(&out_dir.join("r-changes.csv"));
  let numbers: Vec<&str> = changes[1..].iter().map(|r| r[0].as_str()).collect();
  assert_eq!(numbers, vec!["1001", "1002"]);
}

#[test]
fn unknown_numbers_produce_header_only_reports() {
  let td = tempdir();
  let out_dir = td.path().join("out");
  gerrit(&out_dir, &["--numbers", "9999"]).success();
  for kind in ["changes", "patchsets", "reviews", "files"] {
    let rows = read_csv(&out_dir.join(format!("r-{}.csv", kind)));
    assert_eq!(rows.len(), 1, "{} should hold only its header", kind);
  }
}
