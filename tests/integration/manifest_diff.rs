use test_support::{cmd_bin, read_csv, tempdir, write_manifest};

#[test]
fn manifest_diff_lists_common_projects_with_new_revision() {
  let td = tempdir();
  let left = td.path().join("left.xml");
  let right = td.path().join("right.xml");
  write_manifest(
    &left,
    &[("platform/build", "build", "aaa"), ("platform/art", "art", "bbb"), ("gone", "gone", "ccc")],
  );
  write_manifest(
    &right,
    &[("platform/build", "build", "aaa"), ("platform/art", "art", "bbb2"), ("new", "new", "ddd")],
  );

  let out_dir = td.path().join("out");
  let assert = cmd_bin("repo-change-report")
    .arg("--out-dir")
    .arg(&out_dir)
    .args(["--prefix", "run", "manifest-diff", "--left"])
    .arg(&left)
    .arg("--right")
    .arg(&right)
    .assert()
    .success();

  let report = out_dir.join("run-manifest-diff.csv");
  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  assert_eq!(stdout.trim(), report.display().to_string());

  let rows = read_csv(&report);
  assert_eq!(rows[0], vec!["project", "path", "lrev", "rrev"]);
  assert_eq!(rows[1..], [vec!["platform/art", "art", "bbb", "bbb2"]]);
}

#[test]
fn malformed_manifest_fails_with_path() {
  let td = tempdir();
  let bad = td.path().join("bad.xml");
  std::fs::write(&bad, "<manifest><project").unwrap();
  cmd_bin("repo-change-report")
    .arg("--out-dir")
    .arg(td.path().join("out"))
    .args(["manifest-diff", "--left"])
    .arg(&bad)
    .arg("--right")
    .arg(&bad)
    .assert()
    .failure()
    .stderr(predicates::str::contains("bad.xml"));
}
