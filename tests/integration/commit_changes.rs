use test_support::{GitRepo, cmd_bin, read_csv, tempdir, write_manifest};

#[test]
fn commit_changes_looks_up_commits_from_matching_domain() {
  let td = tempdir();
  let src = td.path().join("src");
  let repo = GitRepo::init(&src.join("frameworks"));
  let base = repo.commit(&[("a.c", "a\n")], "base", "fixture@example.com", "2014-01-01T00:00:00Z");
  let ours = repo.commit(&[("a.c", "a\nb\n")], "ours", "dev@sonymobile.com", "2014-01-02T00:00:00Z");
  let theirs = repo.commit(&[("a.c", "a\nb\nc\n")], "theirs", "dev@example.org", "2014-01-03T00:00:00Z");

  let left = td.path().join("l.xml");
  let right = td.path().join("r.xml");
  write_manifest(&left, &[("fw", "frameworks", base.as_str())]);
  write_manifest(&right, &[("fw", "frameworks", theirs.as_str())]);

  let changes = serde_json::json!([
    {
      "_number": 7, "change_id": "I7", "project": "fw", "branch": "master",
      "created": "2014-01-02 00:00:00.000000000",
      "revisions": { ours.clone(): { "_number": 1, "files": { "a.c": { "lines_inserted": 1 } } } },
      "messages": [ { "date": "2014-01-02 00:00:01.000000000", "message": "Uploaded patch set 1." } ]
    },
    {
      "_number": 8, "change_id": "I8", "project": "fw", "branch": "master",
      "revisions": { theirs.clone(): { "_number": 1 } }
    }
  ]);

  let out_dir = td.path().join("out");
  cmd_bin("repo-change-report")
    .env("RCR_TEST_GERRIT_CHANGES_JSON", changes.to_string())
    .env("GERRIT_URL", "http://review.invalid")
    .arg("--out-dir")
    .arg(&out_dir)
    .args(["--prefix", "cc", "commit-changes", "--include-domain", "sony", "--left"])
    .arg(&left)
    .arg("--right")
    .arg(&right)
    .arg("--repo-root")
    .arg(&src)
    .assert()
    .success();

  let rows = read_csv(&out_dir.join("cc-changes.csv"));
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[1][0], "7");
  assert_eq!(rows[1][2], ours);

  let patchsets = read_csv(&out_dir.join("cc-patchsets.csv"));
  assert_eq!(patchsets[1][5], "2014-01-02 00:00:01.000000000");
  assert_eq!(read_csv(&out_dir.join("cc-files.csv")).len(), 2);
}

#[test]
fn no_matching_commits_still_writes_empty_reports() {
  let td = tempdir();
  let src = td.path().join("src");
  let repo = GitRepo::init(&src.join("p"));
  let a = repo.commit(&[("a.c", "a\n")], "a", "x@example.com", "2014-01-01T00:00:00Z");
  let b = repo.commit(&[("a.c", "b\n")], "b", "x@example.com", "2014-01-02T00:00:00Z");
  write_manifest(&td.path().join("l.xml"), &[("p", "p", a.as_str())]);
  write_manifest(&td.path().join("r.xml"), &[("p", "p", b.as_str())]);

  let out_dir = td.path().join("out");
  cmd_bin("repo-change-report")
    .env("RCR_TEST_GERRIT_CHANGES_JSON", "[]")
    .args(["--gerrit-url", "http://review.invalid", "--prefix", "e", "--out-dir"])
    .arg(&out_dir)
    .args(["commit-changes", "--include-domain", "sony", "--left"])
    .arg(td.path().join("l.xml"))
    .arg("--right")
    .arg(td.path().join("r.xml"))
    .arg("--repo-root")
    .arg(&src)
    .assert()
    .success()
    .stderr(predicates::str::contains("no commits to look up"));

  assert_eq!(read_csv(&out_dir.join("e-changes.csv")).len(), 1);
}
