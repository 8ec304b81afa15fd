use predicates::prelude::*;
use test_support::{GitRepo, cmd_bin, read_csv, tempdir, write_manifest};

#[test]
fn snapshot_reports_found_projects_and_metrics() {
  let td = tempdir();
  let src = td.path().join("src");
  for (dir, file, body) in [
    ("build", "core/Makefile", "all:\n\techo\n"),
    ("art", "runtime/a.cc", "int a;\nint b;\nint c;\n"),
    ("app", "src/Main.java", "class Main {}\n"),
  ] {
    let p = src.join(dir).join(file);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, body).unwrap();
  }
  std::fs::write(src.join("app/AndroidManifest.xml"), "<manifest/>\n").unwrap();

  let manifest = td.path().join("default.xml");
  write_manifest(
    &manifest,
    &[
      ("platform/build", "build", "1111111111"),
      ("platform/art", "art", "2222222222"),
      ("platform/app", "app", "3333333333"),
      ("platform/missing", "missing", "4444444444"),
      ("platform/gone", "gone", "5555555555"),
    ],
  );

  let out_dir = td.path().join("out");
  cmd_bin("repo-change-report")
    .arg("--out-dir")
    .arg(&out_dir)
    .args(["--prefix", "s", "snapshot", "--manifest"])
    .arg(&manifest)
    .arg("--repo-root")
    .arg(&src)
    .assert()
    .success()
    .stderr(predicate::str::contains("3/5 projects found"));

  let rows = read_csv(&out_dir.join("s-file-metrics.csv"));
  assert_eq!(
    rows[0],
    vec!["project", "rev", "n_java", "n_make", "n_cpp", "n_androidxml", "l_java", "l_make", "l_cpp"]
  );
  assert_eq!(rows.len(), 4);
  assert_eq!(rows[1], vec!["platform/app", "3333333", "1", "0", "0", "1", "1", "0", "0"]);
  assert_eq!(rows[2], vec!["platform/art", "2222222", "0", "0", "1", "0", "0", "0", "3"]);
  assert_eq!(rows[3], vec!["platform/build", "1111111", "0", "1", "0", "0", "0", "2", "0"]);
}

#[test]
fn checkout_moves_trees_and_failures_fail_the_run_after_writing() {
  let td = tempdir();
  let src = td.path().join("src");

  let repo = GitRepo::init(&src.join("lib"));
  let first = repo.commit(&[("a.c", "int a;\n")], "one", "dev@example.com", "2014-01-01T10:00:00Z");
  repo.commit(&[("b.c", "int b;\n")], "two", "dev@example.com", "2014-01-02T10:00:00Z");
  std::fs::create_dir_all(src.join("plain")).unwrap();

  let manifest = td.path().join("m.xml");
  write_manifest(&manifest, &[("lib", "lib", first.as_str()), ("plain", "plain", "deadbeef")]);

  let out_dir = td.path().join("out");
  cmd_bin("repo-change-report")
    .arg("--out-dir")
    .arg(&out_dir)
    .args(["--prefix", "c", "snapshot", "--checkout", "--manifest"])
    .arg(&manifest)
    .arg("--repo-root")
    .arg(&src)
    .assert()
    .failure()
    .stderr(predicate::str::contains("checkout failed for 1 project(s): plain (git"));

  assert!(!src.join("lib/b.c").exists());
  let rows = read_csv(&out_dir.join("c-file-metrics.csv"));
  assert_eq!(rows[1][0], "lib");
  assert_eq!(rows[1][4], "1");
}
