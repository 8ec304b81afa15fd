use test_support::cmd_bin;

#[test]
fn cli_generates_man_page() {
  let out = cmd_bin("repo-change-report").args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  assert!(s.contains(".TH"));
  assert!(s.contains("repo-change-report"));
  // roff escapes hyphens
  assert!(s.contains("git\\-changes"));
  assert!(s.contains("commit\\-changes"));
}
