// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Thin subprocess layer over the git CLI (open, checkout, range listing, commit metadata, numstat)
// role: git/io
// inputs: repository paths, revisions, commit shas
// outputs: sha lists, CommitMeta, per-file FileStat lists
// side_effects: Spawns git; checkout mutates the working tree
// invariants:
// - rev_list_range uses standard left..right semantics, newest first
// - numstat is computed against the first parent (or the empty tree for roots), renames disabled
// - binary files report 0 insertions and 0 deletions
// - numstat runs with -z so paths arrive unquoted
// errors: git failures and non UTF-8 metadata surface as Err; callers decide whether they are fatal
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{Result, bail};

use crate::util::{run_git, run_git_strict};

/// True when `path` exists and git recognizes it as a repository.
pub fn is_repository(path: &Path) -> bool {
  if !path.is_dir() {
    return false;
  }
  run_git(path, &["rev-parse".into(), "--git-dir".into()]).is_ok()
}

pub fn checkout(repo: &Path, revision: &str) -> Result<()> {
  run_git(repo, &["checkout".into(), "-q".into(), revision.into()])?;
  Ok(())
}

/// Commits reachable from `right` but not from `left`.
pub fn rev_list_range(repo: &Path, left: &str, right: &str) -> Result<Vec<String>> {
  let args: Vec<String> = vec![
    "-c".into(),
    "log.showSignature=false".into(),
    "rev-list".into(),
    format!("{}..{}", left, right),
  ];
  let out = run_git(repo, &args)?;
  Ok(
    out
      .lines()
      .map(|l| l.trim())
      .filter(|s| !s.is_empty())
      .map(|s| s.to_string())
      .collect(),
  )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMeta {
  pub sha: String,
  pub parents: Vec<String>,
  pub author_email: String,
  pub authored_at: i64,
  pub committer_email: String,
  pub committed_at: i64,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
  pub path: String,
  pub insertions: i64,
  pub deletions: i64,
}

impl FileStat {
  pub fn lines(&self) -> i64 {
    self.insertions + self.deletions
  }
}

/// A commit's metadata together with its per-file change stats.
#[derive(Debug, Clone)]
pub struct GitCommit {
  pub meta: CommitMeta,
  pub files: Vec<FileStat>,
}

pub fn parse_meta(out: &str) -> Result<CommitMeta> {
  let parts: Vec<&str> = out.split('\u{0}').collect();

  if parts.len() < 7 {
    bail!("unexpected commit metadata layout ({} fields)", parts.len());
  }
  let get = |i: usize| -> String { parts.get(i).unwrap_or(&"").to_string() };
  let parents = get(1).split_whitespace().map(|s| s.to_string()).collect();

  Ok(CommitMeta {
    sha: get(0),
    parents,
    author_email: get(2),
    authored_at: get(3).trim().parse().unwrap_or(0),
    committer_email: get(4),
    committed_at: get(5).trim().parse().unwrap_or(0),
    message: parts[6..].join("\u{0}"),
  })
}

/// Metadata for `sha`; non UTF-8 output is an error.
pub fn commit_meta(repo: &Path, sha: &str) -> Result<CommitMeta> {
  let fmt = "%H%x00%P%x00%ae%x00%at%x00%ce%x00%ct%x00%B";
  let args: Vec<String> = vec![
    "-c".into(),
    "log.showSignature=false".into(),
    "show".into(),
    "--no-patch".into(),
    format!("--pretty=format:{}", fmt),
    sha.into(),
  ];
  let out = run_git_strict(repo, &args)?;
  parse_meta(&out)
}

/// Parse `--numstat -z` output: NUL-terminated `ins<TAB>del<TAB>path` entries, paths unquoted.
pub fn parse_numstat(out: &str) -> Vec<FileStat> {
  let mut files = Vec::new();

  for entry in out.split('\u{0}') {
    let parts: Vec<&str> = entry.splitn(3, '\t').collect();
    if parts.len() != 3 {
      continue;
    }
    let to_int = |s: &str| -> i64 { s.parse::<i64>().unwrap_or(0) };
    files.push(FileStat {
      path: parts[2].to_string(),
      insertions: to_int(parts[0]),
      deletions: to_int(parts[1]),
    });
  }

  files
}

/// Per-file stats of `sha` against `first_parent`, or against the empty tree for a root commit.
pub fn commit_numstat(repo: &Path, sha: &str, first_parent: Option<&str>) -> Result<Vec<FileStat>> {
  let mut args: Vec<String> = Vec::new();

  match first_parent {
    Some(parent) => {
      args.extend([
        "diff".into(),
        "--numstat".into(),
        "-z".into(),
        "--no-renames".into(),
        "--no-color".into(),
      ]);
      args.push(parent.into());
      args.push(sha.into());
    }
    None => {
      args.extend([
        "diff-tree".into(),
        "--root".into(),
        "-r".into(),
        "--numstat".into(),
        "-z".into(),
        "--no-renames".into(),
        "--no-commit-id".into(),
      ]);
      args.push(sha.into());
    }
  }

  let out = run_git_strict(repo, &args)?;
  Ok(parse_numstat(&out))
}

pub fn load_commit(repo: &Path, sha: &str) -> Result<GitCommit> {
  let meta = commit_meta(repo, sha)?;
  let files = commit_numstat(repo, sha, meta.parents.first().map(|s| s.as_str()))?;
  Ok(GitCommit { meta, files })
}
