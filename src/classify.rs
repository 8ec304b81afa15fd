// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Derive per-commit records (merge flag, filtered file stats, normalized entropy) and per-project summaries
// role: analysis/commits
// inputs: RangeCommits, ClassifyOptions (exclude_merge, file pattern)
// outputs: CommitClassification, FileChanges, ProjectSummary map, Gerrit lookup identifiers
// side_effects: Reads git through gitio::load_commit
// invariants:
// - is_merge means exactly two parents (octopus merges are not merges)
// - entropy is 0 for zero total lines or a single file; normalized by log2(files) otherwise
// - total/merges counters include commits excluded from the records
// - commits whose metadata cannot be loaded or decoded are skipped, never fatal
// errors: Per-commit failures logged at warn and skipped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::{debug, warn};

use crate::gitio::{self, FileStat, GitCommit};
use crate::range_commits::RangeCommits;

/// Source and build files tracked by the commit report.
pub const DEFAULT_GIT_FILE_PATTERN: &str = r"^.*(Makefile|\.(java|jav|aidl|c|cpp|cc|h|hpp|mk|))$";

/// All files.
pub const DEFAULT_FILES_PATTERN: &str = r"^.*";

#[derive(Debug, Clone)]
pub struct ClassifyOptions {
  pub exclude_merge: bool,
  pub file_pattern: Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
  pub project: String,
  pub hexsha: String,
  pub is_merge: bool,
  pub author: String,
  pub authored_at: i64,
  pub committer: String,
  pub committed_at: i64,
  pub files_changed: u64,
  pub lines_changed: i64,
  pub entropy: f64,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChangeRecord {
  pub project: String,
  pub hexsha: String,
  pub file: String,
  pub lines: i64,
  pub insertions: i64,
  pub deletions: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSummary {
  pub commits: u64,
  pub files: u64,
  pub lines: i64,
  pub authors: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CommitClassification {
  /// Projects with at least one record.
  pub projects: BTreeMap<String, Vec<CommitRecord>>,
  pub total: usize,
  pub merges: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FileChanges {
  pub projects: BTreeMap<String, Vec<FileChangeRecord>>,
}

pub fn is_merge(parent_count: usize) -> bool {
  parent_count == 2
}

pub fn filter_files<'a>(pattern: &Regex, files: &'a [FileStat]) -> Vec<&'a FileStat> {
  files.iter().filter(|f| matches_from_start(pattern, &f.path)).collect()
}

fn matches_from_start(pattern: &Regex, s: &str) -> bool {
  pattern.find(s).map(|m| m.start() == 0).unwrap_or(false)
}

/// Shannon entropy (base 2) of the changed-line distribution, normalized by log2(file count).
pub fn entropy(lines_per_file: &[i64]) -> f64 {
  let nol: i64 = lines_per_file.iter().sum();

  if nol <= 0 {
    return 0.0;
  }

  let mut ent = 0.0;
  for &lines in lines_per_file {
    if lines > 0 {
      let p = lines as f64 / nol as f64;
      ent -= p * p.log2();
    }
  }

  let nof = lines_per_file.len();
  if ent != 0.0 && nof > 1 {
    ent /= (nof as f64).log2();
  }

  ent
}

pub fn build_record(project: &str, commit: &GitCommit, pattern: &Regex) -> CommitRecord {
  let filtered = filter_files(pattern, &commit.files);
  let lines: Vec<i64> = filtered.iter().map(|f| f.lines()).collect();

  CommitRecord {
    project: project.to_string(),
    hexsha: commit.meta.sha.clone(),
    is_merge: is_merge(commit.meta.parents.len()),
    author: commit.meta.author_email.clone(),
    authored_at: commit.meta.authored_at,
    committer: commit.meta.committer_email.clone(),
    committed_at: commit.meta.committed_at,
    files_changed: filtered.len() as u64,
    lines_changed: lines.iter().sum(),
    entropy: entropy(&lines),
    message: commit.meta.message.clone(),
  }
}

pub fn build_file_records(project: &str, commit: &GitCommit, pattern: &Regex) -> Vec<FileChangeRecord> {
  filter_files(pattern, &commit.files)
    .into_iter()
    .map(|f| FileChangeRecord {
      project: project.to_string(),
      hexsha: commit.meta.sha.clone(),
      file: f.path.clone(),
      lines: f.lines(),
      insertions: f.insertions,
      deletions: f.deletions,
    })
    .collect()
}

/// Walk every commit of every project, loading it from git; counts total and merges.
fn for_each_commit<F>(ranges: &RangeCommits, mut f: F) -> (usize, usize)
where
  F: FnMut(&str, &GitCommit),
{
  let mut progress = 0usize;
  let mut merges = 0usize;

  for (project, range) in &ranges.projects {
    debug!(
      "{}: {} commits in {}..{}",
      project,
      range.shas.len(),
      crate::util::short_rev(&range.left_revision),
      crate::util::short_rev(&range.right_revision)
    );
    for sha in &range.shas {
      progress += 1;
      debug!("{}, {} ({})", progress, crate::util::short_rev(sha), project);

      match gitio::load_commit(&range.repo, sha) {
        Ok(commit) => {
          if is_merge(commit.meta.parents.len()) {
            merges += 1;
          }
          f(project, &commit);
        }
        Err(e) => warn!(project = %project, sha = %sha, "skipping commit: {:#}", e),
      }
    }
  }

  (progress, merges)
}

pub fn classify_commits(ranges: &RangeCommits, opts: &ClassifyOptions) -> CommitClassification {
  let mut projects: BTreeMap<String, Vec<CommitRecord>> = BTreeMap::new();

  let (total, merges) = for_each_commit(ranges, |project, commit| {
    if opts.exclude_merge && is_merge(commit.meta.parents.len()) {
      return;
    }
    projects
      .entry(project.to_string())
      .or_default()
      .push(build_record(project, commit, &opts.file_pattern));
  });

  CommitClassification { projects, total, merges }
}

pub fn collect_file_changes(ranges: &RangeCommits, opts: &ClassifyOptions) -> FileChanges {
  let mut projects: BTreeMap<String, Vec<FileChangeRecord>> = BTreeMap::new();

  for_each_commit(ranges, |project, commit| {
    if opts.exclude_merge && is_merge(commit.meta.parents.len()) {
      return;
    }
    let records = build_file_records(project, commit, &opts.file_pattern);
    projects.entry(project.to_string()).or_default().extend(records);
  });

  FileChanges { projects }
}

pub fn summarize_project(records: &[CommitRecord]) -> ProjectSummary {
  let authors: BTreeSet<&str> = records.iter().map(|r| r.author.as_str()).collect();

  ProjectSummary {
    commits: records.len() as u64,
    files: records.iter().map(|r| r.files_changed).sum(),
    lines: records.iter().map(|r| r.lines_changed).sum(),
    authors: authors.len() as u64,
  }
}

pub fn summarize(classification: &CommitClassification) -> BTreeMap<String, ProjectSummary> {
  classification
    .projects
    .iter()
    .map(|(p, records)| (p.clone(), summarize_project(records)))
    .collect()
}

/// Commit ids to look up on the review server, filtered by author email domain.
pub fn gerrit_identifiers(classification: &CommitClassification, include_domain: Option<&str>) -> Vec<String> {
  classification
    .projects
    .values()
    .flatten()
    .filter(|r| match include_domain {
      Some(d) => email_domain(&r.author).contains(d),
      None => true,
    })
    .map(|r| r.hexsha.clone())
    .collect()
}

/// Everything after the last `@`; the whole string when there is none.
pub fn email_domain(email: &str) -> &str {
  match email.rfind('@') {
    Some(i) => &email[i + 1..],
    None => email,
  }
}
