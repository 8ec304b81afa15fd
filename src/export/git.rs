// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Write commit, per-file and per-project summary CSV reports from classified git history
// role: output/git
// inputs: CommitClassification, FileChanges, summary map, OutputConfig
// outputs: <prefix>-commits.csv, <prefix>-git-files.csv, <prefix>-summary.csv
// side_effects: Writes report files
// invariants:
// - timestamps render in UTC with DATE_FORMAT
// - merge column is the literal True/False
// - projects appear in name order; commits keep rev-list order within a project
// errors: Report I/O errors propagate
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use anyhow::Result;

use crate::classify::{CommitClassification, CommitRecord, FileChangeRecord, FileChanges, ProjectSummary};
use crate::export::{CsvReport, CsvRow, OutputConfig, ReportOutcome, write_rows};
use crate::util::format_epoch_utc;

fn bool_word(b: bool) -> &'static str {
  if b { "True" } else { "False" }
}

impl CsvRow for CommitRecord {
  const HEADER: &'static [&'static str] = &[
    "project",
    "hexsha",
    "merge",
    "author",
    "authored_date",
    "committer",
    "committed_date",
    "files",
    "lines",
    "entropy",
    "message",
  ];

  fn record(&self) -> Vec<String> {
    vec![
      self.project.clone(),
      self.hexsha.clone(),
      bool_word(self.is_merge).to_string(),
      self.author.clone(),
      format_epoch_utc(self.authored_at),
      self.committer.clone(),
      format_epoch_utc(self.committed_at),
      self.files_changed.to_string(),
      self.lines_changed.to_string(),
      format!("{:?}", self.entropy),
      self.message.clone(),
    ]
  }
}

impl CsvRow for FileChangeRecord {
  const HEADER: &'static [&'static str] = &["hexsha", "file", "lines", "insertions", "deletions"];

  fn record(&self) -> Vec<String> {
    vec![
      self.hexsha.clone(),
      self.file.clone(),
      self.lines.to_string(),
      self.insertions.to_string(),
      self.deletions.to_string(),
    ]
  }
}

struct SummaryRow<'a> {
  project: &'a str,
  summary: &'a ProjectSummary,
}

impl CsvRow for SummaryRow<'_> {
  const HEADER: &'static [&'static str] = &["project", "commits", "files", "lines", "authors"];

  fn record(&self) -> Vec<String> {
    vec![
      self.project.to_string(),
      self.summary.commits.to_string(),
      self.summary.files.to_string(),
      self.summary.lines.to_string(),
      self.summary.authors.to_string(),
    ]
  }
}

pub fn write_commits(out: &OutputConfig, cls: &CommitClassification) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<CommitRecord>(out, "commits")?;
  for r in cls.projects.values().flatten() {
    report.write_row(r)?;
  }
  report.finish()
}

pub fn write_git_files(out: &OutputConfig, changes: &FileChanges) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<FileChangeRecord>(out, "git-files")?;
  for r in changes.projects.values().flatten() {
    report.write_row(r)?;
  }
  report.finish()
}

pub fn write_summary(out: &OutputConfig, summary: &BTreeMap<String, ProjectSummary>) -> Result<ReportOutcome> {
  let rows: Vec<SummaryRow> = summary.iter().map(|(project, s)| SummaryRow { project, summary: s }).collect();
  write_rows(out, "summary", &rows)
}
