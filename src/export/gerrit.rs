// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Flatten Gerrit changes into changes, patchsets, reviews and files CSV reports
// role: output/gerrit
// inputs: ChangeSet, OutputConfig
// outputs: <prefix>-changes.csv, <prefix>-patchsets.csv, <prefix>-reviews.csv, <prefix>-files.csv
// side_effects: Writes report files
// invariants:
// - review-message markers are matched exactly as the server words them; first match wins
// - closed status checks abandoned, merged, pushed in that order per message
// - patch sets are emitted in ascending patch-set number
// - a change without any revision is skipped from the changes report with a warning
// errors: Report I/O errors propagate; unmatched revert messages are logged
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::export::{CsvReport, CsvRow, OutputConfig, ReportOutcome};
use crate::gerrit::fetch::ChangeSet;
use crate::gerrit::model::{Change, ChangeMessage};
use crate::util::rm_quotes;

pub const REVMSG_ABANDONED: &str = "Abandoned";
pub const REVMSG_MERGED: &str = "Change has been successfully merged into the git repository.";
pub const REVMSG_PUSHED: &str = "Change has been successfully pushed.";
pub const REVMSG_REVERTED: &str = "Reverted\n\nThis patchset was reverted in change: ";
pub const COMMSG_CHERRY: &str = "(cherry picked from commit ";
pub const COMMSG_REVERT: &str = "This reverts commit ";

/// Name of the pseudo-reviewer for messages without an author.
pub const SERVER_REVIEWER: &str = "Gerrit Code Review";

static RE_REVERT_ID: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(.*)\n\n.*(I[a-f0-9]{40})\n?$").expect("revert id pattern"));

fn uploaded_msg(n: i64) -> String {
  format!("Uploaded patch set {}.", n)
}

fn update_msg(n: i64) -> String {
  format!("Patch Set {}: Commit message was updated", n)
}

fn rebased_msg(n: i64, prev: i64) -> String {
  format!("Patch Set {}: Patch Set {} was rebased", n, prev)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedBy {
  Abandoned,
  Merged,
  Pushed,
}

impl ClosedBy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Abandoned => "abandoned",
      Self::Merged => "merged",
      Self::Pushed => "pushed",
    }
  }
}

/// First message that closes the change, with its date.
pub fn closed_status(messages: &[ChangeMessage]) -> Option<(ClosedBy, &str)> {
  messages.iter().find_map(|m| {
    let kind = if m.message.contains(REVMSG_ABANDONED) {
      ClosedBy::Abandoned
    } else if m.message.contains(REVMSG_MERGED) {
      ClosedBy::Merged
    } else if m.message.contains(REVMSG_PUSHED) {
      ClosedBy::Pushed
    } else {
      return None;
    };
    Some((kind, m.date.as_str()))
  })
}

/// Change id of the revert, taken from the first "Reverted" message.
pub fn reverted_by(messages: &[ChangeMessage]) -> Option<String> {
  let m = messages.iter().find(|m| m.message.contains(REVMSG_REVERTED))?;
  match RE_REVERT_ID.captures(&m.message).and_then(|c| c.get(2)) {
    Some(id) => Some(id.as_str().to_string()),
    None => {
      warn!("revert message without a change id: {:?}", m.message);
      None
    }
  }
}

pub fn created_by(commit_message: &str) -> &'static str {
  if commit_message.contains(COMMSG_CHERRY) {
    "cherry-pick"
  } else if commit_message.contains(COMMSG_REVERT) {
    "revert"
  } else {
    ""
  }
}

/// Date of the message that introduced patch set `n`.
pub fn upload_date(messages: &[ChangeMessage], n: i64) -> Option<&str> {
  let uploaded = uploaded_msg(n);
  let updated = update_msg(n);
  let rebased = rebased_msg(n, n - 1);

  messages
    .iter()
    .find(|m| m.message == uploaded || m.message == updated || m.message == rebased)
    .map(|m| m.date.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRow {
  pub number: i64,
  pub change_id: String,
  pub current_revision: String,
  pub project: String,
  pub branch: String,
  pub num_patches: i64,
  pub date_created: String,
  pub date_closed: String,
  pub closed_by: String,
  pub created_by: String,
  pub reverted_by: String,
}

impl CsvRow for ChangeRow {
  const HEADER: &'static [&'static str] = &[
    "number",
    "change_id",
    "current_revision",
    "project",
    "branch",
    "num_patches",
    "date_created",
    "date_closed",
    "closed_by",
    "created_by",
    "reverted_by",
  ];

  fn record(&self) -> Vec<String> {
    vec![
      self.number.to_string(),
      self.change_id.clone(),
      self.current_revision.clone(),
      self.project.clone(),
      self.branch.clone(),
      self.num_patches.to_string(),
      self.date_created.clone(),
      self.date_closed.clone(),
      self.closed_by.clone(),
      self.created_by.clone(),
      self.reverted_by.clone(),
    ]
  }
}

pub fn change_row(c: &Change) -> Option<ChangeRow> {
  let current = c.current_revision_id()?;
  let details = c.revisions.get(current)?;
  let (closed_by, date_closed) = match closed_status(&c.messages) {
    Some((kind, date)) => (kind.as_str().to_string(), date.to_string()),
    None => (String::new(), String::new()),
  };
  let commit_message = details.commit.as_ref().map(|ci| ci.message.as_str()).unwrap_or("");

  Some(ChangeRow {
    number: c.number,
    change_id: c.change_id.clone(),
    current_revision: current.to_string(),
    project: c.project.clone(),
    branch: c.branch.clone(),
    num_patches: details.number,
    date_created: c.created.clone(),
    date_closed,
    closed_by,
    created_by: created_by(commit_message).to_string(),
    reverted_by: reverted_by(&c.messages).unwrap_or_default(),
  })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchSetRow {
  pub number: i64,
  pub revision_number: i64,
  pub revision: String,
  pub committer: String,
  pub date_commit: String,
  pub date_upload: String,
  pub message: String,
}

impl CsvRow for PatchSetRow {
  const HEADER: &'static [&'static str] = &[
    "number",
    "revision_number",
    "revision",
    "committer",
    "date_commit",
    "date_upload",
    "message",
  ];

  fn record(&self) -> Vec<String> {
    vec![
      self.number.to_string(),
      self.revision_number.to_string(),
      self.revision.clone(),
      self.committer.clone(),
      self.date_commit.clone(),
      self.date_upload.clone(),
      self.message.clone(),
    ]
  }
}

pub fn patchset_rows(c: &Change) -> Vec<PatchSetRow> {
  c.sorted_revisions()
    .into_iter()
    .map(|(id, rev)| {
      let (committer, date_commit, message) = match &rev.commit {
        Some(ci) => (ci.committer.email.clone(), ci.committer.date.clone(), rm_quotes(&ci.message)),
        None => (String::new(), String::new(), String::new()),
      };
      PatchSetRow {
        number: c.number,
        revision_number: rev.number,
        revision: id.to_string(),
        committer,
        date_commit,
        date_upload: upload_date(&c.messages, rev.number).unwrap_or("").to_string(),
        message,
      }
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
  pub number: i64,
  pub revision_number: Option<i64>,
  pub reviewer: String,
  pub date: String,
  pub message: String,
}

impl CsvRow for ReviewRow {
  const HEADER: &'static [&'static str] = &["number", "revision_number", "reviewer", "date", "message"];

  fn record(&self) -> Vec<String> {
    vec![
      self.number.to_string(),
      self.revision_number.map(|n| n.to_string()).unwrap_or_default(),
      self.reviewer.clone(),
      self.date.clone(),
      self.message.clone(),
    ]
  }
}

pub fn review_rows(c: &Change) -> Vec<ReviewRow> {
  c.messages
    .iter()
    .map(|m| ReviewRow {
      number: c.number,
      revision_number: m.revision_number,
      reviewer: m
        .author
        .as_ref()
        .and_then(|a| a.name.clone())
        .unwrap_or_else(|| SERVER_REVIEWER.to_string()),
      date: m.date.clone(),
      message: rm_quotes(&m.message),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
  pub number: i64,
  pub revision_number: i64,
  pub file: String,
  pub status: String,
  pub lines_add: i64,
  pub lines_del: i64,
}

impl CsvRow for FileRow {
  const HEADER: &'static [&'static str] = &["number", "revision_number", "file", "status", "lines_add", "lines_del"];

  fn record(&self) -> Vec<String> {
    vec![
      self.number.to_string(),
      self.revision_number.to_string(),
      self.file.clone(),
      self.status.clone(),
      self.lines_add.to_string(),
      self.lines_del.to_string(),
    ]
  }
}

pub fn file_rows(c: &Change) -> Vec<FileRow> {
  let mut out = Vec::new();
  for (_, rev) in c.sorted_revisions() {
    for (name, detail) in &rev.files {
      out.push(FileRow {
        number: c.number,
        revision_number: rev.number,
        file: name.clone(),
        status: detail.status.clone().unwrap_or_default(),
        lines_add: detail.lines_inserted.unwrap_or(0),
        lines_del: detail.lines_deleted.unwrap_or(0),
      });
    }
  }
  out
}

pub fn write_changes(out: &OutputConfig, set: &ChangeSet) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<ChangeRow>(out, "changes")?;
  for c in &set.changes {
    match change_row(c) {
      Some(row) => {
        report.write_row(&row)?;
      }
      None => warn!(number = c.number, "change has no revisions; skipped"),
    }
  }
  report.finish()
}

pub fn write_patchsets(out: &OutputConfig, set: &ChangeSet) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<PatchSetRow>(out, "patchsets")?;
  for row in set.changes.iter().flat_map(patchset_rows) {
    report.write_row(&row)?;
  }
  report.finish()
}

pub fn write_reviews(out: &OutputConfig, set: &ChangeSet) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<ReviewRow>(out, "reviews")?;
  // Reports are UTF-8, so no reviewer text can be rejected by the writer.
  for row in set.changes.iter().flat_map(review_rows) {
    report.write_row(&row)?;
  }
  report.finish()
}

pub fn write_files(out: &OutputConfig, set: &ChangeSet) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<FileRow>(out, "files")?;
  for row in set.changes.iter().flat_map(file_rows) {
    report.write_row(&row)?;
  }
  report.finish()
}

/// All four review-server reports.
pub fn write_all(out: &OutputConfig, set: &ChangeSet) -> Result<Vec<ReportOutcome>> {
  Ok(vec![
    write_changes(out, set)?,
    write_patchsets(out, set)?,
    write_reviews(out, set)?,
    write_files(out, set)?,
  ])
}
