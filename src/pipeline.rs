// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Run one subcommand end to end: read inputs, transform, write its CSV reports
// role: processing/orchestrator
// inputs: EffectiveConfig (output location + validated Task)
// outputs: Report files on disk; one written path per stdout line
// side_effects: Reads manifests and git clones; optional checkout; review server queries; writes CSV
// invariants:
// - every report of a task is written even when its record set is empty
// - checkout failures are reported after the snapshot reports are written, as an error
// errors: Propagates load/fetch/write errors with path or URL context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::classify::{self, ClassifyOptions, CommitClassification};
use crate::cli::{EffectiveConfig, GerritConfig, Task};
use crate::export::{self, OutputConfig, ReportOutcome};
use crate::gerrit::api::{GerritApi, build_api};
use crate::gerrit::fetch::{self, ChangeQuery, ChangeSet};
use crate::manifest::{self, CommonChanged, Manifest};
use crate::range_commits::RangeCommits;
use crate::snapshot::{RepoSnapshots, default_classifiers};

pub fn run(cfg: &EffectiveConfig) -> Result<Vec<ReportOutcome>> {
  let out = &cfg.output;

  match &cfg.task {
    Task::ManifestDiff { left, right } => {
      let diff = manifest_diff(left, right)?;
      Ok(vec![export::workspace::write_manifest_diff(out, &diff)?])
    }
    Task::Snapshot {
      manifest,
      repo_root,
      checkout,
      exclude_dir,
    } => run_snapshot(out, manifest, repo_root, *checkout, exclude_dir),
    Task::GitChanges {
      left,
      right,
      repo_root,
      commits,
      files,
    } => run_git_changes(out, left, right, repo_root, commits, files),
    Task::Gerrit { query, gerrit } => {
      let api = build_api(&gerrit.url, gerrit.timeout)?;
      let set = fetch::fetch(api.as_ref(), query, gerrit.page_size)?;
      if set.is_empty() {
        warn!("query matched no changes");
      }
      export::gerrit::write_all(out, &set)
    }
    Task::CommitChanges {
      left,
      right,
      repo_root,
      commits,
      include_domain,
      gerrit,
    } => {
      let api = build_api(&gerrit.url, gerrit.timeout)?;
      run_commit_changes(out, api.as_ref(), gerrit, left, right, repo_root, commits, include_domain.as_deref())
    }
  }
}

fn manifest_diff(left: &Path, right: &Path) -> Result<BTreeMap<String, CommonChanged>> {
  let l = Manifest::load(left)?;
  let r = Manifest::load(right)?;
  let diff = manifest::compare(&l, &r);
  info!("{} common projects with changed revision", diff.len());
  Ok(diff)
}

fn ranges_between(left: &Path, right: &Path, repo_root: &Path) -> Result<RangeCommits> {
  let diff = manifest_diff(left, right)?;
  let ranges = RangeCommits::extract(&diff, repo_root);
  info!("{} commits in range", ranges.count_commits());
  Ok(ranges)
}

fn log_counts(cls: &CommitClassification) {
  info!("Total: {}", cls.total);
  info!("Merge: {}", cls.merges);
}

fn run_snapshot(
  out: &OutputConfig,
  manifest: &Path,
  repo_root: &Path,
  checkout: bool,
  exclude_dir: &str,
) -> Result<Vec<ReportOutcome>> {
  let m = Manifest::load(manifest)?;
  let snaps = RepoSnapshots::resolve(&m, repo_root);

  let report = checkout.then(|| snaps.checkout_all());

  let classifiers = default_classifiers();
  let metrics = snaps.scan_file_metrics(exclude_dir, &classifiers);
  let outcome = export::workspace::write_file_metrics(out, &metrics, &classifiers)?;

  if let Some(r) = report {
    if !r.is_clean() {
      let details: Vec<String> = r.failures.iter().map(|f| format!("{} ({})", f.project, f.error)).collect();
      bail!("checkout failed for {} project(s): {}", details.len(), details.join("; "));
    }
  }
  Ok(vec![outcome])
}

fn run_git_changes(
  out: &OutputConfig,
  left: &Path,
  right: &Path,
  repo_root: &Path,
  commits: &ClassifyOptions,
  files: &ClassifyOptions,
) -> Result<Vec<ReportOutcome>> {
  let ranges = ranges_between(left, right, repo_root)?;

  let cls = classify::classify_commits(&ranges, commits);
  log_counts(&cls);
  let changes = classify::collect_file_changes(&ranges, files);
  let summary = classify::summarize(&cls);

  Ok(vec![
    export::git::write_commits(out, &cls)?,
    export::git::write_git_files(out, &changes)?,
    export::git::write_summary(out, &summary)?,
  ])
}

#[allow(clippy::too_many_arguments)]
pub fn run_commit_changes(
  out: &OutputConfig,
  api: &dyn GerritApi,
  gerrit: &GerritConfig,
  left: &Path,
  right: &Path,
  repo_root: &Path,
  commits: &ClassifyOptions,
  include_domain: Option<&str>,
) -> Result<Vec<ReportOutcome>> {
  let ranges = ranges_between(left, right, repo_root)?;
  let cls = classify::classify_commits(&ranges, commits);
  log_counts(&cls);
  let ids = classify::gerrit_identifiers(&cls, include_domain);

  let set = if ids.is_empty() {
    warn!("no commits to look up on the review server");
    ChangeSet::default()
  } else {
    let query = ChangeQuery::new(None, None, None, Some(ids))?;
    fetch::fetch(api, &query, gerrit.page_size)?
  };

  export::gerrit::write_all(out, &set)
}
