// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve manifest projects to local working copies; checkout and per-category file metrics
// role: input/snapshot
// inputs: Manifest, repo root, exclude dir name, FileClassifier list
// outputs: RepoSnapshots (found/total), CheckoutReport, FileMetrics per project
// side_effects: checkout_all mutates working trees; scan reads every file under each project
// invariants:
// - projects whose path is missing are omitted from every later operation (never an error)
// - checkout_all attempts every project; failures are collected, not swallowed
// - classification is first-match-wins over the ordered classifier list
// errors: Walk errors on a single entry are logged and skipped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::gitio;
use crate::manifest::Manifest;

#[derive(Debug, Clone)]
pub struct ResolvedProject {
  pub name: String,
  pub path: PathBuf,
  pub revision: String,
}

#[derive(Debug, Clone)]
pub struct RepoSnapshots {
  projects: BTreeMap<String, ResolvedProject>,
  total: usize,
}

#[derive(Debug, Clone)]
pub struct CheckoutFailure {
  pub project: String,
  pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct CheckoutReport {
  pub succeeded: usize,
  pub failures: Vec<CheckoutFailure>,
}

impl CheckoutReport {
  pub fn is_clean(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Filename pattern bucket used by the metrics scan.
#[derive(Debug, Clone)]
pub struct FileClassifier {
  pub name: String,
  pub pattern: Regex,
  pub count_lines: bool,
}

impl FileClassifier {
  pub fn new(name: &str, pattern: &str, count_lines: bool) -> Result<Self> {
    Ok(Self {
      name: name.to_string(),
      pattern: Regex::new(pattern)?,
      count_lines,
    })
  }
}

/// Source and build-file buckets: java, make, cpp (line counted) and AndroidManifest.xml (count only).
pub fn default_classifiers() -> Vec<FileClassifier> {
  let specs = [
    ("java", r"^.*\.(java|jav|aidl)$", true),
    ("make", r"^.*(Makefile|\.mk)$", true),
    ("cpp", r"^.*\.(c|cpp|cc|h|hpp)$", true),
    ("androidxml", r"^.*AndroidManifest\.xml$", false),
  ];
  specs
    .iter()
    .filter_map(|(n, p, l)| FileClassifier::new(n, p, *l).ok())
    .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMetrics {
  pub files: u64,
  pub lines: u64,
}

#[derive(Debug, Clone)]
pub struct FileMetrics {
  pub project: String,
  pub revision: String,
  /// Indexed like the classifier list the scan was given.
  pub categories: Vec<CategoryMetrics>,
}

/// Number of lines as a line iterator would see them: a trailing partial line counts.
pub fn count_lines(path: &Path) -> std::io::Result<u64> {
  let mut f = std::fs::File::open(path)?;
  let mut buf = [0u8; 64 * 1024];
  let mut lines = 0u64;
  let mut last: Option<u8> = None;

  loop {
    let n = f.read(&mut buf)?;
    if n == 0 {
      break;
    }
    lines += buf[..n].iter().filter(|b| **b == b'\n').count() as u64;
    last = Some(buf[n - 1]);
  }

  match last {
    Some(b'\n') | None => Ok(lines),
    Some(_) => Ok(lines + 1),
  }
}

impl RepoSnapshots {
  pub fn resolve(manifest: &Manifest, repo_root: &Path) -> Self {
    let mut projects = BTreeMap::new();

    for entry in manifest.projects.values() {
      let path = repo_root.join(&entry.path);

      if path.exists() {
        projects.insert(
          entry.name.clone(),
          ResolvedProject {
            name: entry.name.clone(),
            path,
            revision: entry.revision.clone(),
          },
        );
      } else {
        debug!(project = %entry.name, path = %path.display(), "project path not found");
      }
    }

    let snapshots = Self {
      projects,
      total: manifest.len(),
    };
    info!(
      "{}/{} projects found in {}/",
      snapshots.found(),
      snapshots.total(),
      repo_root.display()
    );
    snapshots
  }

  pub fn found(&self) -> usize {
    self.projects.len()
  }

  pub fn total(&self) -> usize {
    self.total
  }

  pub fn checkout_all(&self) -> CheckoutReport {
    let mut report = CheckoutReport::default();

    for p in self.projects.values() {
      match gitio::checkout(&p.path, &p.revision) {
        Ok(()) => report.succeeded += 1,
        Err(e) => {
          error!(project = %p.name, revision = %p.revision, "checkout failed: {:#}", e);
          report.failures.push(CheckoutFailure {
            project: p.name.clone(),
            error: format!("{:#}", e),
          });
        }
      }
    }

    info!("{}/{} projects checked out", report.succeeded, self.found());
    report
  }

  pub fn scan_file_metrics(&self, exclude_dir: &str, classifiers: &[FileClassifier]) -> Vec<FileMetrics> {
    self
      .projects
      .values()
      .map(|p| FileMetrics {
        project: p.name.clone(),
        revision: p.revision.clone(),
        categories: scan_tree(&p.path, exclude_dir, classifiers),
      })
      .collect()
  }
}

fn scan_tree(root: &Path, exclude_dir: &str, classifiers: &[FileClassifier]) -> Vec<CategoryMetrics> {
  let mut out = vec![CategoryMetrics::default(); classifiers.len()];
  let exclude = exclude_dir.to_string();

  let mut builder = WalkBuilder::new(root);
  builder.standard_filters(false);
  builder.follow_links(false);
  builder.filter_entry(move |e| {
    let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
    !(is_dir && e.depth() > 0 && e.file_name().to_string_lossy() == exclude.as_str())
  });

  for entry in builder.build() {
    let entry = match entry {
      Ok(e) => e,
      Err(e) => {
        warn!(root = %root.display(), "walk error: {}", e);
        continue;
      }
    };
    if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
      continue;
    }

    let name = entry.file_name().to_string_lossy();
    let Some(idx) = classifiers.iter().position(|c| c.pattern.is_match(&name)) else {
      continue;
    };

    out[idx].files += 1;

    if classifiers[idx].count_lines {
      match count_lines(entry.path()) {
        Ok(n) => out[idx].lines += n,
        Err(e) => warn!(file = %entry.path().display(), "cannot count lines: {}", e),
      }
    }
  }

  out
}
