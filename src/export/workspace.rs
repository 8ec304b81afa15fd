// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Write manifest-diff and per-project file-metrics CSV reports
// role: output/workspace
// inputs: CommonChanged map, FileMetrics list, FileClassifier list, OutputConfig
// outputs: <prefix>-manifest-diff.csv, <prefix>-file-metrics.csv
// side_effects: Writes report files
// invariants:
// - file-metrics header is project, rev, one n_<name> per classifier, then l_<name> per line-counting classifier
// - rev is the 7-character abbreviation of the manifest revision
// errors: Report I/O errors propagate
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use anyhow::Result;

use crate::export::{CsvReport, CsvRow, OutputConfig, ReportOutcome};
use crate::manifest::CommonChanged;
use crate::snapshot::{FileClassifier, FileMetrics};
use crate::util::short_rev;

impl CsvRow for CommonChanged {
  const HEADER: &'static [&'static str] = &["project", "path", "lrev", "rrev"];

  fn record(&self) -> Vec<String> {
    vec![
      self.name.clone(),
      self.path.clone(),
      self.left_revision.clone(),
      self.right_revision.clone(),
    ]
  }
}

pub fn write_manifest_diff(out: &OutputConfig, diff: &BTreeMap<String, CommonChanged>) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<CommonChanged>(out, "manifest-diff")?;
  for c in diff.values() {
    report.write_row(c)?;
  }
  report.finish()
}

pub fn metrics_header(classifiers: &[FileClassifier]) -> Vec<String> {
  let mut header = vec!["project".to_string(), "rev".to_string()];
  header.extend(classifiers.iter().map(|c| format!("n_{}", c.name)));
  header.extend(classifiers.iter().filter(|c| c.count_lines).map(|c| format!("l_{}", c.name)));
  header
}

pub fn metrics_record(m: &FileMetrics, classifiers: &[FileClassifier]) -> Vec<String> {
  let mut rec = vec![m.project.clone(), short_rev(&m.revision)];
  rec.extend(m.categories.iter().map(|c| c.files.to_string()));
  rec.extend(
    classifiers
      .iter()
      .zip(&m.categories)
      .filter(|(cls, _)| cls.count_lines)
      .map(|(_, c)| c.lines.to_string()),
  );
  rec
}

pub fn write_file_metrics(
  out: &OutputConfig,
  metrics: &[FileMetrics],
  classifiers: &[FileClassifier],
) -> Result<ReportOutcome> {
  let mut report = CsvReport::create(out, "file-metrics", &metrics_header(classifiers))?;
  for m in metrics {
    report.write_record(metrics_record(m, classifiers))?;
  }
  report.finish()
}
