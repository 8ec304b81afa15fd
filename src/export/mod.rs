// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: CSV report plumbing shared by all exporters (output location, header, per-row skip policy)
// role: output/csv
// inputs: OutputConfig (dir + prefix), report kind, header, CsvRow records
// outputs: <dir>/<prefix>-<kind>.csv files; ReportOutcome counts
// side_effects: Creates/truncates report files
// invariants:
// - header row is written first, exactly once
// - rows keep caller order; a record whose width differs from the header is skipped before any byte is written
// errors: I/O failures abort the report with the file path as context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod gerrit;
pub mod git;
pub mod workspace;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::util::{prepare_out_dir, report_path};

/// A fixed-column report row.
pub trait CsvRow {
  const HEADER: &'static [&'static str];
  fn record(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
  pub dir: PathBuf,
  pub prefix: String,
}

impl OutputConfig {
  pub fn new(dir: PathBuf, prefix: String) -> Self {
    Self { dir, prefix }
  }

  pub fn path_for(&self, kind: &str) -> PathBuf {
    report_path(&self.dir, &self.prefix, kind)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
  pub path: PathBuf,
  pub rows: usize,
  pub skipped: usize,
}

pub struct CsvReport {
  path: PathBuf,
  wtr: csv::Writer<File>,
  width: usize,
  rows: usize,
  skipped: usize,
}

impl CsvReport {
  pub fn create<H: AsRef<str>>(out: &OutputConfig, kind: &str, header: &[H]) -> Result<Self> {
    prepare_out_dir(&out.dir)?;
    let path = out.path_for(kind);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    wtr
      .write_record(header.iter().map(|h| h.as_ref()))
      .with_context(|| format!("writing header to {}", path.display()))?;

    Ok(Self {
      path,
      wtr,
      width: header.len(),
      rows: 0,
      skipped: 0,
    })
  }

  pub fn create_for<R: CsvRow>(out: &OutputConfig, kind: &str) -> Result<Self> {
    Self::create(out, kind, R::HEADER)
  }

  /// Ok(false) when the row was skipped.
  pub fn write_row<R: CsvRow>(&mut self, row: &R) -> Result<bool> {
    self.write_record(row.record())
  }

  pub fn write_record(&mut self, record: Vec<String>) -> Result<bool> {
    if record.len() != self.width {
      warn!(
        file = %self.path.display(),
        "skipping row with {} fields (expected {})",
        record.len(),
        self.width
      );
      self.skipped += 1;
      return Ok(false);
    }

    self
      .wtr
      .write_record(&record)
      .with_context(|| format!("writing {}", self.path.display()))?;
    self.rows += 1;
    Ok(true)
  }

  pub fn finish(mut self) -> Result<ReportOutcome> {
    self.wtr.flush().with_context(|| format!("flushing {}", self.path.display()))?;
    info!("wrote {} rows to {}", self.rows, self.path.display());
    Ok(ReportOutcome {
      path: self.path,
      rows: self.rows,
      skipped: self.skipped,
    })
  }
}

/// Write every row of `rows` to `<prefix>-<kind>.csv`.
pub fn write_rows<R: CsvRow>(out: &OutputConfig, kind: &str, rows: &[R]) -> Result<ReportOutcome> {
  let mut report = CsvReport::create_for::<R>(out, kind)?;
  for r in rows {
    report.write_row(r)?;
  }
  report.finish()
}
