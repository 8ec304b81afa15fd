// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, git subprocesses, time formatting, output locations, and man page rendering
// role: utilities/helpers
// inputs: Various primitives; epoch seconds; paths; clap CommandFactory
// outputs: Canonicalized paths, git stdout, formatted timestamps, report paths, man page text
// side_effects: prepare_out_dir creates directories; run_git invokes subprocesses
// invariants:
// - prepare_out_dir returns an existing directory; a pre-existing directory is not an error
// - report file names are <prefix>-<kind>.csv
// - format_epoch_utc is locale-independent and always UTC
// errors: run_git surfaces command + stderr; IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::CommandFactory;

/// Date format used for git timestamps in CSV output.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Default report prefix format (local time).
pub const PREFIX_FORMAT: &str = "%Y-%m%d-%H%M-%S";

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

fn git_output(repo: &Path, args: &[String]) -> Result<Vec<u8>> {
  let out = Command::new("git")
    .args(args)
    .current_dir(repo)
    .output()
    .with_context(|| format!("spawning git {:?} in {}", args, repo.display()))?;

  if out.status.success() {
    Ok(out.stdout)
  } else {
    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::bail!("git {:?} failed in {}: {}", args, repo.display(), stderr.trim())
  }
}

/// Run git and decode stdout lossily.
pub fn run_git(repo: &Path, args: &[String]) -> Result<String> {
  let stdout = git_output(repo, args)?;
  Ok(String::from_utf8_lossy(&stdout).to_string())
}

/// Run git and require stdout to be valid UTF-8.
pub fn run_git_strict(repo: &Path, args: &[String]) -> Result<String> {
  let stdout = git_output(repo, args)?;
  String::from_utf8(stdout).with_context(|| format!("git {:?} produced non UTF-8 output", args))
}

/// Abbreviate a revision for display (first 7 characters).
pub fn short_rev(full: &str) -> String {
  full.chars().take(7).collect()
}

/// Formats a Unix epoch timestamp with `DATE_FORMAT` in UTC.
pub fn format_epoch_utc(epoch: i64) -> String {
  match Utc.timestamp_opt(epoch, 0).single() {
    Some(dt) => dt.format(DATE_FORMAT).to_string(),
    None => String::new(),
  }
}

/// Returns the effective "now" given an optional override.
pub fn effective_now(override_now: Option<DateTime<Local>>) -> DateTime<Local> {
  override_now.unwrap_or_else(Local::now)
}

/// Default report prefix derived from the current local time.
pub fn default_prefix(now_opt: Option<DateTime<Local>>) -> String {
  effective_now(now_opt).format(PREFIX_FORMAT).to_string()
}

/// Prepare the output directory for reports; created when absent.
pub fn prepare_out_dir(out: &Path) -> Result<PathBuf> {
  std::fs::create_dir_all(out).with_context(|| format!("creating output directory {}", out.display()))?;
  Ok(out.to_path_buf())
}

/// Build `<dir>/<prefix>-<kind>.csv`.
pub fn report_path(dir: &Path, prefix: &str, kind: &str) -> PathBuf {
  dir.join(format!("{}-{}.csv", prefix, kind))
}

/// Replace `"` by two backticks. Free-text columns downstream choke on quotes.
pub fn rm_quotes(s: &str) -> String {
  s.replace('"', "``")
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
