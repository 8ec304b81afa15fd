use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use regex::Regex;

use crate::classify::{ClassifyOptions, DEFAULT_FILES_PATTERN, DEFAULT_GIT_FILE_PATTERN};
use crate::export::OutputConfig;
use crate::gerrit::fetch::{ChangeQuery, DEFAULT_PAGE_SIZE};
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "repo-change-report",
    version,
    about = "Export Gerrit changes and manifest-driven git history to CSV",
    long_about = None
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Directory receiving the CSV reports (created when absent)
  #[arg(long, global = true, default_value = "result-dir")]
  pub out_dir: PathBuf,

  /// File name prefix for every report (default: local time, %Y-%m%d-%H%M-%S)
  #[arg(long, global = true)]
  pub prefix: Option<String>,

  /// Review server base URL, e.g. https://review.example.com
  #[arg(long, global = true, env = "GERRIT_URL")]
  pub gerrit_url: Option<String>,

  /// HTTP timeout in seconds for review server queries
  #[arg(long, global = true, default_value_t = 60)]
  pub timeout_secs: u64,

  /// Debug-level logging (RUST_LOG still wins)
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Projects whose revision differs between two manifests
  ManifestDiff {
    #[arg(long)]
    left: PathBuf,
    #[arg(long)]
    right: PathBuf,
  },
  /// Resolve a manifest against local clones; optional checkout and file metrics
  Snapshot {
    #[arg(long)]
    manifest: PathBuf,
    #[arg(long)]
    repo_root: PathBuf,
    /// Check out every project at its manifest revision before scanning
    #[arg(long)]
    checkout: bool,
    /// Directory name skipped during the scan
    #[arg(long, default_value = ".git")]
    exclude_dir: String,
  },
  /// Commits, changed files and per-project summary between two manifests
  GitChanges {
    #[arg(long)]
    left: PathBuf,
    #[arg(long)]
    right: PathBuf,
    #[arg(long)]
    repo_root: PathBuf,
    #[arg(long)]
    include_merges: bool,
    /// Files counted in the commits report
    #[arg(long, default_value = DEFAULT_GIT_FILE_PATTERN)]
    file_pattern: String,
    /// Files listed in the git-files report
    #[arg(long, default_value = DEFAULT_FILES_PATTERN)]
    files_pattern: String,
  },
  /// Changes, patch sets, reviews and files from the review server
  Gerrit {
    #[arg(long)]
    project: Option<String>,
    #[arg(long)]
    branch: Option<String>,
    #[arg(long)]
    status: Option<String>,
    /// Change numbers, change ids or commit shas (comma separated)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    numbers: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
  },
  /// Review-server records for the commits between two manifests
  CommitChanges {
    #[arg(long)]
    left: PathBuf,
    #[arg(long)]
    right: PathBuf,
    #[arg(long)]
    repo_root: PathBuf,
    /// Only look up commits whose author email domain contains this text
    #[arg(long)]
    include_domain: Option<String>,
    #[arg(long)]
    include_merges: bool,
    #[arg(long, default_value = DEFAULT_GIT_FILE_PATTERN)]
    file_pattern: String,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
  },
}

#[derive(Debug, Clone)]
pub struct GerritConfig {
  pub url: String,
  pub timeout: Duration,
  pub page_size: usize,
}

#[derive(Debug, Clone)]
pub enum Task {
  ManifestDiff {
    left: PathBuf,
    right: PathBuf,
  },
  Snapshot {
    manifest: PathBuf,
    repo_root: PathBuf,
    checkout: bool,
    exclude_dir: String,
  },
  GitChanges {
    left: PathBuf,
    right: PathBuf,
    repo_root: PathBuf,
    commits: ClassifyOptions,
    files: ClassifyOptions,
  },
  Gerrit {
    query: ChangeQuery,
    gerrit: GerritConfig,
  },
  CommitChanges {
    left: PathBuf,
    right: PathBuf,
    repo_root: PathBuf,
    commits: ClassifyOptions,
    include_domain: Option<String>,
    gerrit: GerritConfig,
  },
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
  pub output: OutputConfig,
  pub task: Task,
}

fn absolute(p: &std::path::Path) -> PathBuf {
  PathBuf::from(util::canonicalize_lossy(p))
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
  Regex::new(pattern).with_context(|| format!("invalid {} regex {:?}", name, pattern))
}

fn gerrit_config(url: Option<String>, timeout_secs: u64, page_size: usize) -> Result<GerritConfig> {
  let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
    bail!("--gerrit-url (or GERRIT_URL) is required for review server queries");
  };
  if page_size == 0 {
    bail!("--page-size must be at least 1");
  }
  Ok(GerritConfig {
    url,
    timeout: Duration::from_secs(timeout_secs),
    page_size,
  })
}

/// Validate flags into an EffectiveConfig; every configuration error surfaces here, before any I/O.
pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let Some(command) = cli.command else {
    bail!("a subcommand is required (see --help)");
  };

  let task = match command {
    Command::ManifestDiff { left, right } => Task::ManifestDiff { left, right },
    Command::Snapshot {
      manifest,
      repo_root,
      checkout,
      exclude_dir,
    } => {
      if exclude_dir.is_empty() || exclude_dir.contains('/') {
        bail!("--exclude-dir must be a single directory name, got {:?}", exclude_dir);
      }
      Task::Snapshot {
        manifest,
        repo_root: absolute(&repo_root),
        checkout,
        exclude_dir,
      }
    }
    Command::GitChanges {
      left,
      right,
      repo_root,
      include_merges,
      file_pattern,
      files_pattern,
    } => Task::GitChanges {
      left,
      right,
      repo_root: absolute(&repo_root),
      commits: ClassifyOptions {
        exclude_merge: !include_merges,
        file_pattern: compile("--file-pattern", &file_pattern)?,
      },
      files: ClassifyOptions {
        exclude_merge: !include_merges,
        file_pattern: compile("--files-pattern", &files_pattern)?,
      },
    },
    Command::Gerrit {
      project,
      branch,
      status,
      numbers,
      page_size,
    } => {
      let identifiers = (!numbers.is_empty()).then_some(numbers);
      let query = ChangeQuery::new(project, branch, status, identifiers)?;
      Task::Gerrit {
        query,
        gerrit: gerrit_config(cli.gerrit_url, cli.timeout_secs, page_size)?,
      }
    }
    Command::CommitChanges {
      left,
      right,
      repo_root,
      include_domain,
      include_merges,
      file_pattern,
      page_size,
    } => Task::CommitChanges {
      left,
      right,
      repo_root: absolute(&repo_root),
      commits: ClassifyOptions {
        exclude_merge: !include_merges,
        file_pattern: compile("--file-pattern", &file_pattern)?,
      },
      include_domain,
      gerrit: gerrit_config(cli.gerrit_url, cli.timeout_secs, page_size)?,
    },
  };

  let prefix = cli.prefix.unwrap_or_else(|| util::default_prefix(None));
  if prefix.contains('/') {
    bail!("--prefix must not contain '/'");
  }

  Ok(EffectiveConfig {
    output: OutputConfig::new(cli.out_dir, prefix),
    task,
  })
}
