// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Validate change queries, split identifier lists into pages, and materialize typed Change records
// role: gerrit/fetch
// inputs: ChangeQuery, page size, &dyn GerritApi
// outputs: ChangeSet (concatenated Change records in request order)
// side_effects: One API call per page
// invariants:
// - ChangeQuery is either (project AND branch, optional status) or a non-empty identifier list; nothing else constructs
// - identifier pages hold at most page_size ids; results keep request order; no deduplication
// - every query inlines ALL_REVISIONS, ALL_COMMITS, ALL_FILES and MESSAGES
// errors: Configuration errors before any I/O; API errors propagate unmodified; malformed records are logged and skipped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::ext::serde_json::JsonFetch;
use crate::gerrit::api::GerritApi;
use crate::gerrit::model::Change;

/// Review server query-size limit.
pub const DEFAULT_PAGE_SIZE: usize = 75;

pub const QUERY_OPTIONS: [&str; 4] = ["ALL_REVISIONS", "ALL_COMMITS", "ALL_FILES", "MESSAGES"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeQuery {
  Branch {
    project: String,
    branch: String,
    status: Option<String>,
  },
  Identifiers(Vec<String>),
}

impl ChangeQuery {
  pub fn new(
    project: Option<String>,
    branch: Option<String>,
    status: Option<String>,
    identifiers: Option<Vec<String>>,
  ) -> Result<Self> {
    match (project, branch, status, identifiers) {
      (Some(project), Some(branch), status, None) => Ok(Self::Branch { project, branch, status }),
      (None, None, None, Some(ids)) => {
        if ids.is_empty() {
          bail!("Change identifier list is empty");
        }
        Ok(Self::Identifiers(ids))
      }
      (None, None, Some(_), Some(_)) => bail!("--status only applies to a --project/--branch query"),
      (Some(_), None, _, None) | (None, Some(_), _, None) => bail!("--project and --branch must be given together"),
      (None, None, _, None) => bail!("Provide either --project and --branch, or a list of change numbers"),
      _ => bail!("Parameter combination is wrong: choose either --project/--branch or change numbers, not both"),
    }
  }

  /// Query strings, one per request.
  pub fn pages(&self, page_size: usize) -> Vec<String> {
    match self {
      Self::Branch { project, branch, status } => {
        let mut q = format!("project:{} branch:{}", project, branch);
        if let Some(s) = status {
          q.push_str(&format!(" status:{}", s));
        }
        vec![q]
      }
      Self::Identifiers(ids) => ids.chunks(page_size.max(1)).map(|chunk| chunk.join(" OR ")).collect(),
    }
  }
}

/// Changes in fetch order; keyed by server change number, not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
  pub changes: Vec<Change>,
}

impl ChangeSet {
  pub fn merge(&mut self, other: ChangeSet) {
    self.changes.extend(other.changes);
  }

  pub fn len(&self) -> usize {
    self.changes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.changes.is_empty()
  }
}

/// Deserialize raw records, skipping the ones that do not fit the model.
pub fn materialize(raw: Vec<serde_json::Value>) -> ChangeSet {
  let mut changes = Vec::with_capacity(raw.len());

  for v in raw {
    let number = v.fetch("_number").to::<i64>();
    match serde_json::from_value::<Change>(v) {
      Ok(c) => changes.push(c),
      Err(e) => match number {
        Some(n) => warn!(number = n, "skipping malformed change record: {}", e),
        None => warn!("skipping malformed change record: {}", e),
      },
    }
  }

  ChangeSet { changes }
}

pub fn fetch(api: &dyn GerritApi, query: &ChangeQuery, page_size: usize) -> Result<ChangeSet> {
  if page_size == 0 {
    bail!("page size must be at least 1");
  }

  let pages = query.pages(page_size);
  let mut out = ChangeSet::default();

  for (i, q) in pages.iter().enumerate() {
    let raw = api.query_changes(q, &QUERY_OPTIONS)?;
    if let ChangeQuery::Identifiers(ids) = query {
      let start = i * page_size;
      let end = (start + page_size).min(ids.len());
      info!("page {}: ids {}..{}, {} changes", i + 1, start, end, raw.len());
    }
    out.merge(materialize(raw));
  }

  if let ChangeQuery::Identifiers(ids) = query {
    info!("Total: {}", ids.len());
  }
  info!("Found: {}", out.len());
  Ok(out)
}
