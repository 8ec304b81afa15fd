// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Gerrit REST access behind a trait seam (HTTP via ureq, env-fixture backend for tests), credential discovery
// role: gerrit/api
// inputs: server base URL; env GERRIT_USERNAME/GERRIT_PASSWORD; ~/.netrc; env RCR_TEST_GERRIT_CHANGES_JSON
// outputs: Raw change JSON values per query
// side_effects: Network calls to the review server; reads ~/.netrc
// invariants:
// - authenticated requests go to <base>/a/changes/, anonymous ones to <base>/changes/
// - the )]}' XSSI prefix is stripped before JSON parsing
// - no retries; transport and HTTP status errors are returned to the caller
// errors: Transport, status and JSON errors surface with the request URL as context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::ext::serde_json::JsonFetch;

pub const TEST_CHANGES_ENV: &str = "RCR_TEST_GERRIT_CHANGES_JSON";

const XSSI_PREFIX: &str = ")]}'";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl Credentials {
  fn basic_header(&self) -> String {
    let raw = format!("{}:{}", self.username, self.password);
    format!("Basic {}", STANDARD.encode(raw))
  }
}

// --- Trait seam for the review server ---
pub trait GerritApi {
  /// Run one `changes/` query; `q` uses spaces between terms, `options` are `o=` values.
  fn query_changes(&self, q: &str, options: &[&str]) -> Result<Vec<serde_json::Value>>;
}

pub struct GerritHttpApi {
  base_url: String,
  credentials: Option<Credentials>,
  agent: ureq::Agent,
}

impl GerritHttpApi {
  pub fn new(base_url: &str, credentials: Option<Credentials>, timeout: Duration) -> Self {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      credentials,
      agent,
    }
  }

  pub fn changes_url(&self) -> String {
    if self.credentials.is_some() {
      format!("{}/a/changes/", self.base_url)
    } else {
      format!("{}/changes/", self.base_url)
    }
  }
}

impl GerritApi for GerritHttpApi {
  fn query_changes(&self, q: &str, options: &[&str]) -> Result<Vec<serde_json::Value>> {
    let url = self.changes_url();
    let mut req = self
      .agent
      .get(&url)
      .set("Accept", "application/json")
      .set("User-Agent", "repo-change-report")
      .query("q", q);

    for o in options {
      req = req.query("o", o);
    }
    if let Some(c) = &self.credentials {
      req = req.set("Authorization", &c.basic_header());
    }

    debug!(url = %url, q = %q, "querying changes");
    let resp = req.call().with_context(|| format!("GET {} (q={})", url, q))?;
    let body = resp.into_string().with_context(|| format!("reading response from {}", url))?;
    parse_changes_body(&body).with_context(|| format!("parsing response from {}", url))
  }
}

/// Strip the XSSI guard and parse the change array.
pub fn parse_changes_body(body: &str) -> Result<Vec<serde_json::Value>> {
  let json = body.trim_start().strip_prefix(XSSI_PREFIX).unwrap_or(body);
  let v: serde_json::Value = serde_json::from_str(json.trim_start())?;

  match v {
    serde_json::Value::Array(items) => Ok(items),
    other => bail!("expected a JSON array of changes, got {}", type_name(&other)),
  }
}

fn type_name(v: &serde_json::Value) -> &'static str {
  match v {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "bool",
    serde_json::Value::Number(_) => "number",
    serde_json::Value::String(_) => "string",
    serde_json::Value::Array(_) => "array",
    serde_json::Value::Object(_) => "object",
  }
}

/// Answers queries from a JSON array held in `RCR_TEST_GERRIT_CHANGES_JSON`.
pub struct GerritEnvApi {
  changes: Vec<serde_json::Value>,
}

impl GerritEnvApi {
  pub fn from_env() -> Result<Self> {
    let raw = std::env::var(TEST_CHANGES_ENV).with_context(|| format!("{} not set", TEST_CHANGES_ENV))?;
    Ok(Self {
      changes: parse_changes_body(&raw)?,
    })
  }
}

impl GerritApi for GerritEnvApi {
  fn query_changes(&self, q: &str, _options: &[&str]) -> Result<Vec<serde_json::Value>> {
    let terms: Vec<&str> = q.split(' ').filter(|t| !t.is_empty() && *t != "OR").collect();
    let is_filter = terms.iter().any(|t| t.contains(':'));

    let matched = self
      .changes
      .iter()
      .filter(|c| {
        if is_filter {
          terms.iter().all(|t| match t.split_once(':') {
            Some(("project", v)) => c.fetch("project").str() == Some(v),
            Some(("branch", v)) => c.fetch("branch").str() == Some(v),
            Some(("status", v)) => c.fetch("status").str().is_some_and(|s| s.eq_ignore_ascii_case(v)),
            _ => false,
          })
        } else {
          terms.iter().any(|t| change_matches_id(c, t))
        }
      })
      .cloned()
      .collect();

    Ok(matched)
  }
}

fn change_matches_id(c: &serde_json::Value, id: &str) -> bool {
  let number = c.fetch("_number").to::<i64>().map(|n| n.to_string());
  let in_revisions = !id.contains('.') && c.fetch(&format!("revisions.{}", id)).is_some();

  number.as_deref() == Some(id) || c.fetch("change_id").str() == Some(id) || in_revisions
}

/// Discover credentials: env vars first, then the `~/.netrc` entry for the server host.
pub fn get_gerrit_credentials(base_url: &str) -> Option<Credentials> {
  if let (Ok(u), Ok(p)) = (std::env::var("GERRIT_USERNAME"), std::env::var("GERRIT_PASSWORD")) {
    if !u.trim().is_empty() {
      return Some(Credentials {
        username: u,
        password: p,
      });
    }
  }

  let host = url_host(base_url)?;
  let netrc = dirs::home_dir()?.join(".netrc");
  let text = std::fs::read_to_string(netrc).ok()?;
  netrc_lookup(&text, host)
}

/// Host part of an http(s) URL.
pub fn url_host(url: &str) -> Option<&str> {
  let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
  let authority = rest.split('/').next()?;
  let host_port = authority.rsplit('@').next()?;
  let host = host_port.split(':').next()?;
  (!host.is_empty()).then_some(host)
}

/// Find `login`/`password` for `host` in netrc text; falls back to a `default` entry.
pub fn netrc_lookup(text: &str, host: &str) -> Option<Credentials> {
  let mut tokens = text.split_whitespace();
  let mut current_matches = false;
  let mut found: Option<Credentials> = None;
  let mut default: Option<Credentials> = None;
  let mut in_default = false;
  let mut login: Option<String> = None;
  let mut password: Option<String> = None;

  let mut flush = |matches: bool, is_default: bool, login: &mut Option<String>, password: &mut Option<String>| {
    if let (Some(l), Some(p)) = (login.take(), password.take()) {
      let c = Credentials { username: l, password: p };
      if matches && found.is_none() {
        found = Some(c);
      } else if is_default && default.is_none() {
        default = Some(c);
      }
    }
  };

  while let Some(tok) = tokens.next() {
    match tok {
      "machine" => {
        flush(current_matches, in_default, &mut login, &mut password);
        current_matches = tokens.next() == Some(host);
        in_default = false;
      }
      "default" => {
        flush(current_matches, in_default, &mut login, &mut password);
        current_matches = false;
        in_default = true;
      }
      "login" => login = tokens.next().map(|s| s.to_string()),
      "password" => password = tokens.next().map(|s| s.to_string()),
      _ => {}
    }
  }
  flush(current_matches, in_default, &mut login, &mut password);

  found.or(default)
}

/// Env fixtures win over the network so CLI tests stay hermetic.
pub fn build_api(base_url: &str, timeout: Duration) -> Result<Box<dyn GerritApi>> {
  if std::env::var(TEST_CHANGES_ENV).is_ok() {
    return Ok(Box::new(GerritEnvApi::from_env()?));
  }
  let credentials = get_gerrit_credentials(base_url);
  if credentials.is_none() {
    debug!("no Gerrit credentials found; querying anonymously");
  }
  Ok(Box::new(GerritHttpApi::new(base_url, credentials, timeout)))
}
