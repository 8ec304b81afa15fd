// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed Gerrit REST records (ChangeInfo, RevisionInfo, CommitInfo, FileInfo, ChangeMessageInfo)
// role: model/types
// outputs: Deserializable structs mirroring the fields the exporters read
// invariants: Unknown fields are ignored; optional server fields stay Option; revisions iterate in patch-set order via sorted_revisions
// errors: A malformed revision or message entry is logged and dropped; the rest of the change is kept
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Change {
  #[serde(rename = "_number")]
  pub number: i64,
  pub change_id: String,
  pub project: String,
  pub branch: String,
  #[serde(default)]
  pub created: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current_revision: Option<String>,
  #[serde(default, deserialize_with = "lenient_map")]
  pub revisions: BTreeMap<String, RevisionInfo>,
  #[serde(default, deserialize_with = "lenient_vec")]
  pub messages: Vec<ChangeMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RevisionInfo {
  #[serde(rename = "_number")]
  pub number: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub commit: Option<CommitInfo>,
  #[serde(default)]
  pub files: BTreeMap<String, FileInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommitInfo {
  #[serde(default)]
  pub committer: GitPerson,
  #[serde(default)]
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GitPerson {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FileInfo {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lines_inserted: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lines_deleted: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccountInfo {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChangeMessage {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<AccountInfo>,
  pub date: String,
  #[serde(default)]
  pub message: String,
  #[serde(rename = "_revision_number", default, skip_serializing_if = "Option::is_none")]
  pub revision_number: Option<i64>,
}

fn lenient_vec<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let raw = Vec::<serde_json::Value>::deserialize(de)?;
  Ok(
    raw
      .into_iter()
      .enumerate()
      .filter_map(|(i, v)| match serde_json::from_value(v) {
        Ok(t) => Some(t),
        Err(e) => {
          warn!(index = i, "skipping malformed message record: {}", e);
          None
        }
      })
      .collect(),
  )
}

fn lenient_map<'de, D, T>(de: D) -> Result<BTreeMap<String, T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let raw = BTreeMap::<String, serde_json::Value>::deserialize(de)?;
  Ok(
    raw
      .into_iter()
      .filter_map(|(k, v)| match serde_json::from_value(v) {
        Ok(t) => Some((k, t)),
        Err(e) => {
          warn!(revision = %k, "skipping malformed revision record: {}", e);
          None
        }
      })
      .collect(),
  )
}

impl Change {
  /// `current_revision` when present, else the revision with the highest patch-set number.
  pub fn current_revision_id(&self) -> Option<&str> {
    if let Some(id) = self.current_revision.as_deref() {
      if self.revisions.contains_key(id) {
        return Some(id);
      }
    }
    self
      .revisions
      .iter()
      .max_by_key(|(_, r)| r.number)
      .map(|(id, _)| id.as_str())
  }

  /// Revisions ordered by ascending patch-set number.
  pub fn sorted_revisions(&self) -> Vec<(&str, &RevisionInfo)> {
    let mut v: Vec<(&str, &RevisionInfo)> = self.revisions.iter().map(|(k, r)| (k.as_str(), r)).collect();
    v.sort_by_key(|(_, r)| r.number);
    v
  }
}
