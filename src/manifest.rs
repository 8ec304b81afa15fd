// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Parse repo-tool manifests and compare two snapshots for projects whose pinned revision changed
// role: input/manifest
// inputs: manifest XML text or file path
// outputs: Manifest (name -> ManifestEntry), BTreeMap of CommonChanged
// side_effects: load reads the manifest file
// invariants:
// - project path defaults to its name; revision defaults to <default revision>
// - compare(M, M) is empty; only projects present in both snapshots appear
// - CommonChanged.path comes from the left snapshot
// errors: Malformed XML, wrong root element, nameless projects and unresolved revisions fail parsing
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
  pub name: String,
  pub path: String,
  pub revision: String,
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
  pub projects: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
  pub fn parse(text: &str) -> Result<Self> {
    let doc = roxmltree::Document::parse(text).context("parsing manifest XML")?;
    let root = doc.root_element();

    if root.tag_name().name() != "manifest" {
      bail!("expected <manifest> root element, found <{}>", root.tag_name().name());
    }

    let default_revision = root
      .children()
      .filter(|n| n.has_tag_name("default"))
      .filter_map(|n| n.attribute("revision"))
      .last()
      .map(|s| s.to_string());

    let mut projects = BTreeMap::new();

    for node in root.children().filter(|n| n.has_tag_name("project")) {
      let Some(name) = node.attribute("name") else {
        bail!("manifest project without a name (line {})", doc.text_pos_at(node.range().start).row);
      };
      let path = node.attribute("path").unwrap_or(name).to_string();
      let revision = match node.attribute("revision").map(|s| s.to_string()).or_else(|| default_revision.clone()) {
        Some(r) => r,
        None => bail!("manifest project {} has no revision and no <default revision>", name),
      };

      let entry = ManifestEntry {
        name: name.to_string(),
        path,
        revision,
      };

      if projects.insert(name.to_string(), entry).is_some() {
        warn!(project = name, "duplicate project in manifest; keeping the last entry");
      }
    }

    Ok(Self { projects })
  }

  pub fn load(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading manifest {}", path.display()))?;
    Self::parse(&text).with_context(|| format!("in manifest {}", path.display()))
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }
}

/// A project present in both snapshots whose revision differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonChanged {
  pub name: String,
  pub path: String,
  pub left_revision: String,
  pub right_revision: String,
}

pub fn compare(left: &Manifest, right: &Manifest) -> BTreeMap<String, CommonChanged> {
  let mut out = BTreeMap::new();

  for (name, l) in &left.projects {
    let Some(r) = right.projects.get(name) else { continue };

    if l.revision != r.revision {
      out.insert(
        name.clone(),
        CommonChanged {
          name: name.clone(),
          path: l.path.clone(),
          left_revision: l.revision.clone(),
          right_revision: r.revision.clone(),
        },
      );
    }
  }

  out
}
