// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: List commits in left..right for every common-changed project's local repository
// role: input/commit-ranges
// inputs: BTreeMap<name, CommonChanged>, repo root
// outputs: RangeCommits (project -> repo path + ordered shas), found/total counts
// side_effects: Spawns git rev-list
// invariants:
// - ranges exclude left and include right (standard git range semantics)
// - projects that cannot be opened or listed are skipped and counted, never fatal
// errors: None surfaced; per-project failures are logged
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::gitio;
use crate::manifest::CommonChanged;

#[derive(Debug, Clone)]
pub struct ProjectRange {
  pub repo: PathBuf,
  pub left_revision: String,
  pub right_revision: String,
  /// Newest first.
  pub shas: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RangeCommits {
  pub projects: BTreeMap<String, ProjectRange>,
  pub total: usize,
}

impl RangeCommits {
  pub fn extract(common_changed: &BTreeMap<String, CommonChanged>, repo_root: &Path) -> Self {
    let mut projects = BTreeMap::new();

    for (name, cc) in common_changed {
      let repo = repo_root.join(&cc.path);

      if !gitio::is_repository(&repo) {
        warn!(project = %name, path = %repo.display(), "no git repository found");
        continue;
      }

      match gitio::rev_list_range(&repo, &cc.left_revision, &cc.right_revision) {
        Ok(shas) => {
          projects.insert(
            name.clone(),
            ProjectRange {
              repo,
              left_revision: cc.left_revision.clone(),
              right_revision: cc.right_revision.clone(),
              shas,
            },
          );
        }
        Err(e) => warn!(project = %name, "cannot list {}..{}: {:#}", cc.left_revision, cc.right_revision, e),
      }
    }

    let out = Self {
      projects,
      total: common_changed.len(),
    };
    info!("{}/{} projects found in {}/", out.found(), out.total, repo_root.display());
    out
  }

  pub fn found(&self) -> usize {
    self.projects.len()
  }

  pub fn count_commits(&self) -> usize {
    self.projects.values().map(|p| p.shas.len()).sum()
  }
}
