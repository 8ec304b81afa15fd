//! test-support: helpers shared by the integration tests.
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support", features = ["serde"] }
//! ```
//!
//! ```rust,no_run
//! use test_support::{GitRepo, init_tracing, write_manifest};
//!
//! init_tracing();
//! let root = test_support::tempdir();
//! let repo = GitRepo::init(&root.path().join("proj"));
//! let sha = repo.commit(&[("a.c", "int a;\n")], "add a", "dev@example.com", "2014-01-01T10:00:00Z");
//! write_manifest(&root.path().join("m.xml"), &[("proj", "proj", sha.as_str())]);
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};
use std::process::Command;

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,test=info"))
            .unwrap();
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// `tests/fixtures` of the package under test.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|tests| tests.join("fixtures"))
        .expect("tests/support has a parent")
}

pub fn read_fixture_text<P: AsRef<Path>>(rel_path: P) -> String {
    let path = fixtures_dir().join(rel_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Deserialize a JSON fixture into `T` (enable `serde` feature).
#[cfg(feature = "serde")]
pub fn read_fixture_json<T, P>(rel_path: P) -> T
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let text = read_fixture_text(rel_path.as_ref());
    serde_json::from_str::<T>(&text)
        .unwrap_or_else(|e| panic!("failed to parse JSON fixture {}: {e}", rel_path.as_ref().display()))
}

pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// The CLI binary under test, with `RUST_LOG` cleared so log assertions see the default level.
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    let mut cmd = assert_cmd::Command::cargo_bin(bin).expect("binary target not found");
    cmd.env_remove("RUST_LOG").env_remove("GERRIT_URL");
    cmd
}

/// Run git in `repo`, panicking on failure.
pub fn git(repo: &Path, args: &[&str]) -> String {
    let out = Command::new("git").args(args).current_dir(repo).output().unwrap();
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

/// A throwaway repository with deterministic identities and dates.
pub struct GitRepo {
    pub path: PathBuf,
}

impl GitRepo {
    pub fn init(path: &Path) -> Self {
        std::fs::create_dir_all(path).unwrap();
        git(path, &["init", "-q", "-b", "main"]);
        git(path, &["config", "user.name", "Fixture Bot"]);
        git(path, &["config", "user.email", "fixture@example.com"]);
        git(path, &["config", "commit.gpgsign", "false"]);
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write `files` (relative path, content), commit them all and return the new sha.
    pub fn commit(&self, files: &[(&str, &str)], message: &str, author_email: &str, date: &str) -> String {
        for (rel, body) in files {
            let p = self.path.join(rel);
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(p, body).unwrap();
        }
        git(&self.path, &["add", "-A"]);

        let status = Command::new("git")
            .args(["commit", "-q", "--allow-empty", "-m", message])
            .current_dir(&self.path)
            .env("GIT_AUTHOR_NAME", "Fixture Author")
            .env("GIT_AUTHOR_EMAIL", author_email)
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date)
            .status()
            .unwrap();
        assert!(status.success(), "commit {:?} failed", message);

        self.head()
    }

    pub fn head(&self) -> String {
        git(&self.path, &["rev-parse", "HEAD"])
    }
}

/// Write a repo-tool manifest with `(name, path, revision)` projects.
pub fn write_manifest(path: &Path, projects: &[(&str, &str, &str)]) {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<manifest>\n");
    xml.push_str("  <remote name=\"origin\" fetch=\"..\"/>\n  <default remote=\"origin\" revision=\"main\"/>\n");
    for (name, rel, rev) in projects {
        xml.push_str(&format!(
            "  <project name=\"{}\" path=\"{}\" revision=\"{}\"/>\n",
            name, rel, rev
        ));
    }
    xml.push_str("</manifest>\n");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, xml).unwrap();
}

/// Read a CSV report into rows of fields (header included).
pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
    rdr.records()
        .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
        .collect()
}
