//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a temporary workspace fixture and helpers to create
//! Git repositories and `scm_config` files inside it.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let Some(fixture) = TestFixture::with_git() else { return };
//!     fixture.git_repo("lib/foo");
//!     fixture.scm().arg("status").assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{git_available, hg_available};
    pub use super::TestFixture;
}

/// Whether `program --version` can be run.
pub fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Whether a `git` executable can be run.
///
/// Tests that need real repositories return early when it cannot.
pub fn git_available() -> bool {
    program_available("git")
}

/// Whether an `hg` executable can be run.
pub fn hg_available() -> bool {
    program_available("hg")
}

fn checked_output(mut command: Command, args: &[&str]) -> String {
    let output = command.output().expect("failed to run command");
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run git in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    git_with_env(dir, &[], args)
}

/// Run git in `dir` with extra environment variables, e.g. a fixed
/// `GIT_COMMITTER_DATE`.
pub fn git_with_env(dir: &Path, env: &[(&str, &str)], args: &[&str]) -> String {
    let mut command = Command::new("git");
    command
        .args(["-c", "user.name=scm tests", "-c", "user.email=scm@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .envs(env.iter().copied())
        .current_dir(dir);
    checked_output(command, args)
}

/// Run hg in `dir` with a fixed identity and no user configuration,
/// panicking on failure.
pub fn hg(dir: &Path, args: &[&str]) -> String {
    let mut command = Command::new("hg");
    command
        .args(["--config", "ui.username=scm tests <scm@example.com>"])
        .args(args)
        .env("HGRCPATH", "")
        .env("HGPLAIN", "1")
        .current_dir(dir);
    checked_output(command, args)
}

/// A temporary workspace the `scm` binary runs in.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_config("lib/foo: git=https://example.com/foo.git\n");
///
/// fixture.scm().arg("info").assert().code(0);
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create an empty workspace when git is installed.
    pub fn with_git() -> Option<Self> {
        if git_available() {
            Some(Self::new())
        } else {
            eprintln!("git is not available, skipping");
            None
        }
    }

    /// Write an `scm_config` file at the workspace root.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("scm_config")
            .write_str(content)
            .expect("Failed to write scm_config");
        self
    }

    /// Write a file relative to the workspace root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Write a file relative to the workspace root.
    pub fn write(&self, path: &str, content: &str) {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Read a file relative to the workspace root.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(path)).expect("Failed to read file")
    }

    /// Path of the workspace root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a workspace entry.
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Initialize a Git repository at `path` with one committed
    /// `README.txt` file.
    pub fn git_repo(&self, path: &str) -> PathBuf {
        let root = self.join(path);
        std::fs::create_dir_all(&root).expect("Failed to create repository directory");
        git(&root, &["init", "-q"]);
        std::fs::write(root.join("README.txt"), "first line\n").expect("Failed to write file");
        git(&root, &["add", "README.txt"]);
        git(&root, &["commit", "-q", "-m", "initial"]);
        root
    }

    /// Create an empty workspace when hg is installed.
    pub fn with_hg() -> Option<Self> {
        if hg_available() {
            Some(Self::new())
        } else {
            eprintln!("hg is not available, skipping");
            None
        }
    }

    /// Initialize a Mercurial repository at `path` with one committed
    /// `README.txt` file.
    pub fn hg_repo(&self, path: &str) -> PathBuf {
        let root = self.join(path);
        std::fs::create_dir_all(&root).expect("Failed to create repository directory");
        hg(&root, &["init"]);
        std::fs::write(root.join("README.txt"), "first line\n").expect("Failed to write file");
        hg(&root, &["add", "README.txt"]);
        hg(&root, &["commit", "-m", "initial"]);
        root
    }

    /// Initialize a Git repository with an `origin` remote.
    pub fn git_repo_with_origin(&self, path: &str, url: &str) -> PathBuf {
        let root = self.git_repo(path);
        git(&root, &["remote", "add", "origin", url]);
        root
    }

    /// `scm` command running in the workspace root.
    pub fn scm(&self) -> assert_cmd::Command {
        self.scm_in(".")
    }

    /// `scm` command running in a workspace subdirectory.
    pub fn scm_in(&self, dir: &str) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("scm");
        cmd.current_dir(self.join(dir))
            .env_remove("RUST_LOG")
            .env("HGRCPATH", "")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
