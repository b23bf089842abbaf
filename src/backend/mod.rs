//! # Repository Backends
//!
//! A [`Backend`] maps the abstract operations `scm` offers onto concrete
//! `hg` or `git` invocations and parses their output into normalized forms.
//! Both implementations have the same shape; they differ only in the command
//! lines they build and the output grammar they read.
//!
//! The backend is chosen once, when a repository is discovered, and stored
//! by value in a [`Vcs`]. [`Vcs::backend`] is the single place where the
//! concrete implementation is selected.
//!
//! Backend methods never wrap themselves in the stash protocol: the
//! [`Repository`](crate::repository::Repository) layer does that, so the
//! protocol is written once for both tools.

pub mod git;
pub mod hg;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::BackendKind;
use crate::error::Result;
use crate::repository::Repository;
use crate::runner::Cmd;

pub use git::Git;
pub use hg::Mercurial;

/// Operations every version control backend implements.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Directory holding the backend metadata (`.hg` or the Git directory).
    fn metadata_dir(&self) -> &Path;

    /// Remote URL read from the backend configuration file, if any.
    ///
    /// Parse failures are logged and reported as `None`.
    fn remote_url(&self) -> Option<String>;

    /// True if tracked files have uncommitted modifications. Untracked files
    /// do not count.
    fn has_local_changes(&self, repo: &Repository) -> Result<bool>;

    /// Tracked files with local modifications, relative to the root.
    fn modified_files(&self, repo: &Repository) -> Result<Vec<String>>;

    /// Untracked files, as absolute paths.
    fn untracked_files(&self, repo: &Repository) -> Result<Vec<PathBuf>>;

    /// Tracked files that exist on disk, relative to the root.
    fn tracked_files(&self, repo: &Repository) -> Result<Vec<String>>;

    /// Status lines, with file names relative to the invocation directory
    /// when no path is given.
    fn status(&self, repo: &Repository, paths: &[String]) -> Result<Vec<String>>;

    /// Print the diff of the given paths (the whole tree when empty).
    fn diff(&self, repo: &Repository, paths: &[String]) -> Result<()>;

    /// Patches a stash record is made of, in the order they are applied
    /// back.
    fn stash_patches(&self) -> &'static [StashPatch] {
        &[StashPatch::WorkingTree]
    }

    /// Command printing one part of the local changes on stdout.
    fn stash_diff(&self, repo: &Repository, patch: StashPatch) -> Cmd;

    /// Command applying one stash patch fed on stdin.
    fn apply_patch(&self, repo: &Repository, patch: StashPatch) -> Cmd;

    /// Discard every local change (hard reset to the last commit).
    fn revert_all(&self, repo: &Repository) -> Result<()>;

    /// Discard local changes of the given paths, or of the whole tree.
    fn revert(&self, repo: &Repository, paths: &[String]) -> Result<()>;

    /// Rebase-pull: fetch new commits and replay local commits on top.
    fn pull(&self, repo: &Repository) -> Result<()>;

    /// Push local commits.
    fn push(&self, repo: &Repository) -> Result<()>;

    /// Create the repository at its root from `url`.
    fn clone_from(&self, repo: &Repository, url: &str) -> Result<()>;

    /// Rewrite history from `revision`; returns the tool's exit code.
    fn histedit(&self, repo: &Repository, revision: &str) -> Result<i32>;

    /// Commit; returns the tool's exit code.
    fn commit(&self, repo: &Repository, args: &[String]) -> Result<i32>;

    fn add(&self, repo: &Repository, args: &[String]) -> Result<()>;

    /// Name of the current branch.
    fn branch(&self, repo: &Repository) -> Result<String>;

    fn list_branches(&self, repo: &Repository) -> Result<Vec<String>>;

    fn list_tags(&self, repo: &Repository) -> Result<Vec<String>>;

    /// Tags on descendants of `revision`, nearest first.
    fn tag_contains(&self, repo: &Repository, revision: &str) -> Result<Vec<String>>;

    /// Print outgoing commits; returns the exit code to aggregate.
    fn outgoing(&self, repo: &Repository, display_if_empty: bool) -> Result<i32>;

    /// Backend specific `key = value` lines shown by `scm info`.
    fn info(&self, repo: &Repository) -> Result<Vec<String>>;

    /// Backend specific cleanup run by `scm clean`.
    fn clean(&self, _repo: &Repository) -> Result<()> {
        Ok(())
    }
}

/// One part of the saved local changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashPatch {
    /// Changes recorded in the index (Git only), relative to the last commit.
    Staged,
    /// Changes of the working tree, relative to the index when there is one.
    WorkingTree,
}

/// A backend selected for one repository.
#[derive(Debug, Clone)]
pub enum Vcs {
    Mercurial(Mercurial),
    Git(Git),
}

impl Vcs {
    /// Recognize a repository root: a `.hg` directory, or a Git directory
    /// holding an index.
    pub fn detect(directory: &Path) -> Option<Vcs> {
        Mercurial::detect(directory)
            .map(Vcs::Mercurial)
            .or_else(|| Git::detect(directory).map(Vcs::Git))
    }

    /// Backend for a configured repository that may not exist yet.
    pub fn for_kind(kind: BackendKind, root: &Path) -> Vcs {
        match kind {
            BackendKind::Mercurial => Vcs::Mercurial(Mercurial::at(root)),
            BackendKind::Git => Vcs::Git(Git::at(root)),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        match self {
            Vcs::Mercurial(hg) => hg,
            Vcs::Git(git) => git,
        }
    }
}

static STATUS_IGNORE: LazyLock<Vec<glob::Pattern>> = LazyLock::new(|| {
    crate::defaults::STATUS_IGNORE_PATTERNS
        .iter()
        .filter_map(|pattern| glob::Pattern::new(pattern).ok())
        .collect()
});

/// Keep untracked files matching one of the ignore patterns out of status
/// reports.
pub(crate) fn is_ignored_untracked(name: &str) -> bool {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    STATUS_IGNORE.iter().any(|pattern| pattern.matches(file_name))
}

/// Read a git-config / hgrc style INI file after stripping the indentation
/// both tools allow.
pub(crate) fn read_ini(path: &Path) -> Option<ini::Ini> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Fail to read {}: {}", path.display(), err);
            }
            return None;
        }
    };
    let stripped: Vec<&str> = content.lines().map(str::trim).collect();
    let options = ini::ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    match ini::Ini::load_from_str_opt(&stripped.join("\n"), options) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log::warn!("Fail to parse {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_mercurial() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".hg")).unwrap();
        let vcs = Vcs::detect(dir.path()).unwrap();
        assert_eq!(vcs.backend().kind(), BackendKind::Mercurial);
    }

    #[test]
    fn test_detect_git_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(Vcs::detect(dir.path()).is_none());

        fs::write(dir.path().join(".git/index"), b"").unwrap();
        let vcs = Vcs::detect(dir.path()).unwrap();
        assert_eq!(vcs.backend().kind(), BackendKind::Git);
    }

    #[test]
    fn test_detect_plain_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Vcs::detect(dir.path()).is_none());
    }

    #[test]
    fn test_for_kind_metadata_dir() {
        let root = Path::new("/work/foo");
        assert_eq!(
            Vcs::for_kind(BackendKind::Mercurial, root)
                .backend()
                .metadata_dir(),
            Path::new("/work/foo/.hg")
        );
        assert_eq!(
            Vcs::for_kind(BackendKind::Git, root).backend().metadata_dir(),
            Path::new("/work/foo/.git")
        );
    }

    #[test]
    fn test_status_ignore_patterns_compile() {
        assert_eq!(
            STATUS_IGNORE.len(),
            crate::defaults::STATUS_IGNORE_PATTERNS.len()
        );
    }

    #[test]
    fn test_ignored_untracked() {
        assert!(is_ignored_untracked(".main.rs.swp"));
        assert!(is_ignored_untracked("src/tags"));
        assert!(!is_ignored_untracked("src/main.rs"));
        assert!(!is_ignored_untracked("tags.txt"));
    }

    #[test]
    fn test_read_ini_strips_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(
            &path,
            "[core]\n\tbare = false\n[remote \"origin\"]\n\turl = https://x/y.git\n",
        )
        .unwrap();
        let parsed = read_ini(&path).unwrap();
        assert_eq!(
            parsed.get_from(Some("remote \"origin\""), "url"),
            Some("https://x/y.git")
        );
    }
}
