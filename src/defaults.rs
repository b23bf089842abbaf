//! Default values shared across the scm tool.
//!
//! File names, external program names and the patterns used by the cleanup
//! and status commands live here so every module agrees on them.

/// Name of the declarative configuration file.
pub const CONFIG_FILENAME: &str = "scm_config";

/// Name of the stash file inside the repository metadata directory.
pub const STASH_FILENAME: &str = "stash";

/// Suffix of the stash file holding staged changes.
pub const STASH_INDEX_SUFFIX: &str = ".index";

/// Header line written by `scm scan`.
pub const CONFIG_HEADER: &str = "# Format: \"directory: scm=url\"";

pub const PATCH_PROGRAM: &str = "patch";
pub const GREP_PROGRAM: &str = "grep";
pub const HG_PROGRAM: &str = "hg";
pub const GIT_PROGRAM: &str = "git";
pub const SYNC_PROGRAM: &str = "sync";

/// Environment variables removed from every child process so that textual
/// output is parsed the same way whatever the operator's locale is.
pub const LOCALE_VARIABLES: &[&str] = &["LANG", "LC_ALL", "LC_CTYPE"];

/// File suffixes removed by `scm clean`.
pub const CLEAN_SUFFIXES: &[&str] = &[".orig", ".rej", ".bak", ".pyc", ".pyo"];

/// Directory names removed by `scm clean`.
pub const CLEAN_DIRECTORIES: &[&str] = &["__pycache__"];

/// Untracked files hidden from `scm status` unless running verbose.
pub const STATUS_IGNORE_PATTERNS: &[&str] = &["*.swp", "tags"];

/// Metadata directories `scm distclean` never enters.
pub const METADATA_DIRECTORIES: &[&str] = &[".git", ".hg"];

/// Number of file names listed in the "revert everything" prompt.
pub const REVERT_PROMPT_FILES: usize = 5;
