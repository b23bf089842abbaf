//! # CLI Command Implementations
//!
//! Each module groups the subcommands of one family:
//!
//! - `inspect`: read-only reports fanned out over the working set (`status`,
//!   `diff`, `info`, `grep`, `files`, `out`, branches and tags).
//! - `change`: single-repository commands that modify the working tree or
//!   history (`add`, `commit`, `histedit`, `revert`, `stash`, `unstash`).
//! - `remote`: `pull`, `push` and `clone`.
//! - `scan`: generate a configuration file from the repositories on disk.
//! - `clean`: `clean`, `distclean` and `remove_untracked`.
//! - `completions`: shell completion scripts.
//!
//! Every `execute` function takes the parsed arguments and the invocation
//! [`Context`](multi_scm::context::Context) and returns the process exit code.

pub mod change;
pub mod clean;
pub mod completions;
pub mod inspect;
pub mod remote;
pub mod scan;
