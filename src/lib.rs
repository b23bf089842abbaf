//! # Multi-repository SCM Library
//!
//! Core of the `scm` command-line tool, which runs one logical operation
//! (status, pull, grep, revert, ...) across a tree of Mercurial and Git
//! repositories.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use multi_scm::config;
//!
//! let content = "lib/foo: git=https://example.com/foo.git\ntools: hg=https://example.com/tools\n";
//! let entries = config::parse(content, Path::new("scm_config")).unwrap();
//! assert_eq!(entries.len(), 2);
//!
//! // Seen from the `lib` directory, only `foo` is in scope
//! let scoped = config::filter_entries(entries, Path::new("lib"));
//! assert_eq!(scoped.len(), 1);
//! assert_eq!(scoped[0].directory, Path::new("foo"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the `scm_config` file listing
//!   `directory: kind=url` entries.
//! - **Discovery (`discovery`)**: builds the working set from a configuration
//!   file, the enclosing repository, or a downward scan.
//! - **Backends (`backend`)**: the `Backend` trait with its Mercurial and Git
//!   implementations, selected once per repository.
//! - **Repositories (`repository`)**: a root, its backend and its name
//!   relative to the invocation directory.
//! - **Local-change protection (`stash`)**: saves uncommitted edits around
//!   `pull`, `push` and `histedit`.
//! - **Batch execution (`orchestrator`)**: fan-out over the working set with
//!   exit code aggregation.
//! - **Process execution (`runner`)**: every external command goes through
//!   one runner with a controlled environment.

pub mod backend;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod defaults;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod path;
pub mod prompt;
pub mod repository;
pub mod runner;
pub mod stash;

#[cfg(test)]
mod path_proptest;
