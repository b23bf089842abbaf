//! # Batch Execution
//!
//! Applies an operation to every repository of a working set, one at a
//! time, and folds the outcomes into a single process exit code.
//!
//! - Read-only fan-out ([`existing`]) skips repositories missing on disk
//!   with a warning.
//! - Tolerant fan-out ([`apply_tolerant`], used by `pull`) keeps going after
//!   a failure and reports the failed repositories at the end.
//!
//! The exit code is threaded through a [`BatchStatus`] value and returned;
//! the first non-zero code wins.

use log::{error, warn};

use crate::discovery::WorkingSet;
use crate::error::Result;
use crate::repository::Repository;

/// Aggregated exit code of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStatus {
    code: i32,
}

impl BatchStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one exit code. The first non-zero code is kept.
    pub fn record(&mut self, code: i32) {
        if self.code == 0 {
            self.code = code;
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

/// Repositories of the set that exist on disk. Each missing one is reported.
pub fn existing(set: &WorkingSet) -> impl Iterator<Item = &Repository> {
    set.repositories().iter().filter(|repo| {
        let exists = repo.exists();
        if !exists {
            warn!("{} is missing", repo.name());
        }
        exists
    })
}

/// Outcome of a tolerant batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub status: BatchStatus,
    /// Display names of the repositories that failed, in order.
    pub failed: Vec<String>,
}

impl BatchReport {
    /// `Failed to pull: NAME` style summary lines.
    pub fn summary(&self, action: &str) -> Vec<String> {
        self.failed
            .iter()
            .map(|name| format!("Failed to {}: {}", action, name))
            .collect()
    }
}

/// Run `op` on every repository, continuing after failures.
pub fn apply_tolerant<'a, I, F>(repositories: I, mut op: F) -> BatchReport
where
    I: IntoIterator<Item = &'a Repository>,
    F: FnMut(&Repository) -> Result<()>,
{
    let mut report = BatchReport::default();
    for repo in repositories {
        if let Err(err) = op(repo) {
            if !err.is_silent() {
                error!("{}: {}", repo, err);
            }
            report.status.record(err.exit_code());
            report.failed.push(repo.to_string());
        }
    }
    report
}

/// Pull every repository, cloning the missing ones.
pub fn pull_all(set: &WorkingSet) -> BatchReport {
    let report = apply_tolerant(set.repositories(), |repo| {
        if repo.exists() {
            repo.pull()
        } else {
            repo.clone_repository()
        }
    });
    for line in report.summary("pull") {
        println!("{}", line);
    }
    report
}
