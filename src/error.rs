//! # Error Handling
//!
//! This module defines the centralized error type for the `scm` tool. It uses
//! the `thiserror` library to describe every failure the orchestrator can run
//! into, from a malformed `scm_config` line to a wrapped `hg`/`git` process
//! exiting with a non-zero status.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`ConfigParse`, `ConfigNotFound`,
//!   `NoRepository`, `RecursiveParents`): always fatal and raised before any
//!   mutating action is attempted.
//! - **External tool failures** (`CommandFailed`, `ProgramNotFound`,
//!   `UnexpectedOutput`): a checked subprocess call failed. `CommandFailed`
//!   carries the child's exit code, which becomes the exit code of `scm`.
//! - **Protocol conflicts** (`StashExists`): a stash file is already on disk
//!   and must never be silently overwritten.
//! - **Declined confirmations** (`Declined`): the operator answered "no" to a
//!   destructive prompt. This is a clean abort, not a failure report.
//!
//! The [`Error::exit_code`] method maps each variant to the process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for scm operations
#[derive(Error, Debug)]
pub enum Error {
    /// A line of the configuration file could not be parsed.
    ///
    /// The whole run is aborted: no partial configuration is acted upon.
    #[error("Configuration parsing error in {}:{line}: {message}", path.display())]
    ConfigParse {
        path: PathBuf,
        /// 1-based line number
        line: usize,
        message: String,
    },

    /// A command requiring a configuration file was run without one.
    #[error("Unable to find {filename}")]
    ConfigNotFound { filename: String },

    /// Neither a configuration file nor a repository was found while walking
    /// up from the invocation directory.
    #[error("Unable to find a configuration file or to locate a repository in {}", directory.display())]
    NoRepository { directory: PathBuf },

    /// A directory reappeared while walking up the parent chain.
    #[error("Recursion in parent directories at {}", directory.display())]
    RecursiveParents { directory: PathBuf },

    /// The working set is empty.
    #[error("{message}")]
    NothingToDo { message: String },

    /// A required external program is not installed.
    #[error("Program not found: {program} (is it installed and on PATH?)")]
    ProgramNotFound { program: String },

    /// A checked external command exited with a non-zero status.
    #[error("Command failed with exit code {exit_code}: {command}")]
    CommandFailed { command: String, exit_code: i32 },

    /// An external command succeeded but printed something we cannot parse.
    #[error("Unexpected output from {command}: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    /// A stash file already exists for the repository.
    #[error("{} does already exist! Restore it with `scm unstash` or remove it", path.display())]
    StashExists { path: PathBuf },

    /// The remote URL of a repository is unknown.
    #[error("Don't know the URL of the repository {repository}")]
    MissingUrl { repository: String },

    /// The operator declined a confirmation prompt.
    #[error("Aborted")]
    Declined,

    /// Invalid combination of command-line arguments.
    #[error("{message}")]
    Usage { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A terminal dialog error, wrapped from `dialoguer::Error`.
    #[error("Prompt error: {0}")]
    Dialog(#[from] dialoguer::Error),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// The process exit code this error should produce.
    ///
    /// A failed external command propagates its own exit code verbatim.
    /// Everything else, including a declined confirmation, exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CommandFailed { exit_code, .. } if *exit_code != 0 => *exit_code,
            _ => 1,
        }
    }

    /// Whether the error should be reported to the operator.
    ///
    /// Declining a prompt is a clean abort and prints nothing.
    pub fn is_silent(&self) -> bool {
        matches!(self, Error::Declined)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
