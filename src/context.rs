//! Per-invocation settings shared by every repository handle.

use std::path::{Path, PathBuf};

use crate::output::OutputConfig;
use crate::runner::Runner;

/// Settings fixed for one `scm` invocation.
#[derive(Debug, Clone)]
pub struct Context {
    start_dir: PathBuf,
    verbose: bool,
    runner: Runner,
    output: OutputConfig,
}

impl Context {
    /// `start_dir` should be canonical; repository names and every relocated
    /// path are computed relative to it.
    pub fn new(start_dir: PathBuf, verbose: bool, output: OutputConfig) -> Self {
        Self {
            start_dir,
            verbose,
            runner: Runner::new(),
            output,
        }
    }

    /// Context for the current directory.
    pub fn from_current_dir(verbose: bool, output: OutputConfig) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?.canonicalize()?;
        Ok(Self::new(cwd, verbose, output))
    }

    pub fn start_dir(&self) -> &Path {
        &self.start_dir
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}
