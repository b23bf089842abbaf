//! # Repository Discovery
//!
//! Builds the working set a command operates on.
//!
//! 1.  **Declarative (`setup`)**: an `scm_config` file in the invocation
//!     directory, or the first one found walking upward, lists the
//!     repositories. When found above the invocation directory the entries
//!     are filtered to the ones relevant to it (see
//!     [`config::filter_entries`]).
//!
//! 2.  **Upward search**: without a configuration file, the first directory
//!     on the way up that is itself a repository root becomes the only
//!     member of the working set. Single-repository commands always use
//!     this mode (`setup_local`).
//!
//! 3.  **Downward scan (`scan`)**: walk down from the invocation directory
//!     collecting repository roots without entering them. Used to generate
//!     a configuration file.
//!
//! The upward walk never checks the filesystem root itself and fails with
//! [`Error::RecursiveParents`] if a directory shows up twice, so a symlink
//! cycle cannot make it loop.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{info, warn};
use walkdir::WalkDir;

use crate::backend::Vcs;
use crate::config::{self, ConfigEntry};
use crate::context::Context;
use crate::defaults::{CONFIG_FILENAME, METADATA_DIRECTORIES};
use crate::error::{Error, Result};
use crate::path::{clean, common_prefix, relative_path};
use crate::repository::Repository;

/// The repositories a command operates on.
#[derive(Debug)]
pub struct WorkingSet {
    repositories: Vec<Repository>,
    from_config: bool,
}

impl WorkingSet {
    pub fn new(repositories: Vec<Repository>, from_config: bool) -> Self {
        Self {
            repositories,
            from_config,
        }
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// True when the set was read from a configuration file.
    pub fn from_config(&self) -> bool {
        self.from_config
    }

    /// The repository of a single-repository working set.
    pub fn single(&self) -> Result<&Repository> {
        match self.repositories.as_slice() {
            [repo] => Ok(repo),
            _ => Err(Error::Usage {
                message: format!(
                    "this command works on one repository, not {}",
                    self.repositories.len()
                ),
            }),
        }
    }

    /// True when exactly one repository of the set exists on disk.
    pub fn only_one_existing(&self) -> bool {
        self.repositories.iter().filter(|repo| repo.exists()).count() == 1
    }

    /// Print the `Processing ...` banner of the cleanup commands.
    pub fn print_processing(&self) {
        if self.from_config {
            println!("Processing {} repositories", self.repositories.len());
        } else if let Some(repo) = self.repositories.first() {
            println!("Processing {}", repo);
        }
    }
}

/// What the upward walk stopped at.
#[derive(Debug)]
enum Found {
    Config(PathBuf),
    Repository(PathBuf, Vcs),
}

/// Walk from `start` towards the filesystem root, returning the first value
/// `probe` produces.
///
/// `parent` resolves the next directory. The filesystem root is never
/// probed. A directory seen twice is an error.
pub fn walk_upward<T, P, F>(start: &Path, mut parent: P, mut probe: F) -> Result<Option<T>>
where
    P: FnMut(&Path) -> Option<PathBuf>,
    F: FnMut(&Path) -> Option<T>,
{
    let mut seen = HashSet::new();
    let mut directory = start.to_path_buf();
    loop {
        if directory.parent().is_none() {
            return Ok(None);
        }
        if !seen.insert(directory.clone()) {
            return Err(Error::RecursiveParents { directory });
        }
        if let Some(found) = probe(&directory) {
            return Ok(Some(found));
        }
        match parent(&directory) {
            Some(next) => directory = next,
            None => return Ok(None),
        }
    }
}

/// Parent directory with symbolic links resolved.
pub fn physical_parent(directory: &Path) -> Option<PathBuf> {
    directory
        .join("..")
        .canonicalize()
        .ok()
        .or_else(|| directory.parent().map(Path::to_path_buf))
}

fn probe_config_or_repository(directory: &Path) -> Option<Found> {
    if directory.join(CONFIG_FILENAME).is_file() {
        return Some(Found::Config(directory.to_path_buf()));
    }
    Vcs::detect(directory).map(|vcs| Found::Repository(directory.to_path_buf(), vcs))
}

/// Load the configuration file of `config_dir`, keeping the entries
/// relevant to the invocation directory.
fn read_config(ctx: &Rc<Context>, config_dir: &Path) -> Result<WorkingSet> {
    let path = config_dir.join(CONFIG_FILENAME);
    let filter = relative_path(ctx.start_dir(), config_dir);
    let entries = config::from_file(&path, Some(&filter))?;
    info!(
        "read {} ({} repositories in scope)",
        path.display(),
        entries.len()
    );
    if entries.is_empty() {
        return Err(Error::NothingToDo {
            message: "No repository configured: nothing to do, exit".to_string(),
        });
    }
    let repositories = entries
        .iter()
        .map(|entry| Repository::from_entry(ctx.clone(), ctx.start_dir(), entry))
        .collect();
    Ok(WorkingSet::new(repositories, true))
}

/// Working set for fan-out commands.
///
/// With `need_config`, finding a bare repository instead of a configuration
/// file is an error.
pub fn setup(ctx: &Rc<Context>, need_config: bool) -> Result<WorkingSet> {
    let found = walk_upward(ctx.start_dir(), physical_parent, probe_config_or_repository)?;
    match found {
        Some(Found::Config(directory)) => read_config(ctx, &directory),
        Some(Found::Repository(root, vcs)) if !need_config => {
            let repo = Repository::new(ctx.clone(), root, vcs, None);
            Ok(WorkingSet::new(vec![repo], false))
        }
        _ if need_config => Err(Error::ConfigNotFound {
            filename: CONFIG_FILENAME.to_string(),
        }),
        _ => Err(Error::NoRepository {
            directory: ctx.start_dir().to_path_buf(),
        }),
    }
}

/// Working set of the one repository containing the invocation directory,
/// or containing the common prefix of the file arguments in `args`.
pub fn setup_local(ctx: &Rc<Context>, args: &[String]) -> Result<WorkingSet> {
    let paths = args.iter().filter(|arg| !arg.starts_with('-'));
    let start = match common_prefix(paths) {
        Some(prefix) => {
            let joined = clean(&ctx.start_dir().join(prefix));
            joined.canonicalize().unwrap_or(joined)
        }
        None => ctx.start_dir().to_path_buf(),
    };
    let found = walk_upward(&start, physical_parent, |directory| {
        Vcs::detect(directory).map(|vcs| (directory.to_path_buf(), vcs))
    })?;
    match found {
        Some((root, vcs)) => {
            let repo = Repository::new(ctx.clone(), root, vcs, None);
            Ok(WorkingSet::new(vec![repo], false))
        }
        None => Err(Error::NoRepository {
            directory: ctx.start_dir().to_path_buf(),
        }),
    }
}

/// Outcome of a downward scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Repositories with a known URL, in directory order.
    pub repositories: Vec<Repository>,
    /// Repositories skipped because their URL is unknown.
    pub ignored: usize,
}

impl ScanReport {
    /// Configuration entries for the repositories found, relative to the
    /// scan directory.
    pub fn entries(&self) -> Vec<ConfigEntry> {
        self.repositories
            .iter()
            .filter_map(|repo| {
                Some(ConfigEntry {
                    directory: repo
                        .offset()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(".")),
                    kind: repo.kind(),
                    url: repo.url()?,
                })
            })
            .collect()
    }
}

/// Collect the repositories below the invocation directory.
///
/// Repository roots are not entered, so nested checkouts are not reported.
pub fn scan(ctx: &Rc<Context>) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    let mut walker = WalkDir::new(ctx.start_dir())
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to browse directory: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let is_metadata = entry
            .file_name()
            .to_str()
            .is_some_and(|name| METADATA_DIRECTORIES.contains(&name));
        if is_metadata {
            walker.skip_current_dir();
            continue;
        }
        let Some(repo) = Repository::detect(ctx.clone(), entry.path()) else {
            continue;
        };
        walker.skip_current_dir();
        if repo.url().is_some() {
            eprintln!("-> {}", repo);
            report.repositories.push(repo);
        } else {
            warn!("IGNORE: {} (unable to get the parent)", repo);
            report.ignored += 1;
        }
    }
    Ok(report)
}
