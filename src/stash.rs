//! # Local-Change Protection
//!
//! `pull`, `push` and `histedit` must run against a clean working tree
//! without losing the operator's uncommitted edits. Before the operation the
//! local changes are saved to a [`StashRecord`] inside the metadata
//! directory and the tree is hard-reverted; afterwards the record is applied
//! back and removed.
//!
//! A record holds one patch per [`StashPatch`] the backend reports. Git
//! saves the index and the working tree separately so staged changes come
//! back staged; the working tree patch file also marks the record.
//!
//! ## Failure contract
//!
//! At most one record exists per repository. [`stash`] refuses to run when a
//! record is already present ([`Error::StashExists`]), so an unrestored
//! record is never overwritten.
//!
//! [`protect`] restores the changes when the operation returns normally,
//! including when it reports a non-zero exit code. When the operation fails
//! with an error the record stays on disk and `scm unstash` restores it.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::backend::StashPatch;
use crate::defaults::{STASH_FILENAME, STASH_INDEX_SUFFIX, SYNC_PROGRAM};
use crate::error::{Error, Result};
use crate::repository::Repository;
use crate::runner::{Check, Cmd, Echo};

/// The stash files of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashRecord {
    path: PathBuf,
    patches: &'static [StashPatch],
}

impl StashRecord {
    pub fn for_repository(repo: &Repository) -> Self {
        Self {
            path: repo.backend().metadata_dir().join(STASH_FILENAME),
            patches: repo.backend().stash_patches(),
        }
    }

    /// The file marking the record; it holds the working tree patch.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File holding one patch of the record.
    pub fn patch_path(&self, patch: StashPatch) -> PathBuf {
        match patch {
            StashPatch::WorkingTree => self.path.clone(),
            StashPatch::Staged => {
                let mut name = self.path.clone().into_os_string();
                name.push(STASH_INDEX_SUFFIX);
                PathBuf::from(name)
            }
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the file, failing if it already exists.
    fn create(&self) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => Error::StashExists {
                    path: self.path.clone(),
                },
                _ => Error::Io(err),
            })
    }

    /// Patches holding changes, in the order they are applied back.
    fn saved_patches(&self) -> Result<Vec<StashPatch>> {
        let mut saved = Vec::new();
        for &patch in self.patches {
            match fs::metadata(self.patch_path(patch)) {
                Ok(metadata) if metadata.len() > 0 => saved.push(patch),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Ok(saved)
    }

    /// Remove every file of the record, the marker last.
    fn remove(&self) -> Result<()> {
        for &patch in self.patches {
            if patch != StashPatch::WorkingTree {
                remove_if_exists(&self.patch_path(patch))?;
            }
        }
        fs::remove_file(&self.path)?;
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(Error::Io(err)),
        _ => Ok(()),
    }
}

/// Write one patch of the local changes to its record file.
fn save_patch(repo: &Repository, record: &StashRecord, patch: StashPatch) -> Result<()> {
    let path = record.patch_path(patch);
    let file = File::create(&path)?;
    let cmd = repo
        .backend()
        .stash_diff(repo, patch)
        .stdout_file(file)
        .suffix(format!(" > {} # stash", path.display()));
    repo.runner().run(cmd, Echo::Trace, Check::Fail)?;
    Ok(())
}

/// Flush filesystem buffers before and after rewriting the working tree.
fn sync(repo: &Repository) -> Result<()> {
    repo.runner()
        .run(Cmd::new(SYNC_PROGRAM), Echo::Quiet, Check::Fail)?;
    Ok(())
}

/// Save local changes and revert the working tree.
///
/// Returns `false` (and leaves no record behind) when there was nothing to
/// save.
pub fn stash(repo: &Repository, verbose: bool) -> Result<bool> {
    let record = StashRecord::for_repository(repo);
    drop(record.create()?);
    let saved = record
        .patches
        .iter()
        .try_for_each(|&patch| save_patch(repo, &record, patch));
    if let Err(err) = saved {
        let _ = record.remove();
        return Err(err);
    }
    if record.saved_patches()?.is_empty() {
        if verbose {
            println!("No local change");
        }
        record.remove()?;
        return Ok(false);
    }
    sync(repo)?;
    repo.backend().revert_all(repo)?;
    info!("{}: local changes saved to {}", repo, record.path().display());
    Ok(true)
}

/// Apply and remove the stash record.
///
/// Returns `false` when there is no record.
pub fn unstash(repo: &Repository, verbose: bool) -> Result<bool> {
    let record = StashRecord::for_repository(repo);
    if !record.exists() {
        println!("No stash file has been found: {}", record.path().display());
        return Ok(false);
    }
    for patch in record.saved_patches()? {
        let path = record.patch_path(patch);
        let cmd = repo
            .backend()
            .apply_patch(repo, patch)
            .stdin_file(File::open(&path)?)
            .suffix(format!(" < {} # unstash", path.display()));
        repo.runner().run(cmd, Echo::Trace, Check::Fail)?;
        // an applied patch must not be applied again by a later unstash
        if patch != StashPatch::WorkingTree {
            fs::remove_file(&path)?;
        }
    }
    sync(repo)?;
    record.remove()?;
    if verbose {
        println!("Local changes restored.");
    }
    Ok(true)
}

/// Local changes set aside for the lifetime of the guard.
///
/// [`StashGuard::release`] restores them. A guard dropped without release
/// leaves the record on disk and says so.
#[must_use = "call release() to restore the local changes"]
#[derive(Debug)]
pub struct StashGuard<'a> {
    repo: &'a Repository,
    stashed: bool,
    released: bool,
}

impl<'a> StashGuard<'a> {
    pub fn acquire(repo: &'a Repository) -> Result<Self> {
        let stashed = stash(repo, false)?;
        Ok(Self {
            repo,
            stashed,
            released: false,
        })
    }

    /// Restore the saved changes, if any.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        if self.stashed {
            unstash(self.repo, false)
        } else {
            Ok(false)
        }
    }
}

impl Drop for StashGuard<'_> {
    fn drop(&mut self) {
        if self.stashed && !self.released {
            warn!(
                "{}: local changes were left in {}; run `scm unstash` to restore them",
                self.repo,
                StashRecord::for_repository(self.repo).path().display()
            );
        }
    }
}

/// Run `op` with the local changes of `repo` set aside.
pub fn protect<T, F>(repo: &Repository, op: F) -> Result<T>
where
    F: FnOnce(&Repository) -> Result<T>,
{
    let guard = StashGuard::acquire(repo)?;
    let value = op(repo)?;
    guard.release()?;
    Ok(value)
}
