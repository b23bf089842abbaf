//! Working tree cleanup: `clean`, `distclean` and `remove_untracked`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::defaults::{CLEAN_DIRECTORIES, CLEAN_SUFFIXES, METADATA_DIRECTORIES};
use crate::error::Result;
use crate::prompt::{self, RemoveAnswer};
use crate::repository::Repository;

fn is_metadata_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| METADATA_DIRECTORIES.contains(&name))
}

fn has_clean_suffix(name: &str) -> bool {
    CLEAN_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Remove backup files, patch leftovers and Python caches.
pub fn clean(repo: &Repository) -> Result<()> {
    let mut walker = WalkDir::new(repo.root()).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if is_metadata_dir(&entry) {
            walker.skip_current_dir();
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_dir() {
            if CLEAN_DIRECTORIES.contains(&&*name) {
                println!("Remove directory: {}", repo.display_path(entry.path()).display());
                fs::remove_dir_all(entry.path())?;
                walker.skip_current_dir();
            }
        } else if has_clean_suffix(&name) {
            println!("Remove file: {}", repo.display_path(entry.path()).display());
            fs::remove_file(entry.path())?;
        }
    }
    repo.backend().clean(repo)
}

/// Tracked files plus every directory leading to them, as absolute paths.
fn tracked_paths(root: &Path, files: &[String]) -> HashSet<PathBuf> {
    let mut paths = HashSet::new();
    for file in files {
        let mut path = root.join(file);
        while path.as_path() != root {
            if !paths.insert(path.clone()) {
                break;
            }
            if !path.pop() {
                break;
            }
        }
    }
    paths
}

/// [`clean`], then list everything the backend does not track. Only with
/// `remove` is anything deleted.
pub fn distclean(repo: &Repository, remove: bool) -> Result<()> {
    clean(repo)?;
    let tracked = tracked_paths(repo.root(), &repo.backend().tracked_files(repo)?);
    let mut noop = true;
    let mut walker = WalkDir::new(repo.root()).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if is_metadata_dir(&entry) {
            walker.skip_current_dir();
            continue;
        }
        if tracked.contains(entry.path()) {
            continue;
        }
        noop = false;
        if entry.file_type().is_dir() {
            println!("Remove directory {}", entry.path().display());
            if remove {
                fs::remove_dir_all(entry.path())?;
            }
            walker.skip_current_dir();
        } else {
            println!("Remove file {}", entry.path().display());
            if remove {
                fs::remove_file(entry.path())?;
            }
        }
    }
    if !remove && !noop {
        println!();
        println!("Now pass the --remove option to really remove files");
    }
    Ok(())
}

fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Ask, file by file, whether untracked files should be removed.
pub fn remove_untracked(repo: &Repository) -> Result<()> {
    let mut remove_all = false;
    for path in repo.backend().untracked_files(repo)? {
        let display = repo.display_path(&path);
        if remove_all {
            println!("Remove {}", display.display());
            remove_path(&path)?;
            continue;
        }
        let question = format!("Remove untracked file: {} (y/a/N)?", display.display());
        let answer = prompt::ask(&question)?
            .map(|answer| RemoveAnswer::parse(&answer))
            .unwrap_or(RemoveAnswer::No);
        match answer {
            RemoveAnswer::All => {
                remove_all = true;
                remove_path(&path)?;
            }
            RemoveAnswer::Yes => remove_path(&path)?,
            RemoveAnswer::No => {}
        }
    }
    Ok(())
}
