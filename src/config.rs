//! # Configuration File Parsing
//!
//! The `scm_config` file lists the repositories of a multi-repository tree,
//! one per line:
//!
//! ```text
//! # Format: "directory: scm=url"
//! lib/foo: git=https://example.com/foo.git
//! tools: hg=ssh://hg@example.com/tools
//! ```
//!
//! Directories are relative to the configuration file. Everything after a
//! `#` is a comment, blank lines are ignored, and any malformed line is a
//! hard error: a partially understood configuration is never acted upon.
//!
//! When the file is found by walking up from a subdirectory, the entries are
//! filtered by the offset between the file and the invocation directory (see
//! [`filter_entries`]) so that commands only touch the repositories at or
//! below the current directory.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// The version control tool behind a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Mercurial,
    Git,
}

impl BackendKind {
    /// Name used in the configuration file and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mercurial => "hg",
            BackendKind::Git => "git",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hg" => Ok(BackendKind::Mercurial),
            "git" => Ok(BackendKind::Git),
            other => Err(format!("unknown repository kind '{}' (expected hg or git)", other)),
        }
    }
}

/// One `directory: kind=url` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Repository directory, relative to the directory the entries are
    /// resolved against.
    pub directory: PathBuf,
    pub kind: BackendKind,
    pub url: String,
}

impl fmt::Display for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}={}", self.directory.display(), self.kind, self.url)
    }
}

/// Parse a single non-empty, comment-free line.
pub fn parse_line(line: &str) -> std::result::Result<ConfigEntry, String> {
    let (directory, data) = line
        .split_once(':')
        .ok_or_else(|| "missing ':' after the directory".to_string())?;
    let directory = directory.trim();
    if directory.is_empty() {
        return Err("empty directory".to_string());
    }
    let (kind, url) = data
        .trim_start()
        .split_once('=')
        .ok_or_else(|| "missing '=' between the repository kind and the URL".to_string())?;
    let kind: BackendKind = kind.trim().parse()?;
    let url = url.trim();
    if url.is_empty() {
        return Err("empty URL".to_string());
    }
    Ok(ConfigEntry {
        directory: PathBuf::from(directory),
        kind,
        url: url.to_string(),
    })
}

/// Parse the content of a configuration file.
///
/// `path` is only used in error messages.
pub fn parse(content: &str, path: &Path) -> Result<Vec<ConfigEntry>> {
    let mut entries = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let entry = parse_line(line).map_err(|message| Error::ConfigParse {
            path: path.to_path_buf(),
            line: index + 1,
            message: format!("{} in {:?}", message, raw),
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Keep the entries relevant to an invocation directory located at `filter`
/// relative to the configuration file.
///
/// Entries at or below `filter` are kept and rebased so that their directory
/// is relative to the invocation directory. The entry containing `filter`
/// (the invocation directory is inside that repository) is kept as well,
/// rebased with `..` components. Everything else is dropped.
pub fn filter_entries(entries: Vec<ConfigEntry>, filter: &Path) -> Vec<ConfigEntry> {
    let filter = crate::path::clean(filter);
    if filter == Path::new(".") {
        return entries;
    }
    entries
        .into_iter()
        .filter_map(|mut entry| {
            let directory = crate::path::clean(&entry.directory);
            if let Ok(rest) = directory.strip_prefix(&filter) {
                entry.directory = if rest.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    rest.to_path_buf()
                };
                return Some(entry);
            }
            let contains_filter =
                directory == Path::new(".") || filter.starts_with(&directory);
            if contains_filter && !is_parent_reference(&directory) {
                entry.directory = crate::path::relative_path(&directory, &filter);
                return Some(entry);
            }
            None
        })
        .collect()
}

fn is_parent_reference(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::ParentDir))
}

/// Read and parse a configuration file, optionally filtered.
pub fn from_file(path: &Path, filter: Option<&Path>) -> Result<Vec<ConfigEntry>> {
    let content = fs::read_to_string(path)?;
    let entries = parse(&content, path)?;
    Ok(match filter {
        Some(filter) => filter_entries(entries, filter),
        None => entries,
    })
}

/// Render entries as a configuration file, sorted by directory.
pub fn render(entries: &[ConfigEntry]) -> String {
    let mut sorted: Vec<&ConfigEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.directory.cmp(&b.directory));
    let mut text = String::from(crate::defaults::CONFIG_HEADER);
    text.push('\n');
    for entry in sorted {
        text.push_str(&entry.to_string());
        text.push('\n');
    }
    text
}
