//! Path manipulation utilities for scm
//!
//! Repositories are reported relative to the directory `scm` was started
//! from, so most output goes through one of the helpers below: lexical
//! relative paths, component-wise common prefixes and the ANSI-aware
//! relocation of `grep` match lines.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// `(leading escapes)(bare text)(trailing escapes)`
static ANSI_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    let escape = r"(?:\x1b\[[0-9;]*[a-zA-Z])*";
    Regex::new(&format!("^({escape})(.*?)({escape})$")).expect("valid ANSI regex")
});

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component when there is one.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Compute `path` relative to `base`, inserting `..` components as needed.
///
/// Both paths are normalized lexically first; they are expected to be both
/// absolute or both relative to the same directory. Returns `.` when they
/// are equal.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path = clean(path);
    let base = clean(base);
    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for part in &base_parts[common..] {
        if !matches!(part, Component::CurDir) {
            result.push("..");
        }
    }
    for part in &path_parts[common..] {
        if !matches!(part, Component::CurDir) {
            result.push(part.as_os_str());
        }
    }
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Component-wise longest common prefix of a set of relative paths.
///
/// Returns `None` when the set is empty or shares no leading component.
pub fn common_prefix<I, P>(paths: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut iter = paths.into_iter();
    let first = iter.next()?;
    let mut prefix: Vec<Component> = first.as_ref().components().collect();
    for path in iter {
        let common = prefix
            .iter()
            .zip(path.as_ref().components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(common);
    }
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.iter().collect())
    }
}

/// Split text into its leading ANSI escapes, the bare text and the trailing
/// escapes.
pub fn split_ansi_colors(text: &str) -> (&str, &str, &str) {
    match ANSI_SPAN.captures(text) {
        Some(caps) => {
            let get = |i: usize| caps.get(i).map_or("", |m| m.as_str());
            (get(1), get(2), get(3))
        }
        None => ("", text, ""),
    }
}

/// Rewrite the leading file name of a `grep -H` match line so that it is
/// relative to the invocation directory.
///
/// `offset` is the repository root relative to the invocation directory.
/// Color escapes around the file name stay where they were. Lines without a
/// `:` separator are returned unchanged.
pub fn relocate_grep_line(line: &str, offset: &Path) -> String {
    let Some((head, rest)) = line.split_once(':') else {
        return line.to_string();
    };
    let (prefix, name, suffix) = split_ansi_colors(head);
    let relocated = clean(&offset.join(name));
    format!("{}{}{}:{}", prefix, relocated.display(), suffix, rest)
}

/// Apply [`relocate_grep_line`] to every line of a `grep` output.
pub fn relocate_grep_output(output: &str, offset: &Path) -> String {
    output
        .lines()
        .map(|line| relocate_grep_line(line, offset))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite the file name of a status line whose name starts at byte `pos`.
///
/// Lines too short to carry a name are returned unchanged.
pub fn relocate_status_line(line: &str, pos: usize, offset: &Path) -> String {
    if line.len() <= pos || !line.is_char_boundary(pos) {
        return line.to_string();
    }
    let (status, name) = line.split_at(pos);
    format!("{}{}", status, clean(&offset.join(name)).display())
}

/// Whether a repository URL points at the local filesystem.
///
/// Anything with a URL scheme (`https://`, `ssh://`, `file://`) or in the
/// scp-like `host:path` form is remote.
pub fn is_local_url(url: &str) -> bool {
    if url::Url::parse(url).is_ok_and(|parsed| parsed.scheme().len() > 1) {
        return false;
    }
    match url.split_once(':') {
        Some((host, _)) => host.contains('/'),
        None => true,
    }
}

/// Resolve a clone URL for a repository about to be created at `root`.
///
/// Relative filesystem paths are resolved against `root`; other URLs are
/// returned unchanged.
pub fn resolve_clone_url(url: &str, root: &Path) -> String {
    if is_local_url(url) && Path::new(url).is_relative() {
        clean(&root.join(url)).display().to_string()
    } else {
        url.to_string()
    }
}
