//! Git backend.
//!
//! Every command runs as `git --git-dir GITDIR ...` from the repository
//! root, so worktrees and submodules whose `.git` is a `gitdir:` file work
//! the same way as plain clones.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{is_ignored_untracked, read_ini, Backend, StashPatch};
use crate::config::BackendKind;
use crate::defaults::GIT_PROGRAM;
use crate::error::{Error, Result};
use crate::output;
use crate::repository::Repository;
use crate::runner::{Check, Cmd, Echo};

/// Byte offset of the file name in `git status --porcelain` lines.
const PORCELAIN_NAME: usize = 3;

#[derive(Debug, Clone)]
pub struct Git {
    gitdir: PathBuf,
}

impl Git {
    pub fn at(root: &Path) -> Self {
        Self {
            gitdir: root.join(".git"),
        }
    }

    /// Recognize a Git working tree. The metadata directory must hold an
    /// index; a freshly initialized repository without one is skipped.
    pub fn detect(directory: &Path) -> Option<Self> {
        let dotgit = directory.join(".git");
        let gitdir = if dotgit.is_file() {
            read_gitdir_file(&dotgit, directory)?
        } else {
            dotgit
        };
        if gitdir.join("index").exists() {
            Some(Self { gitdir })
        } else {
            None
        }
    }

    fn git(&self, repo: &Repository) -> Cmd {
        Cmd::new(GIT_PROGRAM)
            .arg("--git-dir")
            .arg(self.gitdir.display().to_string())
            .current_dir(repo.root())
    }

    /// `git status --porcelain -z`, which keeps file names unquoted.
    fn porcelain(&self, repo: &Repository, paths: &[String]) -> Result<Vec<StatusEntry>> {
        let output = repo.runner().output(
            self.git(repo)
                .args(["status", "--porcelain", "-z"])
                .args(paths.iter().cloned()),
        )?;
        Ok(parse_porcelain(&output))
    }

    fn pull_command(&self, repo: &Repository) -> Cmd {
        let mut cmd = self.git(repo).args(["pull", "--rebase"]);
        if repo.verbose() {
            cmd = cmd.arg("--verbose");
        }
        cmd.suffix(format!(" # {}", repo.url().unwrap_or_default()))
    }
}

/// Resolve the `gitdir: PATH` line of a `.git` file. Relative paths are
/// relative to the working tree.
fn read_gitdir_file(dotgit: &Path, directory: &Path) -> Option<PathBuf> {
    let content = match fs::read_to_string(dotgit) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("Fail to read {}: {}", dotgit.display(), err);
            return None;
        }
    };
    let target = content.lines().next()?.trim_end().strip_prefix("gitdir: ")?;
    Some(crate::path::clean(&directory.join(target)))
}

/// One entry of `git status --porcelain -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusEntry {
    code: String,
    path: String,
    /// Source of a rename or copy.
    origin: Option<String>,
}

impl StatusEntry {
    fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    /// The entry in `git status --porcelain` line form.
    fn line(&self) -> String {
        match &self.origin {
            Some(origin) => format!("{} {} -> {}", self.code, origin, self.path),
            None => format!("{} {}", self.code, self.path),
        }
    }
}

/// Split NUL-terminated porcelain output. Renames and copies carry their
/// source as the next field.
fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0').filter(|field| !field.is_empty());
    while let Some(field) = fields.next() {
        let (Some(code), Some(path)) = (field.get(..2), field.get(PORCELAIN_NAME..)) else {
            continue;
        };
        let origin = if code.contains(['R', 'C']) {
            fields.next().map(str::to_string)
        } else {
            None
        };
        entries.push(StatusEntry {
            code: code.to_string(),
            path: path.to_string(),
            origin,
        });
    }
    entries
}

/// Drop ignorable untracked entries and relocate names by `offset`.
fn process_status(entries: &[StatusEntry], offset: Option<&Path>, verbose: bool) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| verbose || !(entry.is_untracked() && is_ignored_untracked(&entry.path)))
        .map(|entry| {
            let line = entry.line();
            match offset {
                Some(offset) => crate::path::relocate_status_line(&line, PORCELAIN_NAME, offset),
                None => line,
            }
        })
        .collect()
}

/// Map commits to the tags pointing at them, from `git for-each-ref` lines
/// of the form `OBJECT [PEELED] REFNAME`. Annotated tags are peeled to their
/// commit.
fn parse_tag_refs(output: &str) -> HashMap<String, Vec<String>> {
    let mut tags: HashMap<String, Vec<String>> = HashMap::new();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (commit, refname) = match fields.as_slice() {
            [object, refname] => (*object, *refname),
            [_, peeled, refname] => (*peeled, *refname),
            _ => continue,
        };
        let name = refname.strip_prefix("refs/tags/").unwrap_or(refname);
        tags.entry(commit.to_string())
            .or_default()
            .push(name.to_string());
    }
    tags
}

/// Name of the branch marked with `* ` in `git branch` output.
fn parse_current_branch(output: &str) -> Option<&str> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("* "))
        .filter(|branch| !branch.is_empty())
}

impl Backend for Git {
    fn kind(&self) -> BackendKind {
        BackendKind::Git
    }

    fn metadata_dir(&self) -> &Path {
        &self.gitdir
    }

    fn remote_url(&self) -> Option<String> {
        let config = read_ini(&self.gitdir.join("config"))?;
        config
            .get_from(Some("remote \"origin\""), "url")
            .map(str::to_string)
    }

    fn has_local_changes(&self, repo: &Repository) -> Result<bool> {
        Ok(self
            .porcelain(repo, &[])?
            .iter()
            .any(|entry| !entry.is_untracked()))
    }

    fn modified_files(&self, repo: &Repository) -> Result<Vec<String>> {
        Ok(self
            .porcelain(repo, &[])?
            .into_iter()
            .filter(|entry| !entry.is_untracked())
            .map(|entry| entry.path)
            .collect())
    }

    fn untracked_files(&self, repo: &Repository) -> Result<Vec<PathBuf>> {
        Ok(self
            .porcelain(repo, &[])?
            .into_iter()
            .filter(StatusEntry::is_untracked)
            .map(|entry| repo.root().join(entry.path))
            .collect())
    }

    fn tracked_files(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo
            .runner()
            .output(self.git(repo).args(["ls-files", "-z"]))?;
        Ok(output
            .split('\0')
            .filter(|name| !name.is_empty() && repo.root().join(name).exists())
            .map(str::to_string)
            .collect())
    }

    fn status(&self, repo: &Repository, paths: &[String]) -> Result<Vec<String>> {
        let paths = repo.relative_args(paths);
        let entries = self.porcelain(repo, &paths)?;
        Ok(process_status(&entries, repo.offset(), repo.verbose()))
    }

    fn diff(&self, repo: &Repository, paths: &[String]) -> Result<()> {
        let cmd = self
            .git(repo)
            .arg("diff")
            .args(repo.relative_args(paths));
        let echo = if repo.verbose() { Echo::Trace } else { Echo::Quiet };
        repo.runner().run(cmd, echo, Check::Fail)?;
        Ok(())
    }

    fn stash_patches(&self) -> &'static [StashPatch] {
        &[StashPatch::Staged, StashPatch::WorkingTree]
    }

    fn stash_diff(&self, repo: &Repository, patch: StashPatch) -> Cmd {
        let cmd = self
            .git(repo)
            .args(["diff", "--no-color", "--no-ext-diff", "--binary"]);
        match patch {
            StashPatch::Staged => cmd.arg("--cached"),
            StashPatch::WorkingTree => cmd,
        }
    }

    fn apply_patch(&self, repo: &Repository, patch: StashPatch) -> Cmd {
        let cmd = self.git(repo).arg("apply");
        match patch {
            StashPatch::Staged => cmd.args(["--index", "--binary"]),
            StashPatch::WorkingTree => cmd.arg("--binary"),
        }
    }

    fn revert_all(&self, repo: &Repository) -> Result<()> {
        repo.runner().run(
            self.git(repo).args(["reset", "--hard", "--quiet"]),
            Echo::Trace,
            Check::Fail,
        )?;
        Ok(())
    }

    fn revert(&self, repo: &Repository, paths: &[String]) -> Result<()> {
        let runner = repo.runner();
        if paths.is_empty() {
            runner.run(
                self.git(repo).args(["reset", "--hard"]),
                Echo::Title(repo.name()),
                Check::Fail,
            )?;
            return Ok(());
        }
        output::print_title(
            repo.name(),
            &format!("Revert {}", shell_words::join(paths)),
        );
        let paths = repo.relative_args(paths);
        // unstage first; fails harmlessly on files that were never staged
        runner.run(
            self.git(repo)
                .args(["reset", "--quiet", "HEAD", "--"])
                .args(paths.iter().cloned()),
            Echo::Trace,
            Check::Ignore,
        )?;
        runner.run(
            self.git(repo).args(["checkout", "--"]).args(paths),
            Echo::Trace,
            Check::Fail,
        )?;
        Ok(())
    }

    fn pull(&self, repo: &Repository) -> Result<()> {
        repo.runner()
            .run(self.pull_command(repo), Echo::Trace, Check::Fail)?;
        Ok(())
    }

    fn push(&self, repo: &Repository) -> Result<()> {
        repo.runner()
            .run(self.git(repo).arg("push"), Echo::Trace, Check::Fail)?;
        Ok(())
    }

    fn clone_from(&self, repo: &Repository, url: &str) -> Result<()> {
        let parent = repo.root().parent().unwrap_or(repo.root());
        fs::create_dir_all(parent)?;
        let cmd = Cmd::new(GIT_PROGRAM)
            .arg("clone")
            .arg(url)
            .arg(repo.root().display().to_string())
            .current_dir(parent);
        repo.runner().run(cmd, Echo::Title(repo.name()), Check::Fail)?;
        Ok(())
    }

    fn histedit(&self, repo: &Repository, revision: &str) -> Result<i32> {
        repo.runner().run(
            self.git(repo).args(["rebase", "-i", revision]),
            Echo::Trace,
            Check::Ignore,
        )
    }

    fn commit(&self, repo: &Repository, args: &[String]) -> Result<i32> {
        repo.runner().run(
            self.git(repo)
                .args(["commit", "-v", "--untracked-files=no"])
                .args(repo.relative_args(args)),
            Echo::Quiet,
            Check::Ignore,
        )
    }

    fn add(&self, repo: &Repository, args: &[String]) -> Result<()> {
        repo.runner().run(
            self.git(repo).arg("add").args(repo.relative_args(args)),
            Echo::Trace,
            Check::Fail,
        )?;
        Ok(())
    }

    fn branch(&self, repo: &Repository) -> Result<String> {
        let cmd = self.git(repo).arg("branch");
        let command = cmd.display();
        let output = repo.runner().output(cmd)?;
        match parse_current_branch(&output) {
            Some(branch) => Ok(branch.to_string()),
            None => Err(Error::UnexpectedOutput { command, output }),
        }
    }

    fn list_branches(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo.runner().output(self.git(repo).args(["branch", "-l"]))?;
        Ok(output.lines().map(str::to_string).collect())
    }

    fn list_tags(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo.runner().output(self.git(repo).args(["tag", "-l"]))?;
        Ok(output.lines().map(str::to_string).collect())
    }

    fn tag_contains(&self, repo: &Repository, revision: &str) -> Result<Vec<String>> {
        let runner = repo.runner();
        let commit = runner.output(
            self.git(repo)
                .args(["rev-parse", "--verify"])
                .arg(format!("{}^{{commit}}", revision)),
        )?;
        let commit = commit.trim().to_string();
        let mut tags = parse_tag_refs(&runner.output(self.git(repo).args([
            "for-each-ref",
            "--format=%(objectname) %(*objectname) %(refname)",
            "refs/tags",
        ]))?);
        if tags.is_empty() {
            return Ok(Vec::new());
        }
        // descendants of the revision reachable from a tag, parents first
        let descendants = runner.output(
            self.git(repo)
                .args(["rev-list", "--topo-order", "--reverse", "--ancestry-path", "--tags"])
                .arg(format!("^{}", commit)),
        )?;
        let mut found = Vec::new();
        for sha in std::iter::once(commit.as_str()).chain(descendants.lines().map(str::trim)) {
            if let Some(names) = tags.remove(sha) {
                found.extend(names);
            }
        }
        Ok(found)
    }

    fn outgoing(&self, repo: &Repository, display_if_empty: bool) -> Result<i32> {
        let color = format!("--color={}", repo.color_arg());
        let cmd = self.git(repo).args([
            "log",
            "@{upstream}..",
            "--pretty=format:%Cred%h%Creset %s",
            color.as_str(),
        ]);
        if display_if_empty {
            output::print_title(repo.name(), "Output commits");
            return repo.runner().run(cmd, Echo::Quiet, Check::Ignore);
        }
        let command = cmd.display();
        let result = repo.runner().capture(cmd)?;
        if !result.success() {
            output::print_command_output(&command, &result.combined());
        } else if !result.stdout.trim().is_empty() {
            output::print_title(repo.name(), "Output commits");
            output::print_command_output(&command, &result.stdout);
        }
        Ok(result.exit_code)
    }

    fn info(&self, repo: &Repository) -> Result<Vec<String>> {
        Ok(vec![format!("branch = {}", self.branch(repo)?)])
    }
}
