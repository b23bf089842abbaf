//! Mercurial backend.
//!
//! Commands run from the repository root unless they take file arguments
//! typed by the operator, which are resolved from the invocation directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::{is_ignored_untracked, read_ini, Backend, StashPatch};
use crate::config::BackendKind;
use crate::defaults::{HG_PROGRAM, PATCH_PROGRAM};
use crate::error::{Error, Result};
use crate::output;
use crate::repository::Repository;
use crate::runner::{Check, Cmd, Echo};

#[derive(Debug, Clone)]
pub struct Mercurial {
    hgdir: PathBuf,
}

impl Mercurial {
    pub fn at(root: &Path) -> Self {
        Self {
            hgdir: root.join(".hg"),
        }
    }

    pub fn detect(directory: &Path) -> Option<Self> {
        let hgdir = directory.join(".hg");
        if hgdir.is_dir() {
            Some(Self { hgdir })
        } else {
            None
        }
    }

    fn hg(&self, repo: &Repository) -> Cmd {
        Cmd::new(HG_PROGRAM).current_dir(repo.root())
    }

    /// `hg` run from the invocation directory, for operator-typed paths.
    fn hg_here(&self, repo: &Repository) -> Cmd {
        Cmd::new(HG_PROGRAM).current_dir(repo.start_dir())
    }

    fn status_output(&self, repo: &Repository) -> Result<String> {
        repo.runner().output(self.hg(repo).arg("status"))
    }

    fn pull_command(&self, repo: &Repository) -> Cmd {
        let mut cmd = self.hg(repo).args(["pull", "--rebase"]);
        if repo.verbose() {
            cmd = cmd.arg("--verbose");
        }
        cmd.suffix(format!(" # {}", repo.url().unwrap_or_default()))
    }
}

/// Hide ignorable untracked files and relocate `?`, `M` and `A` lines.
fn process_status(output: &str, offset: Option<&Path>, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for line in output.lines() {
        if !verbose {
            if let Some(name) = line.strip_prefix("? ") {
                if is_ignored_untracked(name) {
                    continue;
                }
            }
        }
        let relocatable = ["? ", "M ", "A "].iter().any(|p| line.starts_with(p));
        match offset {
            Some(offset) if relocatable && line.len() >= 3 => {
                lines.push(crate::path::relocate_status_line(line, 2, offset))
            }
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// Split `hg log --template '{tags}\n'` output into tag names, dropping
/// `tip`.
fn parse_tag_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .flat_map(str::split_whitespace)
        .filter(|tag| *tag != "tip")
        .map(str::to_string)
        .collect()
}

impl Backend for Mercurial {
    fn kind(&self) -> BackendKind {
        BackendKind::Mercurial
    }

    fn metadata_dir(&self) -> &Path {
        &self.hgdir
    }

    fn remote_url(&self) -> Option<String> {
        let hgrc = read_ini(&self.hgdir.join("hgrc"))?;
        hgrc.get_from(Some("paths"), "default").map(str::to_string)
    }

    fn has_local_changes(&self, repo: &Repository) -> Result<bool> {
        let id = repo.runner().output(self.hg(repo).args(["id", "--num"]))?;
        Ok(id.trim().contains('+'))
    }

    fn modified_files(&self, repo: &Repository) -> Result<Vec<String>> {
        Ok(self
            .status_output(repo)?
            .lines()
            .filter(|line| !line.starts_with('?') && line.len() > 2)
            .map(|line| line[2..].to_string())
            .collect())
    }

    fn untracked_files(&self, repo: &Repository) -> Result<Vec<PathBuf>> {
        Ok(self
            .status_output(repo)?
            .lines()
            .filter_map(|line| line.strip_prefix("? "))
            .map(|name| repo.root().join(name))
            .collect())
    }

    fn tracked_files(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo.runner().output(self.hg(repo).args([
            "status",
            "--no-status",
            "--clean",
            "--modified",
            "--added",
        ]))?;
        Ok(output.trim().lines().map(str::to_string).collect())
    }

    fn status(&self, repo: &Repository, paths: &[String]) -> Result<Vec<String>> {
        if paths.is_empty() {
            let output = self.status_output(repo)?;
            Ok(process_status(&output, repo.offset(), repo.verbose()))
        } else {
            let output = repo
                .runner()
                .output(self.hg_here(repo).arg("status").args(paths.iter().cloned()))?;
            Ok(process_status(&output, None, repo.verbose()))
        }
    }

    fn diff(&self, repo: &Repository, paths: &[String]) -> Result<()> {
        let mut cmd = self.hg_here(repo).arg("diff");
        if paths.is_empty() {
            let scope = repo
                .offset()
                .map(|offset| offset.display().to_string())
                .unwrap_or_else(|| ".".to_string());
            cmd = cmd.arg(scope);
        } else {
            cmd = cmd.args(paths.iter().cloned());
        }
        let echo = if repo.verbose() { Echo::Trace } else { Echo::Quiet };
        repo.runner().run(cmd, echo, Check::Fail)?;
        Ok(())
    }

    fn stash_diff(&self, repo: &Repository, _patch: StashPatch) -> Cmd {
        // readline writes an escape sequence to stdout when TERM is xterm
        self.hg(repo).arg("diff").env("TERM", "dummy")
    }

    fn apply_patch(&self, repo: &Repository, _patch: StashPatch) -> Cmd {
        Cmd::new(PATCH_PROGRAM).arg("-p1").current_dir(repo.root())
    }

    fn revert_all(&self, repo: &Repository) -> Result<()> {
        repo.runner().run(
            self.hg(repo).args(["revert", "--all", "--no-backup"]),
            Echo::Trace,
            Check::Fail,
        )?;
        Ok(())
    }

    fn revert(&self, repo: &Repository, paths: &[String]) -> Result<()> {
        let runner = repo.runner();
        if paths.is_empty() {
            runner.run(
                self.hg(repo)
                    .args(["revert", "--no-backup", "--rev", ".", "--all"]),
                Echo::Title(repo.name()),
                Check::Fail,
            )?;
            runner.run(
                self.hg(repo).args(["update", "--clean"]),
                Echo::Title(repo.name()),
                Check::Fail,
            )?;
        } else {
            runner.run(
                self.hg_here(repo)
                    .args(["revert", "--no-backup", "--rev", "."])
                    .args(paths.iter().cloned()),
                Echo::Title(repo.name()),
                Check::Fail,
            )?;
        }
        Ok(())
    }

    fn pull(&self, repo: &Repository) -> Result<()> {
        let runner = repo.runner();
        runner.run(self.pull_command(repo), Echo::Trace, Check::Fail)?;
        runner.run(self.hg(repo).arg("update"), Echo::Trace, Check::Fail)?;
        Ok(())
    }

    fn push(&self, repo: &Repository) -> Result<()> {
        repo.runner()
            .run(self.hg(repo).arg("push"), Echo::Trace, Check::Fail)?;
        Ok(())
    }

    fn clone_from(&self, repo: &Repository, url: &str) -> Result<()> {
        let parent = repo.root().parent().unwrap_or(repo.root());
        fs::create_dir_all(parent)?;
        let cmd = Cmd::new(HG_PROGRAM)
            .arg("clone")
            .arg(url)
            .arg(repo.root().display().to_string())
            .current_dir(parent);
        repo.runner().run(cmd, Echo::Title(repo.name()), Check::Fail)?;
        Ok(())
    }

    fn histedit(&self, repo: &Repository, revision: &str) -> Result<i32> {
        repo.runner().run(
            self.hg(repo).args(["histedit", revision]),
            Echo::Trace,
            Check::Ignore,
        )
    }

    fn commit(&self, repo: &Repository, args: &[String]) -> Result<i32> {
        repo.runner().run(
            self.hg_here(repo).arg("commit").args(args.iter().cloned()),
            Echo::Trace,
            Check::Fail,
        )
    }

    fn add(&self, repo: &Repository, args: &[String]) -> Result<()> {
        repo.runner().run(
            self.hg_here(repo).arg("add").args(args.iter().cloned()),
            Echo::Title(repo.name()),
            Check::Fail,
        )?;
        Ok(())
    }

    fn branch(&self, repo: &Repository) -> Result<String> {
        let output = repo.runner().output(self.hg(repo).arg("branch"))?;
        Ok(output.trim_end().to_string())
    }

    fn list_branches(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo.runner().output(self.hg(repo).arg("branches"))?;
        Ok(output.lines().map(str::to_string).collect())
    }

    fn list_tags(&self, repo: &Repository) -> Result<Vec<String>> {
        let output = repo.runner().output(self.hg(repo).arg("tags"))?;
        Ok(output.lines().map(str::to_string).collect())
    }

    fn tag_contains(&self, repo: &Repository, revision: &str) -> Result<Vec<String>> {
        let revset = format!("descendants({}) and tag()", revision);
        let output = repo.runner().output(self.hg(repo).args([
            "log",
            "-r",
            revset.as_str(),
            "--template",
            "{tags}\\n",
        ]))?;
        Ok(parse_tag_lines(&output))
    }

    fn outgoing(&self, repo: &Repository, display_if_empty: bool) -> Result<i32> {
        let runner = repo.runner();
        if display_if_empty {
            runner.run(self.hg(repo).arg("out"), Echo::Trace, Check::Ignore)?;
            return Ok(0);
        }
        let cmd = self.hg(repo).arg("out");
        let command = cmd.display();
        let result = runner.capture(cmd)?;
        match result.exit_code {
            // 1: no outgoing changeset
            1 => Ok(0),
            0 => {
                output::print_title(repo.name(), "Output commits");
                output::print_command_output(&command, &result.stdout);
                Ok(0)
            }
            code => {
                output::print_command_output(&command, &result.combined());
                Ok(code)
            }
        }
    }

    fn info(&self, repo: &Repository) -> Result<Vec<String>> {
        let cmd = self.hg(repo).args(["id", "--num", "--branch"]);
        let command = cmd.display();
        let output = repo.runner().output(cmd)?;
        let mut parts = output.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(revision), Some(branch)) => Ok(vec![
                format!("revision = {}", revision),
                format!("branch = {}", branch),
            ]),
            _ => Err(Error::UnexpectedOutput { command, output }),
        }
    }

    fn clean(&self, repo: &Repository) -> Result<()> {
        let strip_backup = self.hgdir.join("strip-backup");
        if strip_backup.exists() {
            println!("Remove directory {}", repo.display_path(&strip_backup).display());
            fs::remove_dir_all(&strip_backup)?;
            info!("removed {}", strip_backup.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_status_hides_swap_files_and_tags() {
        let output = "M src/a.py\n? .a.py.swp\n? tags\n? notes.txt\n";
        let lines = process_status(output, None, false);
        assert_eq!(lines, vec!["M src/a.py", "? notes.txt"]);
    }

    #[test]
    fn test_process_status_verbose_keeps_everything() {
        let output = "M src/a.py\n? .a.py.swp\n";
        let lines = process_status(output, None, true);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_process_status_relocates_paths() {
        let output = "M src/a.py\nA new.py\nR gone.py\n";
        let lines = process_status(output, Some(Path::new("lib/foo")), false);
        assert_eq!(
            lines,
            vec!["M lib/foo/src/a.py", "A lib/foo/new.py", "R gone.py"]
        );
    }

    #[test]
    fn test_parse_tag_lines() {
        let output = "v1.1\ntip v1.2 stable\n";
        assert_eq!(parse_tag_lines(output), vec!["v1.1", "v1.2", "stable"]);
    }

    #[test]
    fn test_parse_tag_lines_empty() {
        assert!(parse_tag_lines("").is_empty());
    }

    #[test]
    fn test_remote_url_from_hgrc() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".hg")).unwrap();
        fs::write(
            dir.path().join(".hg/hgrc"),
            "[paths]\ndefault = https://hg.example.com/project\n",
        )
        .unwrap();
        let hg = Mercurial::detect(dir.path()).unwrap();
        assert_eq!(
            hg.remote_url().as_deref(),
            Some("https://hg.example.com/project")
        );
    }

    #[test]
    fn test_remote_url_without_hgrc() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".hg")).unwrap();
        let hg = Mercurial::detect(dir.path()).unwrap();
        assert_eq!(hg.remote_url(), None);
    }
}
