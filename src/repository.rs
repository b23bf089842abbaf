//! # Repository Handles
//!
//! A [`Repository`] ties a working tree root to the [`Vcs`] backend that
//! manages it and to the invocation [`Context`]. It owns everything that is
//! the same for Mercurial and Git: naming relative to the invocation
//! directory, scoping of tracked files, `grep`, report formatting, the
//! revert confirmation, and wrapping `pull`, `push` and `histedit` in the
//! stash protocol.
//!
//! ## Naming
//!
//! Repositories are named relative to the directory `scm` was started from:
//!
//! - below it: the relative path (`lib/foo`);
//! - containing it: the root's base name followed by the relative offset
//!   (`project (../..)`);
//! - equal to it: the root's base name.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::warn;

use crate::backend::{Backend, Vcs};
use crate::config::{BackendKind, ConfigEntry};
use crate::context::Context;
use crate::defaults::{GREP_PROGRAM, REVERT_PROMPT_FILES};
use crate::error::{Error, Result};
use crate::output;
use crate::path::{clean, relative_path, relocate_grep_output, resolve_clone_url};
use crate::prompt;
use crate::runner::{Cmd, Runner};
use crate::stash;

/// A repository in the working set.
#[derive(Debug)]
pub struct Repository {
    ctx: Rc<Context>,
    root: PathBuf,
    name: String,
    /// Root relative to the invocation directory; `None` when equal.
    offset: Option<PathBuf>,
    vcs: Vcs,
    url: OnceCell<Option<String>>,
}

impl Repository {
    /// Create a handle for `root`. A known `url` (from a configuration file)
    /// takes precedence over the one stored in the backend configuration.
    pub fn new(ctx: Rc<Context>, root: PathBuf, vcs: Vcs, url: Option<String>) -> Self {
        let root = clean(&root);
        let start = ctx.start_dir();
        let offset = if root == start {
            None
        } else {
            Some(relative_path(&root, start))
        };
        let name = repository_name(&root, start, offset.as_deref());
        let cell = OnceCell::new();
        if let Some(url) = url {
            let _ = cell.set(Some(url));
        }
        Self {
            ctx,
            root,
            name,
            offset,
            vcs,
            url: cell,
        }
    }

    /// Handle for a configuration entry whose directory is relative to
    /// `base`. The repository may not exist yet.
    pub fn from_entry(ctx: Rc<Context>, base: &Path, entry: &ConfigEntry) -> Self {
        let joined = clean(&base.join(&entry.directory));
        let root = joined.canonicalize().unwrap_or(joined);
        let vcs = Vcs::detect(&root)
            .filter(|vcs| vcs.backend().kind() == entry.kind)
            .unwrap_or_else(|| Vcs::for_kind(entry.kind, &root));
        Self::new(ctx, root, vcs, Some(entry.url.clone()))
    }

    /// Handle for `directory` if it is a repository root.
    pub fn detect(ctx: Rc<Context>, directory: &Path) -> Option<Self> {
        let vcs = Vcs::detect(directory)?;
        Some(Self::new(ctx, directory.to_path_buf(), vcs, None))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root relative to the invocation directory, if they differ.
    pub fn offset(&self) -> Option<&Path> {
        self.offset.as_deref()
    }

    pub fn kind(&self) -> BackendKind {
        self.backend().kind()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.vcs.backend()
    }

    pub fn start_dir(&self) -> &Path {
        self.ctx.start_dir()
    }

    pub fn verbose(&self) -> bool {
        self.ctx.verbose()
    }

    pub fn runner(&self) -> &Runner {
        self.ctx.runner()
    }

    /// Value for the `--color=` option of the wrapped tools.
    pub fn color_arg(&self) -> &'static str {
        self.ctx.output().color_arg()
    }

    /// True if the repository has been checked out.
    pub fn exists(&self) -> bool {
        self.backend().metadata_dir().exists()
    }

    /// Remote URL, read lazily from the backend configuration when it was
    /// not given by a configuration file.
    pub fn url(&self) -> Option<String> {
        self.url
            .get_or_init(|| self.backend().remote_url())
            .clone()
    }

    /// `path` relative to the invocation directory, for messages.
    pub fn display_path(&self, path: &Path) -> PathBuf {
        relative_path(path, self.start_dir())
    }

    /// Rewrite file arguments given relative to the invocation directory so
    /// that they are relative to the root. Options and arguments that do not
    /// name an existing file are passed through.
    pub fn relative_args(&self, args: &[String]) -> Vec<String> {
        args.iter()
            .map(|arg| {
                if arg.starts_with('-') {
                    return arg.clone();
                }
                let path = self.start_dir().join(arg);
                if path.exists() {
                    relative_path(&path, &self.root).display().to_string()
                } else {
                    arg.clone()
                }
            })
            .collect()
    }

    /// Tracked files existing on disk, scoped to the invocation directory.
    ///
    /// When the invocation directory is inside the repository, only the
    /// files below it are returned, relative to it, and `true` is returned
    /// alongside. Otherwise all files are returned relative to the root.
    pub fn existing_files(&self) -> Result<(Vec<String>, bool)> {
        let files = self.backend().tracked_files(self)?;
        let start = self.start_dir();
        if start == self.root || !start.starts_with(&self.root) {
            return Ok((files, false));
        }
        let prefix = relative_path(start, &self.root);
        let scoped = files
            .iter()
            .filter_map(|name| Path::new(name).strip_prefix(&prefix).ok())
            .filter(|rest| !rest.as_os_str().is_empty())
            .map(|rest| rest.display().to_string())
            .collect();
        Ok((scoped, true))
    }

    /// Search the tracked files; returns whether anything matched.
    pub fn grep(&self, args: &[String], display_if_empty: bool) -> Result<bool> {
        let (files, scoped) = self.existing_files()?;
        if files.is_empty() {
            warn!(
                "{}: the repository doesn't track any file in the current directory",
                self.name
            );
            return Ok(false);
        }
        let count = files.len();
        let cwd = if scoped { self.start_dir() } else { self.root() };
        let cmd = Cmd::new(GREP_PROGRAM)
            .args(["-R", "-I", "-H", "-n"])
            .arg(format!("--color={}", self.color_arg()))
            .args(args.iter().cloned())
            .arg("--")
            .args(files)
            .current_dir(cwd);
        let result = self.runner().capture(cmd)?;
        let found = result.success();
        let mut text = result.stdout.trim().to_string();
        if text.is_empty() && !display_if_empty {
            return Ok(found);
        }
        if let (false, Some(offset)) = (scoped, self.offset()) {
            text = relocate_grep_output(&text, offset);
        }
        output::print_title(
            &self.name,
            &format!("Grep {} -- <{} filenames>", shell_words::join(args), count),
        );
        println!("{}", text);
        if !text.is_empty() {
            println!();
        }
        Ok(found)
    }

    /// Print the tracked files; returns whether there was any.
    pub fn list_files(&self) -> Result<bool> {
        let (files, scoped) = self.existing_files()?;
        if files.is_empty() {
            warn!(
                "{}: the repository doesn't track any file in the current directory",
                self.name
            );
            return Ok(false);
        }
        for file in &files {
            match (scoped, self.offset()) {
                (false, Some(offset)) => println!("{}", clean(&offset.join(file)).display()),
                _ => println!("{}", file),
            }
        }
        Ok(true)
    }

    pub fn status(&self, paths: &[String]) -> Result<()> {
        let lines = self.backend().status(self, paths)?;
        if lines.is_empty() && !self.verbose() {
            return Ok(());
        }
        output::print_title(&self.name, "Status");
        for line in &lines {
            println!("{}", line);
        }
        if !lines.is_empty() {
            println!();
        }
        Ok(())
    }

    pub fn diff(&self, paths: &[String]) -> Result<()> {
        self.backend().diff(self, paths)
    }

    pub fn info(&self) -> Result<()> {
        output::print_title(&self.name, "Informations");
        for line in self.backend().info(self)? {
            println!("{}", line);
        }
        println!("scm = {}", self.kind());
        let changes = if self.backend().has_local_changes(self)? {
            "yes"
        } else {
            "no"
        };
        println!("has local changes? {}", changes);
        println!("root = {}", self.root.display());
        if let Some(url) = self.url() {
            println!("url = {}", url);
        }
        println!();
        Ok(())
    }

    pub fn branch(&self) -> Result<()> {
        println!("{}: {}", self.name, self.backend().branch(self)?);
        Ok(())
    }

    pub fn list_branches(&self) -> Result<()> {
        self.print_list("Branches", &self.backend().list_branches(self)?);
        Ok(())
    }

    pub fn list_tags(&self) -> Result<()> {
        self.print_list("Tags", &self.backend().list_tags(self)?);
        Ok(())
    }

    /// Tags on descendants of `revision`, nearest first.
    pub fn tag_contains(&self, revision: &str) -> Result<Vec<String>> {
        self.backend().tag_contains(self, revision)
    }

    fn print_list(&self, title: &str, lines: &[String]) {
        output::print_title(&self.name, title);
        for line in lines {
            println!("{}", line);
        }
        if !lines.is_empty() {
            println!();
        }
    }

    /// Print outgoing commits; returns the exit code to aggregate.
    pub fn outgoing(&self, display_if_empty: bool) -> Result<i32> {
        self.backend().outgoing(self, display_if_empty)
    }

    pub fn pull(&self) -> Result<()> {
        output::print_title(&self.name, "Pull");
        stash::protect(self, |repo| repo.backend().pull(repo))?;
        println!();
        Ok(())
    }

    /// Pull (under the stash protocol) then push.
    pub fn push(&self) -> Result<()> {
        output::print_title(&self.name, "Push");
        stash::protect(self, |repo| repo.backend().pull(repo))?;
        self.backend().push(self)?;
        println!();
        Ok(())
    }

    /// Create the repository from its URL.
    pub fn clone_repository(&self) -> Result<()> {
        let url = self.url().ok_or_else(|| Error::MissingUrl {
            repository: self.to_string(),
        })?;
        let url = resolve_clone_url(&url, &self.root);
        self.backend().clone_from(self, &url)
    }

    /// Rewrite history under the stash protocol; returns the tool's exit
    /// code.
    pub fn histedit(&self, revision: &str) -> Result<i32> {
        output::print_title(&self.name, &format!("Histedit {}", revision));
        stash::protect(self, |repo| repo.backend().histedit(repo, revision))
    }

    pub fn commit(&self, args: &[String]) -> Result<i32> {
        self.backend().commit(self, args)
    }

    pub fn add(&self, args: &[String]) -> Result<()> {
        self.backend().add(self, args)
    }

    /// Revert after confirmation; returns `false` when there was nothing to
    /// revert.
    ///
    /// Declining the prompt returns [`Error::Declined`].
    pub fn command_revert(&self, paths: &[String], verbose: bool) -> Result<bool> {
        let question = if paths.is_empty() {
            let files = self.backend().modified_files(self)?;
            if files.is_empty() && !self.backend().has_local_changes(self)? {
                if verbose {
                    println!("No local changes, exit");
                }
                return Ok(false);
            }
            revert_question(&self.name, &files)
        } else {
            format!("Do you really want to revert {}", paths.join(", "))
        };
        prompt::confirm_revert(&question, || {
            self.diff(&[])?;
            println!();
            Ok(())
        })?;
        self.backend().revert(self, paths)?;
        Ok(true)
    }

    /// See [`stash::stash`].
    pub fn stash(&self, verbose: bool) -> Result<bool> {
        stash::stash(self, verbose)
    }

    /// See [`stash::unstash`].
    pub fn unstash(&self, verbose: bool) -> Result<bool> {
        stash::unstash(self, verbose)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind())
    }
}

fn repository_name(root: &Path, start: &Path, offset: Option<&Path>) -> String {
    match offset {
        Some(offset) if !start.starts_with(root) => offset.display().to_string(),
        _ => {
            let base = root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string());
            match offset {
                Some(offset) => format!("{} ({})", base, offset.display()),
                None => base,
            }
        }
    }
}

fn revert_question(name: &str, files: &[String]) -> String {
    if files.is_empty() {
        return format!("DO YOU REALLY WANT TO REVERT ALL {} LOCAL CHANGES", name);
    }
    let mut shown: Vec<&str> = files
        .iter()
        .take(REVERT_PROMPT_FILES)
        .map(String::as_str)
        .collect();
    if files.len() > REVERT_PROMPT_FILES {
        shown.push("...");
    }
    format!(
        "DO YOU REALLY WANT TO REVERT ALL {} LOCAL CHANGES ({} files): {}",
        name,
        files.len(),
        shown.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputConfig;
    use std::fs;

    fn context(start: &Path) -> Rc<Context> {
        Rc::new(Context::new(
            start.to_path_buf(),
            false,
            OutputConfig::without_color(),
        ))
    }

    fn hg_repo(ctx: &Rc<Context>, root: &str) -> Repository {
        let root = PathBuf::from(root);
        let vcs = Vcs::for_kind(BackendKind::Mercurial, &root);
        Repository::new(ctx.clone(), root, vcs, Some("https://hg/x".to_string()))
    }

    #[test]
    fn test_name_below_start_directory() {
        let ctx = context(Path::new("/work"));
        let repo = hg_repo(&ctx, "/work/lib/foo");
        assert_eq!(repo.name(), "lib/foo");
        assert_eq!(repo.offset(), Some(Path::new("lib/foo")));
        assert_eq!(repo.to_string(), "lib/foo (hg)");
    }

    #[test]
    fn test_name_equal_to_start_directory() {
        let ctx = context(Path::new("/work/project"));
        let repo = hg_repo(&ctx, "/work/project");
        assert_eq!(repo.name(), "project");
        assert_eq!(repo.offset(), None);
    }

    #[test]
    fn test_name_containing_start_directory() {
        let ctx = context(Path::new("/work/project/src/module"));
        let repo = hg_repo(&ctx, "/work/project");
        assert_eq!(repo.name(), "project (../..)");
    }

    #[test]
    fn test_name_sibling_of_start_directory() {
        let ctx = context(Path::new("/work/a"));
        let repo = hg_repo(&ctx, "/work/b");
        assert_eq!(repo.name(), "../b");
    }

    #[test]
    fn test_configured_url_wins() {
        let ctx = context(Path::new("/work"));
        let repo = hg_repo(&ctx, "/work/foo");
        assert_eq!(repo.url().as_deref(), Some("https://hg/x"));
    }

    #[test]
    fn test_url_read_lazily_from_backend() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join(".hg")).unwrap();
        fs::write(root.join(".hg/hgrc"), "[paths]\ndefault = /srv/hg/foo\n").unwrap();
        let repo = Repository::detect(context(&root), &root).unwrap();
        assert_eq!(repo.url().as_deref(), Some("/srv/hg/foo"));
    }

    #[test]
    fn test_exists_checks_metadata_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let ctx = context(&root);
        let entry = ConfigEntry {
            directory: PathBuf::from("foo"),
            kind: BackendKind::Mercurial,
            url: "https://hg/foo".to_string(),
        };
        let repo = Repository::from_entry(ctx.clone(), &root, &entry);
        assert!(!repo.exists());
        fs::create_dir_all(root.join("foo/.hg")).unwrap();
        let repo = Repository::from_entry(ctx, &root, &entry);
        assert!(repo.exists());
        assert_eq!(repo.name(), "foo");
    }

    #[test]
    fn test_relative_args_rewrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "").unwrap();
        let ctx = context(&root.join("src"));
        let repo = Repository::new(
            ctx,
            root.clone(),
            Vcs::for_kind(BackendKind::Git, &root),
            None,
        );
        let args = vec![
            "-m".to_string(),
            "message".to_string(),
            "main.rs".to_string(),
        ];
        assert_eq!(repo.relative_args(&args), vec!["-m", "message", "src/main.rs"]);
    }

    #[test]
    fn test_revert_question_truncates_file_list() {
        let files: Vec<String> = (1..=7).map(|i| format!("f{}", i)).collect();
        assert_eq!(
            revert_question("foo", &files),
            "DO YOU REALLY WANT TO REVERT ALL foo LOCAL CHANGES (7 files): f1, f2, f3, f4, f5, ..."
        );
        assert_eq!(
            revert_question("foo", &[]),
            "DO YOU REALLY WANT TO REVERT ALL foo LOCAL CHANGES"
        );
    }
}
