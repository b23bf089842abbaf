//! # Read-only Commands
//!
//! `status`, `diff`, `info`, `branches`, `branch`, `tags`, `grep`, `files`,
//! `out` and `tag_contains`. Apart from `tag_contains` and `diff FILES`,
//! which target one repository, they run on every repository of the working
//! set that exists on disk and only warn about the missing ones.

use std::rc::Rc;

use anyhow::Result;
use clap::Args;

use multi_scm::context::Context;
use multi_scm::discovery;
use multi_scm::orchestrator::{self, BatchStatus};

/// Show the status of the working trees
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only report this file or directory
    #[arg(value_name = "FILE")]
    pub file: Option<String>,
}

/// Show local changes
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Files to diff; their common directory selects the repository
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,
}

/// Search tracked files with grep
#[derive(Args, Debug)]
pub struct GrepArgs {
    /// Pattern and options passed to grep
    #[arg(
        value_name = "PATTERN",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// List tags on descendants of a revision, nearest first
#[derive(Args, Debug)]
pub struct TagContainsArgs {
    /// Revision whose descendant tags are listed
    pub revision: String,
}

pub fn status(args: StatusArgs, ctx: &Rc<Context>) -> Result<i32> {
    match args.file {
        Some(file) => {
            let paths = vec![file];
            let set = discovery::setup_local(ctx, &paths)?;
            for repo in orchestrator::existing(&set) {
                repo.status(&paths)?;
            }
        }
        None => {
            let set = discovery::setup(ctx, false)?;
            for repo in orchestrator::existing(&set) {
                repo.status(&[])?;
            }
        }
    }
    Ok(0)
}

pub fn diff(args: DiffArgs, ctx: &Rc<Context>) -> Result<i32> {
    if args.files.is_empty() {
        let set = discovery::setup(ctx, false)?;
        for repo in orchestrator::existing(&set) {
            repo.diff(&[])?;
        }
    } else {
        let set = discovery::setup_local(ctx, &args.files)?;
        set.single()?.diff(&args.files)?;
    }
    Ok(0)
}

pub fn info(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    let mut existing = 0;
    for repo in orchestrator::existing(&set) {
        repo.info()?;
        existing += 1;
    }
    if set.from_config() {
        let total = set.repositories().len();
        let missing = total - existing;
        if missing > 0 {
            println!("Total: {} repositories ({} missing)", total, missing);
        } else {
            println!("Total: {} repositories", total);
        }
    }
    Ok(0)
}

pub fn branches(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    for repo in orchestrator::existing(&set) {
        repo.list_branches()?;
    }
    Ok(0)
}

pub fn branch(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    for repo in orchestrator::existing(&set) {
        repo.branch()?;
    }
    Ok(0)
}

pub fn tags(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    for repo in orchestrator::existing(&set) {
        repo.list_tags()?;
    }
    Ok(0)
}

/// Exit code 1 when no repository matched.
pub fn grep(args: GrepArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    let display_if_empty = ctx.verbose() || set.only_one_existing();
    let mut found = false;
    for repo in orchestrator::existing(&set) {
        found |= repo.grep(&args.args, display_if_empty)?;
    }
    Ok(if found { 0 } else { 1 })
}

/// Exit code 1 when no repository tracks any file in scope.
pub fn files(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    let mut found = false;
    for repo in orchestrator::existing(&set) {
        found |= repo.list_files()?;
    }
    Ok(if found { 0 } else { 1 })
}

pub fn out(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    let display_if_empty = ctx.verbose() || set.only_one_existing();
    let mut status = BatchStatus::new();
    for repo in orchestrator::existing(&set) {
        println!("Check repository {}", repo);
        status.record(repo.outgoing(display_if_empty)?);
    }
    Ok(status.code())
}

pub fn tag_contains(args: TagContainsArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    for tag in set.single()?.tag_contains(&args.revision)? {
        println!("{}", tag);
    }
    Ok(0)
}
