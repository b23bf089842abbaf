//! # Working Tree Commands
//!
//! `add`, `commit`, `histedit`, `revert`, `stash` and `unstash` act on the
//! repository containing the invocation directory (or, for `revert FILES`,
//! the files). Any failure aborts immediately. `revert` without files is the
//! exception: it asks for confirmation in every repository of the working
//! set.

use std::rc::Rc;

use anyhow::Result;
use clap::Args;

use multi_scm::context::Context;
use multi_scm::discovery;
use multi_scm::orchestrator;

/// Arguments passed through to `hg`/`git`
#[derive(Args, Debug)]
pub struct PassThroughArgs {
    /// Files and options for the underlying tool
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Rewrite history starting at a revision
#[derive(Args, Debug)]
pub struct HisteditArgs {
    /// First revision to edit
    pub revision: String,
}

/// Discard local changes after confirmation
#[derive(Args, Debug)]
pub struct RevertArgs {
    /// Files to revert; all local changes when omitted
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,
}

pub fn add(args: PassThroughArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    set.single()?.add(&args.args)?;
    Ok(0)
}

pub fn commit(args: PassThroughArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    Ok(set.single()?.commit(&args.args)?)
}

pub fn histedit(args: HisteditArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    Ok(set.single()?.histedit(&args.revision)?)
}

pub fn revert(args: RevertArgs, ctx: &Rc<Context>) -> Result<i32> {
    if !args.files.is_empty() {
        let set = discovery::setup_local(ctx, &args.files)?;
        set.single()?.command_revert(&args.files, true)?;
        return Ok(0);
    }
    let set = discovery::setup(ctx, false)?;
    let mut modified = false;
    for repo in orchestrator::existing(&set) {
        modified |= repo.command_revert(&[], false)?;
    }
    if !modified {
        println!("All repositories are clean.");
    }
    Ok(0)
}

/// Exit code 1 when there was nothing to stash.
pub fn stash(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    let saved = set.single()?.stash(true)?;
    Ok(if saved { 0 } else { 1 })
}

/// Exit code 1 when there was no stash file.
pub fn unstash(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    let restored = set.single()?.unstash(true)?;
    Ok(if restored { 0 } else { 1 })
}
