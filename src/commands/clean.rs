//! # Cleanup Commands
//!
//! `clean`, `distclean` and `remove_untracked` run on every existing
//! repository of the working set, after announcing how many are processed.

use std::rc::Rc;

use anyhow::Result;
use clap::Args;

use multi_scm::cleanup;
use multi_scm::context::Context;
use multi_scm::discovery;
use multi_scm::orchestrator;

/// Remove every untracked file and directory
#[derive(Args, Debug)]
pub struct DistcleanArgs {
    /// Really remove the files instead of listing them
    #[arg(long)]
    pub remove: bool,
}

pub fn clean(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    set.print_processing();
    for repo in orchestrator::existing(&set) {
        cleanup::clean(repo)?;
    }
    Ok(0)
}

pub fn distclean(args: DistcleanArgs, ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    set.print_processing();
    for repo in orchestrator::existing(&set) {
        cleanup::distclean(repo, args.remove)?;
    }
    Ok(0)
}

pub fn remove_untracked(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    set.print_processing();
    for repo in orchestrator::existing(&set) {
        cleanup::remove_untracked(repo)?;
    }
    Ok(0)
}
