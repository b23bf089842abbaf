//! # Remote Commands
//!
//! `pull` visits every repository of the working set and keeps going after a
//! failure, cloning the repositories that are missing; the failed ones are
//! listed at the end. `push` works on the current repository only. `clone`
//! requires a configuration file and creates every missing repository.

use std::rc::Rc;

use anyhow::Result;

use multi_scm::context::Context;
use multi_scm::discovery;
use multi_scm::orchestrator;

pub fn pull(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, false)?;
    let report = orchestrator::pull_all(&set);
    Ok(report.status.code())
}

pub fn push(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup_local(ctx, &[])?;
    set.single()?.push()?;
    Ok(0)
}

pub fn clone(ctx: &Rc<Context>) -> Result<i32> {
    let set = discovery::setup(ctx, true)?;
    for repo in set.repositories() {
        if repo.exists() {
            println!("Skip {}: already exists", repo.name());
        } else {
            repo.clone_repository()?;
        }
    }
    Ok(0)
}
