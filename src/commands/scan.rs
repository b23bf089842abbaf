//! # Scan Command Implementation
//!
//! Walks down from the current directory and prints an `scm_config` for the
//! repositories found, sorted by directory. Progress goes to stderr so the
//! output can be redirected straight into a file:
//!
//! ```bash
//! scm scan > scm_config
//! ```
//!
//! Repositories whose remote URL is unknown are left out and counted.

use std::rc::Rc;

use anyhow::Result;
use log::warn;

use multi_scm::config;
use multi_scm::context::Context;
use multi_scm::discovery;

/// Exit code 1 when no repository was found.
pub fn execute(ctx: &Rc<Context>) -> Result<i32> {
    eprintln!(
        "Search HG and GIT projects in {}...",
        ctx.start_dir().display()
    );
    let report = discovery::scan(ctx)?;
    eprintln!();
    if report.repositories.is_empty() {
        eprintln!(
            "Did not find any repository in {}",
            ctx.start_dir().display()
        );
        return Ok(1);
    }

    print!("{}", config::render(&report.entries()));
    eprintln!();
    eprintln!("Found {} repositories", report.repositories.len());
    if report.ignored > 0 {
        warn!("{} repository/ies has been ignored", report.ignored);
    }
    Ok(0)
}
