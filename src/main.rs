//! # scm
//!
//! Binary entry point for the `scm` command-line tool.
//!
//! Parses the command line with `clap`, runs the command and turns its
//! outcome into the process exit code. A failing `hg`/`git` call propagates
//! its own exit code; a declined confirmation exits with 1 silently.
//!
//! The logic lives in the `multi_scm` library crate; the binary is a thin
//! wrapper around it.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use multi_scm::error::Error;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let code = match cli.execute() {
        Ok(code) => code,
        Err(err) => match err.downcast_ref::<Error>() {
            Some(error) => {
                if !error.is_silent() {
                    eprintln!("Error: {:#}", err);
                }
                error.exit_code()
            }
            None => {
                eprintln!("Error: {:#}", err);
                1
            }
        },
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
