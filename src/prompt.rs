//! Operator confirmation dialogs.
//!
//! Prompts go to stderr. When stderr is not a terminal the answer is read
//! as one line from stdin, which keeps the dialogs scriptable; end of input
//! counts as the default answer.

use std::io::{self, BufRead, Write};

use console::Term;
use dialoguer::Input;

use crate::error::{Error, Result};

/// Answer to the revert confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertAnswer {
    Yes,
    No,
    Diff,
    Help,
    Unknown(String),
}

impl RevertAnswer {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "" | "n" | "no" | "q" | "quit" | "exit" => RevertAnswer::No,
            "y" | "yes" => RevertAnswer::Yes,
            "d" | "diff" => RevertAnswer::Diff,
            "?" | "help" => RevertAnswer::Help,
            other => RevertAnswer::Unknown(other.to_string()),
        }
    }
}

/// Answer to the per-file removal question of `remove_untracked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveAnswer {
    Yes,
    All,
    No,
}

impl RemoveAnswer {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => RemoveAnswer::Yes,
            "a" | "all" => RemoveAnswer::All,
            _ => RemoveAnswer::No,
        }
    }
}

/// Ask a question; `None` at end of input.
pub fn ask(question: &str) -> Result<Option<String>> {
    let term = Term::stderr();
    if term.is_term() {
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text_on(&term)?;
        return Ok(Some(answer));
    }
    eprint!("{}: ", question);
    io::stderr().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        eprintln!();
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask until the operator accepts or declines a revert. `show_diff` is
/// called each time the operator asks for the diff.
///
/// Declining returns [`Error::Declined`].
pub fn confirm_revert<F>(question: &str, mut show_diff: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let question = format!("{} [y/N/d/?]", question);
    loop {
        let answer = ask(&question)?
            .map(|answer| RevertAnswer::parse(&answer))
            .unwrap_or(RevertAnswer::No);
        match answer {
            RevertAnswer::Yes => return Ok(()),
            RevertAnswer::No => return Err(Error::Declined),
            RevertAnswer::Diff => show_diff()?,
            RevertAnswer::Help => print_revert_help(),
            RevertAnswer::Unknown(text) => {
                println!("Sorry, I don't understand \"{}\"", text);
                println!();
                print_revert_help();
            }
        }
    }
}

fn print_revert_help() {
    println!("no, n, quit, q or exit (default): do nothing, exit");
    println!("yes or y: revert changes");
    println!("diff or d: show differences");
    println!("?: show this help");
    println!();
}
