//! # Command Runner
//!
//! Every interaction with `hg`, `git`, `grep`, `patch` and `sync` goes
//! through this module. It builds the child process with a controlled
//! environment, echoes the command line for the operator, and turns the
//! outcome into either an exit code or an [`Error`].
//!
//! ## Modes
//!
//! - **Checked** ([`Check::Fail`]): a non-zero exit is returned as
//!   [`Error::CommandFailed`] carrying the child's exit code. Callers
//!   propagate it with `?` and `scm` exits with that code.
//! - **Unchecked** ([`Check::Ignore`]): the exit code is handed back to the
//!   caller, which may inspect it or fold it into the batch exit code.
//!
//! Locale variables (`LANG`, `LC_ALL`, `LC_CTYPE`) are removed from the
//! child environment so status letters and porcelain formats parse the same
//! way for every operator. A missing binary is reported as
//! [`Error::ProgramNotFound`].

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

use crate::defaults::LOCALE_VARIABLES;
use crate::error::{Error, Result};
use crate::output;

/// An external command line with its working directory and redirections.
#[derive(Debug)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    stdin: Option<File>,
    stdout: Option<File>,
    suffix: String,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            stdin: None,
            stdout: None,
            suffix: String::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Feed `file` to the child's standard input.
    pub fn stdin_file(mut self, file: File) -> Self {
        self.stdin = Some(file);
        self
    }

    /// Send the child's standard output to `file`.
    pub fn stdout_file(mut self, file: File) -> Self {
        self.stdout = Some(file);
        self
    }

    /// Text appended to the echoed command line, e.g. `" > .hg/stash"`.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shell-quoted command line, as echoed to the operator.
    pub fn display(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        format!("{}{}", shell_words::join(words), self.suffix)
    }

    fn build(&mut self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for name in LOCALE_VARIABLES {
            command.env_remove(name);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(stdin) = self.stdin.take() {
            command.stdin(Stdio::from(stdin));
        }
        if let Some(stdout) = self.stdout.take() {
            command.stdout(Stdio::from(stdout));
        }
        command
    }
}

/// How a command line is echoed before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo<'a> {
    /// Print an underlined `NAME: command` title.
    Title(&'a str),
    /// Print a `+ command` trace line.
    Trace,
    /// Print nothing.
    Quiet,
}

/// What to do with a non-zero exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Return [`Error::CommandFailed`].
    Fail,
    /// Hand the exit code back to the caller.
    Ignore,
}

/// Exit code and captured standard output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Executes external programs on behalf of the repository backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner;

impl Runner {
    pub fn new() -> Self {
        Self
    }

    /// Run a command with captured output and return its result whatever
    /// the exit code.
    pub fn capture(&self, mut cmd: Cmd) -> Result<CommandResult> {
        debug!("capture: {}", cmd.display());
        flush_std();
        let output = cmd
            .build()
            .stdin(Stdio::null())
            .output()
            .map_err(|err| spawn_error(cmd.program(), err))?;
        Ok(CommandResult {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run a command with captured output and fail on a non-zero exit.
    ///
    /// On failure the command line and everything it printed are shown
    /// before the error is returned.
    pub fn output(&self, cmd: Cmd) -> Result<String> {
        let command = cmd.display();
        let result = self.capture(cmd)?;
        if !result.success() {
            output::print_command_output(&command, &result.combined());
            return Err(Error::CommandFailed {
                command,
                exit_code: result.exit_code,
            });
        }
        Ok(result.stdout)
    }

    /// Run a command attached to the terminal (unless redirected) and return
    /// its exit code.
    pub fn run(&self, mut cmd: Cmd, echo: Echo<'_>, check: Check) -> Result<i32> {
        let command = cmd.display();
        match echo {
            Echo::Title(name) => output::print_title(name, &command),
            Echo::Trace => output::print_trace(&command),
            Echo::Quiet => debug!("run: {}", command),
        }
        flush_std();
        let status = cmd
            .build()
            .status()
            .map_err(|err| spawn_error(cmd.program(), err))?;
        let code = exit_code(status);
        if matches!(echo, Echo::Title(_)) {
            println!();
        }
        if code != 0 && check == Check::Fail {
            return Err(Error::CommandFailed {
                command,
                exit_code: code,
            });
        }
        Ok(code)
    }
}

fn flush_std() {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

fn spawn_error(program: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::ProgramNotFound {
            program: program.to_string(),
        }
    } else {
        Error::Io(err)
    }
}
