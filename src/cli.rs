//! CLI argument parsing and command dispatch

use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use multi_scm::context::Context;
use multi_scm::output::OutputConfig;

use crate::commands::{change, clean, completions, inspect, remote, scan};

/// scm - Run one command across many Mercurial and Git repositories
#[derive(Parser, Debug)]
#[command(name = "scm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Show empty reports and the output of the wrapped tools
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the status of the working trees
    #[command(visible_alias = "st")]
    Status(inspect::StatusArgs),

    /// Show local changes
    Diff(inspect::DiffArgs),

    /// Show the backend, root, URL and revision of each repository
    Info,

    /// List branches
    Branches,

    /// Show the current branch
    Branch,

    /// List tags
    Tags,

    /// Search tracked files with grep
    Grep(inspect::GrepArgs),

    /// List tracked files
    Files,

    /// Show commits not pushed yet
    Out,

    /// List tags on descendants of a revision, nearest first
    #[command(name = "tag_contains")]
    TagContains(inspect::TagContainsArgs),

    /// Schedule files for addition
    Add(change::PassThroughArgs),

    /// Commit local changes
    #[command(visible_alias = "ci")]
    Commit(change::PassThroughArgs),

    /// Rewrite history starting at a revision
    Histedit(change::HisteditArgs),

    /// Discard local changes after confirmation
    Revert(change::RevertArgs),

    /// Save local changes to the stash file and revert them
    Stash,

    /// Restore local changes from the stash file
    Unstash,

    /// Pull with rebase, cloning missing repositories
    Pull,

    /// Pull then push the current repository
    Push,

    /// Clone the configured repositories that are missing
    Clone,

    /// Print a configuration file for the repositories below
    Scan,

    /// Remove backup files, rejected patches and Python caches
    Clean,

    /// Remove every untracked file and directory
    Distclean(clean::DistcleanArgs),

    /// Ask to remove each untracked file
    #[command(name = "remove_untracked")]
    RemoveUntracked,

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command and return the process exit code
    pub fn execute(self) -> Result<i32> {
        init_logging(self.log_level.as_deref(), self.verbose);
        ctrlc::set_handler(|| {
            println!();
            println!("Interrupted!");
            std::process::exit(1);
        })?;

        let output = OutputConfig::from_env_and_flag(&self.color);
        let ctx = Rc::new(Context::from_current_dir(self.verbose, output)?);
        dispatch(self.command, &ctx)
    }
}

fn init_logging(level: Option<&str>, verbose: bool) {
    let default = level.unwrap_or(if verbose { "info" } else { "warn" });
    let env = env_logger::Env::default().default_filter_or(default);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn dispatch(command: Commands, ctx: &Rc<Context>) -> Result<i32> {
    match command {
        Commands::Status(args) => inspect::status(args, ctx),
        Commands::Diff(args) => inspect::diff(args, ctx),
        Commands::Info => inspect::info(ctx),
        Commands::Branches => inspect::branches(ctx),
        Commands::Branch => inspect::branch(ctx),
        Commands::Tags => inspect::tags(ctx),
        Commands::Grep(args) => inspect::grep(args, ctx),
        Commands::Files => inspect::files(ctx),
        Commands::Out => inspect::out(ctx),
        Commands::TagContains(args) => inspect::tag_contains(args, ctx),
        Commands::Add(args) => change::add(args, ctx),
        Commands::Commit(args) => change::commit(args, ctx),
        Commands::Histedit(args) => change::histedit(args, ctx),
        Commands::Revert(args) => change::revert(args, ctx),
        Commands::Stash => change::stash(ctx),
        Commands::Unstash => change::unstash(ctx),
        Commands::Pull => remote::pull(ctx),
        Commands::Push => remote::push(ctx),
        Commands::Clone => remote::clone(ctx),
        Commands::Scan => scan::execute(ctx),
        Commands::Clean => clean::clean(ctx),
        Commands::Distclean(args) => clean::distclean(args, ctx),
        Commands::RemoveUntracked => clean::remove_untracked(ctx),
        Commands::Completions(args) => completions::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::try_parse_from(["scm", "st"]).unwrap();
        assert!(matches!(cli.command, Commands::Status(_)));
        let cli = Cli::try_parse_from(["scm", "ci", "-m", "message"]).unwrap();
        match cli.command {
            Commands::Commit(args) => assert_eq!(args.args, vec!["-m", "message"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_before_command() {
        let cli = Cli::try_parse_from(["scm", "-v", "status"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_grep_passes_options_through() {
        let cli = Cli::try_parse_from(["scm", "grep", "-i", "todo"]).unwrap();
        match cli.command {
            Commands::Grep(args) => assert_eq!(args.args, vec!["-i", "todo"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_grep_requires_pattern() {
        assert!(Cli::try_parse_from(["scm", "grep"]).is_err());
    }

    #[test]
    fn test_underscore_command_names() {
        assert!(Cli::try_parse_from(["scm", "tag_contains", "1.0"]).is_ok());
        assert!(Cli::try_parse_from(["scm", "remove_untracked"]).is_ok());
    }

    #[test]
    fn test_status_takes_at_most_one_file() {
        assert!(Cli::try_parse_from(["scm", "status", "a"]).is_ok());
        assert!(Cli::try_parse_from(["scm", "status", "a", "b"]).is_err());
    }

    #[test]
    fn test_distclean_remove_flag() {
        let cli = Cli::try_parse_from(["scm", "distclean", "--remove"]).unwrap();
        match cli.command {
            Commands::Distclean(args) => assert!(args.remove),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_commands_without_arguments_reject_extras() {
        assert!(Cli::try_parse_from(["scm", "info", "extra"]).is_err());
        assert!(Cli::try_parse_from(["scm", "pull", "extra"]).is_err());
    }
}
