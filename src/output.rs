//! # Output Configuration
//!
//! This module controls how `scm` presents its reports: whether the wrapped
//! tools are asked for colored output, and the small set of printing helpers
//! every repository operation shares (underlined titles, `+ command` traces).
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

/// Output configuration for controlling colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether `grep` and `git log` should be asked for colored output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode, colors are disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Value passed to `--color=` of the wrapped tools.
    pub fn color_arg(&self) -> &'static str {
        if self.use_color {
            "always"
        } else {
            "never"
        }
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Format a title block: `name: text` underlined with `=`.
pub fn title(name: &str, text: &str) -> String {
    let line = format!("{}: {}", name, text);
    let underline = "=".repeat(line.chars().count());
    format!("{}\n{}\n", line, underline)
}

/// Print a title block followed by an empty line.
pub fn print_title(name: &str, text: &str) {
    println!("{}", title(name, text));
}

/// Print a `+ command` trace line.
pub fn print_trace(text: &str) {
    println!("+ {}", text);
}

/// Print the output of a command under its trace line.
///
/// Trailing whitespace is dropped and an empty line is added after non-empty
/// output.
pub fn print_command_output(command: &str, output: &str) {
    print_trace(command);
    let output = output.trim_end();
    println!("{}", output);
    if !output.is_empty() {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_color_always() {
        let config = OutputConfig::from_env_and_flag("always");
        assert!(config.use_color);
        assert_eq!(config.color_arg(), "always");
    }

    #[test]
    fn test_color_never() {
        let config = OutputConfig::from_env_and_flag("never");
        assert!(!config.use_color);
        assert_eq!(config.color_arg(), "never");
    }

    #[test]
    fn test_color_flag_is_case_insensitive() {
        assert_eq!(
            OutputConfig::from_env_and_flag("ALWAYS"),
            OutputConfig::with_color()
        );
        assert_eq!(
            OutputConfig::from_env_and_flag("Never"),
            OutputConfig::without_color()
        );
    }

    #[test]
    fn test_title_is_underlined() {
        let text = title("lib/foo", "Status");
        assert_eq!(text, "lib/foo: Status\n===============\n");
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let text = title("dépôt", "Pull");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].chars().count(), lines[1].len());
    }

    #[test]
    #[serial]
    fn test_no_color_disables_auto_mode() {
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("auto");
        env::remove_var("NO_COLOR");
        assert!(!config.use_color);
    }

    #[test]
    #[serial]
    fn test_flag_overrides_no_color() {
        env::set_var("NO_COLOR", "1");
        let config = OutputConfig::from_env_and_flag("always");
        env::remove_var("NO_COLOR");
        assert!(config.use_color);
    }
}
