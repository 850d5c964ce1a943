//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use std::time::Duration;
use tmuxdrive::build_info::{HELP_BUILD_METADATA, LONG_VERSION};
use tmuxdrive::execution::parse_duration_arg;

/// Drive shells inside tmux: send keys, wait for output, run commands and
/// collect their stdout and exit status.
#[derive(Debug, Parser)]
#[command(
    name = "tmuxdrive",
    version,
    long_version = LONG_VERSION,
    after_help = HELP_BUILD_METADATA
)]
pub struct Args {
    /// Path to config file (default: ./tmuxdrive.toml or
    /// ~/.config/tmuxdrive/tmuxdrive.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Drive tmux on a remote host over SSH.
    #[arg(long = "ssh", conflicts_with = "container", global = true)]
    pub ssh: Option<String>,

    /// Drive tmux inside a running container.
    #[arg(long = "container", conflicts_with = "ssh", global = true)]
    pub container: Option<String>,

    /// tmux executable on the target.
    #[arg(long = "tmux-bin", value_name = "PATH", global = true)]
    pub tmux_bin: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tmux session names.
    Sessions,
    /// List window names of a session.
    Windows { session: String },
    /// Create a session, or a window (and its session when missing).
    Create {
        session: String,
        window: Option<String>,
    },
    /// Delete a session with all its windows, or a single window.
    Delete {
        session: String,
        window: Option<String>,
    },
    /// Delete then create a session or window.
    Recreate {
        session: String,
        window: Option<String>,
    },
    /// Print what the window currently shows.
    Show {
        session: String,
        window: String,
        /// Only print the last N lines.
        #[arg(long, value_name = "N")]
        lines: Option<usize>,
    },
    /// Send keys: named keys (enter, C-c, ...) as-is, anything else as text.
    SendKeys {
        session: String,
        window: String,
        #[arg(required = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
    /// Wait until the window output matches a regex.
    WaitFor {
        session: String,
        window: String,
        regex: String,
        /// How long to wait, e.g. 500ms, 2s, 1m.
        #[arg(long, default_value = "2s", value_parser = parse_timeout)]
        timeout: Duration,
    },
    /// Run a command at the window's shell prompt and exit with its status.
    Run {
        session: String,
        window: String,
        /// Do not report a non-zero exit as an error.
        #[arg(long)]
        allow_all_exit_codes: bool,
        /// Print stdout and exit code as JSON.
        #[arg(long)]
        json: bool,
        /// Command and arguments, after `--`.
        #[arg(last = true, required = true)]
        argv: Vec<String>,
    },
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    match parse_duration_arg(raw) {
        Some(limit) if !limit.is_zero() => Ok(limit),
        _ => Err(format!("invalid duration `{raw}` (expected e.g. 500ms, 2s, 1m)")),
    }
}
