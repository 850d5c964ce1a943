//! Unified error types for the automation engine.

use std::fmt;
use std::time::Duration;

use crate::execution::format_duration;

// ---------------------------------------------------------------------------
// ExecError
// ---------------------------------------------------------------------------

/// Errors arising from running a process on an execution target.
#[derive(Debug)]
pub enum ExecError {
    /// The caller supplied an argument vector or target that cannot be run.
    InvalidArguments(String),
    /// The process could not be spawned, or its I/O failed.
    ExecutionFailed(String),
    /// The process ran to completion but exited with a non-zero status.
    NonZeroExit {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process exceeded its caller-selected time limit.
    TimedOut { command: String, limit: Duration },
}

impl ExecError {
    /// Exit code of the failed process, when it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
            Self::ExecutionFailed(msg) => write!(f, "execution failed: {msg}"),
            Self::NonZeroExit {
                command,
                exit_code,
                stdout,
                stderr,
            } => {
                let details = if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                };
                if details.is_empty() {
                    write!(f, "`{command}` exited with {exit_code}")
                } else {
                    write!(f, "`{command}` exited with {exit_code}: {details}")
                }
            }
            Self::TimedOut { command, limit } => write!(
                f,
                "`{command}` timed out after {}",
                format_duration(*limit)
            ),
        }
    }
}

impl std::error::Error for ExecError {}

// ---------------------------------------------------------------------------
// TmuxError
// ---------------------------------------------------------------------------

/// Errors from the tmux service/session/window layer.
#[derive(Debug)]
pub enum TmuxError {
    /// Empty or whitespace-only session/window name.
    InvalidName(String),
    /// Underlying tmux (or capture file) invocation failed.
    Exec(ExecError),
    /// The window's last line never looked like an idle shell prompt.
    CliPromptNotReady { target: String, attempts: usize },
    /// A pane-output wait ran past its deadline.
    Timeout {
        target: String,
        regex: String,
        elapsed: Duration,
    },
    /// The pipe-pane capture did not have the expected shape.
    CaptureFormat(String),
    /// The end-marker line did not carry an integer exit code.
    ExitCodeParse { line: String },
    /// The command executed in the window exited non-zero.
    CommandFailed {
        target: String,
        command: String,
        exit_code: i32,
        /// Raw bytes the command printed before exiting.
        stdout: Vec<u8>,
    },
}

impl TmuxError {
    /// True for the prompt-readiness sentinel.
    pub fn is_cli_prompt_not_ready(&self) -> bool {
        matches!(self, Self::CliPromptNotReady { .. })
    }

    /// True when a bounded wait expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for TmuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(msg) => write!(f, "invalid tmux name: {msg}"),
            Self::Exec(e) => write!(f, "tmux: {e}"),
            Self::CliPromptNotReady { target, attempts } => write!(
                f,
                "tmux window '{target}' cli prompt not ready after {attempts} attempts"
            ),
            Self::Timeout {
                target,
                regex,
                elapsed,
            } => write!(
                f,
                "timed out after {} waiting for tmux window '{target}' output to match `{regex}`",
                format_duration(*elapsed)
            ),
            Self::CaptureFormat(msg) => write!(f, "unexpected tmux capture format: {msg}"),
            Self::ExitCodeParse { line } => {
                write!(f, "failed to parse exit code from end marker line `{line}`")
            }
            Self::CommandFailed {
                target,
                command,
                exit_code,
                stdout,
            } => {
                let text = String::from_utf8_lossy(stdout);
                let tail = text.trim();
                if tail.is_empty() {
                    write!(
                        f,
                        "`{command}` in tmux window '{target}' exited with {exit_code}"
                    )
                } else {
                    write!(
                        f,
                        "`{command}` in tmux window '{target}' exited with {exit_code}: {tail}"
                    )
                }
            }
        }
    }
}

impl std::error::Error for TmuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Exec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExecError> for TmuxError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// AppError: top-level
// ---------------------------------------------------------------------------

/// Top-level error type for the `tmuxdrive` binary.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Exec(ExecError),
    Tmux(TmuxError),
    /// Writing results to stdout failed.
    Io(std::io::Error),
    /// A CLI argument could not be interpreted.
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Exec(e) => write!(f, "exec: {e}"),
            Self::Tmux(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Usage(msg) => write!(f, "usage: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ExecError> for AppError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TmuxError> for AppError {
    fn from(e: TmuxError) -> Self {
        Self::Tmux(e)
    }
}
