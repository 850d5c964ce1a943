//! Configuration data model.
//!
//! Struct/enum definitions plus default values. Loading and precedence live
//! in `config::mod`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tmux::{DEFAULT_END_MARKER_PREFIX, DEFAULT_PROMPT_SUFFIXES};

use super::defaults::{
    DEFAULT_CAPTURE_FLUSH_ATTEMPTS, DEFAULT_CAPTURE_FLUSH_INTERVAL_MS,
    DEFAULT_COMPLETION_INTERVAL_MS, DEFAULT_OUTPUT_INTERVAL_MS, DEFAULT_PROMPT_ATTEMPTS,
    DEFAULT_PROMPT_INTERVAL_MS, DEFAULT_TMUX_BINARY,
};

/// Where the tmux server runs.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Local,
    Ssh,
    Container,
}

/// Top-level configuration, as stored in `tmuxdrive.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub tmux: TmuxConfig,
    pub polling: PollingConfig,
    pub prompt: PromptConfig,
    pub run: RunConfig,
}

/// `[target]`: execution target for every tmux call.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    pub kind: TargetKind,
    /// SSH destination (`user@host`) when `kind = "ssh"`.
    pub host: Option<String>,
    /// Container id/name when `kind = "container"`.
    pub container: Option<String>,
}

/// `[tmux]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmuxConfig {
    pub binary: String,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_TMUX_BINARY.to_string(),
        }
    }
}

/// `[polling]`: intervals and budgets of every wait loop.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub prompt_attempts: usize,
    pub prompt_interval_ms: u64,
    pub output_interval_ms: u64,
    pub completion_interval_ms: u64,
    /// Bound on waiting for a command to finish, e.g. `"10m"`.
    /// Absent means wait forever.
    pub command_timeout: Option<String>,
    pub capture_flush_attempts: usize,
    pub capture_flush_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            prompt_attempts: DEFAULT_PROMPT_ATTEMPTS,
            prompt_interval_ms: DEFAULT_PROMPT_INTERVAL_MS,
            output_interval_ms: DEFAULT_OUTPUT_INTERVAL_MS,
            completion_interval_ms: DEFAULT_COMPLETION_INTERVAL_MS,
            command_timeout: None,
            capture_flush_attempts: DEFAULT_CAPTURE_FLUSH_ATTEMPTS,
            capture_flush_interval_ms: DEFAULT_CAPTURE_FLUSH_INTERVAL_MS,
        }
    }
}

/// `[prompt]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PromptConfig {
    /// Trailing characters of an idle shell prompt line.
    pub suffixes: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_PROMPT_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// `[run]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Literal starting the exit-status line. Output lines starting with it
    /// end a command early, so pick something no command prints.
    pub end_marker_prefix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            end_marker_prefix: DEFAULT_END_MARKER_PREFIX.to_string(),
        }
    }
}

/// Resolved execution target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecTarget {
    Local,
    Ssh(String),
    Container(String),
}

/// Loaded configuration plus the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// `None` when built-in defaults were used.
    pub source_path: Option<PathBuf>,
}
