//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`TMUXDRIVE_TARGET`, `TMUXDRIVE_TMUX_BIN`,
//!    `TMUXDRIVE_COMMAND_TIMEOUT`, ...)
//! 2. TOML file specified via --config CLI flag
//! 3. ./tmuxdrive.toml in the current directory
//! 4. $XDG_CONFIG_HOME/tmuxdrive/tmuxdrive.toml (or
//!    ~/.config/tmuxdrive/tmuxdrive.toml)
//! 5. Built-in defaults
//!
//! CLI flags sit above all of these and are applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::execution::parse_duration_arg;
use crate::tmux::{PollLimit, PollPolicy, TmuxSettings};

mod defaults;
mod env;
mod sources;
mod types;

use env::apply_runtime_env_overrides;
use sources::read_config_text_with_sources;
pub use types::{
    Config, ExecTarget, LoadedConfig, PollingConfig, PromptConfig, RunConfig, TargetConfig,
    TargetKind, TmuxConfig,
};

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&config_text)?;
    apply_runtime_env_overrides(&mut config, &env_lookup)?;
    config.validate()?;
    Ok(LoadedConfig {
        config,
        source_path: source.path(),
    })
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
fn config_root_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}

// ---------------------------------------------------------------------------
// Validation and conversion
// ---------------------------------------------------------------------------

impl Config {
    /// Reject values no tmux session could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exec_target()?;
        if self.tmux.binary.trim().is_empty() {
            return Err(ConfigError::Invalid("tmux.binary cannot be empty".into()));
        }
        let polling = &self.polling;
        for (name, value) in [
            ("polling.prompt_attempts", polling.prompt_attempts),
            ("polling.capture_flush_attempts", polling.capture_flush_attempts),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        for (name, value) in [
            ("polling.prompt_interval_ms", polling.prompt_interval_ms),
            ("polling.output_interval_ms", polling.output_interval_ms),
            ("polling.completion_interval_ms", polling.completion_interval_ms),
            ("polling.capture_flush_interval_ms", polling.capture_flush_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        self.command_timeout()?;
        if self.prompt.suffixes.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "prompt.suffixes needs at least one non-empty suffix".into(),
            ));
        }
        let prefix = &self.run.end_marker_prefix;
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "run.end_marker_prefix `{prefix}` must be non-empty and contain no whitespace"
            )));
        }
        if prefix.contains('\'') {
            return Err(ConfigError::Invalid(
                "run.end_marker_prefix cannot contain single quotes".into(),
            ));
        }
        Ok(())
    }

    /// Execution target selected by `[target]`.
    pub fn exec_target(&self) -> Result<ExecTarget, ConfigError> {
        let named = |value: &Option<String>, field: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "target.{field} is required when target.kind = \"{}\"",
                        if field == "host" { "ssh" } else { "container" }
                    ))
                })
        };
        match self.target.kind {
            TargetKind::Local => Ok(ExecTarget::Local),
            TargetKind::Ssh => named(&self.target.host, "host").map(ExecTarget::Ssh),
            TargetKind::Container => {
                named(&self.target.container, "container").map(ExecTarget::Container)
            }
        }
    }

    /// Parsed `polling.command_timeout`.
    pub fn command_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        let Some(raw) = self.polling.command_timeout.as_deref() else {
            return Ok(None);
        };
        match parse_duration_arg(raw) {
            Some(limit) if !limit.is_zero() => Ok(Some(limit)),
            _ => Err(ConfigError::Invalid(format!(
                "invalid polling.command_timeout `{raw}`: expected e.g. 30s, 10m, 1h"
            ))),
        }
    }

    /// Service settings derived from `[tmux]`, `[polling]`, `[prompt]`, `[run]`.
    pub fn tmux_settings(&self) -> Result<TmuxSettings, ConfigError> {
        let polling = &self.polling;
        Ok(TmuxSettings {
            binary: self.tmux.binary.clone(),
            prompt_ready: PollPolicy::new(
                Duration::from_millis(polling.prompt_interval_ms),
                PollLimit::Attempts(polling.prompt_attempts),
            ),
            output_match_interval: Duration::from_millis(polling.output_interval_ms),
            command_completion_interval: Duration::from_millis(polling.completion_interval_ms),
            command_timeout: self.command_timeout()?,
            capture_flush: PollPolicy::new(
                Duration::from_millis(polling.capture_flush_interval_ms),
                PollLimit::Attempts(polling.capture_flush_attempts),
            ),
            prompt_suffixes: self
                .prompt
                .suffixes
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect(),
            end_marker_prefix: self.run.end_marker_prefix.clone(),
        })
    }
}
