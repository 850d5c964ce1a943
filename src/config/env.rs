//! `TMUXDRIVE_*` environment overrides.
//!
//! Environment values replace file values; CLI flags are applied later by
//! the binary and replace both.

use crate::error::ConfigError;

use super::types::{Config, TargetKind};

pub(super) const ENV_TARGET: &str = "TMUXDRIVE_TARGET";
pub(super) const ENV_SSH_HOST: &str = "TMUXDRIVE_SSH_HOST";
pub(super) const ENV_CONTAINER: &str = "TMUXDRIVE_CONTAINER";
pub(super) const ENV_TMUX_BIN: &str = "TMUXDRIVE_TMUX_BIN";
pub(super) const ENV_COMMAND_TIMEOUT: &str = "TMUXDRIVE_COMMAND_TIMEOUT";
pub(super) const ENV_PROMPT_SUFFIXES: &str = "TMUXDRIVE_PROMPT_SUFFIXES";
pub(super) const ENV_END_MARKER_PREFIX: &str = "TMUXDRIVE_END_MARKER_PREFIX";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(kind) = non_empty(env_lookup, ENV_TARGET) {
        config.target.kind = parse_target_kind(&kind)?;
    }
    if let Some(host) = non_empty(env_lookup, ENV_SSH_HOST) {
        config.target.host = Some(host);
    }
    if let Some(container) = non_empty(env_lookup, ENV_CONTAINER) {
        config.target.container = Some(container);
    }
    if let Some(binary) = non_empty(env_lookup, ENV_TMUX_BIN) {
        config.tmux.binary = binary;
    }
    if let Some(timeout) = non_empty(env_lookup, ENV_COMMAND_TIMEOUT) {
        config.polling.command_timeout = Some(timeout);
    }
    if let Some(suffixes) = non_empty(env_lookup, ENV_PROMPT_SUFFIXES) {
        // Comma-separated, e.g. `$,#,❯`.
        config.prompt.suffixes = suffixes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(prefix) = non_empty(env_lookup, ENV_END_MARKER_PREFIX) {
        config.run.end_marker_prefix = prefix;
    }
    Ok(())
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_target_kind(raw: &str) -> Result<TargetKind, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "local" => Ok(TargetKind::Local),
        "ssh" => Ok(TargetKind::Ssh),
        "container" => Ok(TargetKind::Container),
        other => Err(ConfigError::Invalid(format!(
            "invalid {ENV_TARGET} value `{other}`: expected local, ssh, or container"
        ))),
    }
}
