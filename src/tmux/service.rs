//! Process-wide handle to the tmux binary on one execution target.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{ExecError, TmuxError};
use crate::execution::{CommandExecutor, CommandOutput, RunCommandOptions};

use super::keys;
use super::poll::PollPolicy;
use super::prompt::DEFAULT_PROMPT_SUFFIXES;
use super::run::DEFAULT_END_MARKER_PREFIX;
use super::session::TmuxSession;
use super::window::TmuxWindow;

/// Tunables shared by every session and window built from one service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TmuxSettings {
    /// tmux executable name or path on the target.
    pub binary: String,
    /// Prompt readiness probing before each command.
    pub prompt_ready: PollPolicy,
    /// Interval between pane checks while waiting for a regex.
    pub output_match_interval: Duration,
    /// Interval between pane checks while waiting for the end marker.
    pub command_completion_interval: Duration,
    /// Optional bound on the end-marker wait. `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// Retries while the capture file lacks the marker line.
    pub capture_flush: PollPolicy,
    /// Line endings that identify an idle shell prompt.
    pub prompt_suffixes: Vec<String>,
    /// Literal that starts the exit-status line.
    pub end_marker_prefix: String,
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            binary: "tmux".to_string(),
            prompt_ready: PollPolicy::prompt_ready(),
            output_match_interval: PollPolicy::output_match(Duration::ZERO).interval,
            command_completion_interval: PollPolicy::command_completion(None).interval,
            command_timeout: None,
            capture_flush: PollPolicy::capture_flush(),
            prompt_suffixes: DEFAULT_PROMPT_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            end_marker_prefix: DEFAULT_END_MARKER_PREFIX.to_string(),
        }
    }
}

impl TmuxSettings {
    pub(crate) fn output_match_policy(&self, timeout: Duration) -> PollPolicy {
        PollPolicy {
            interval: self.output_match_interval,
            ..PollPolicy::output_match(timeout)
        }
    }

    pub(crate) fn command_completion_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.command_completion_interval,
            ..PollPolicy::command_completion(self.command_timeout)
        }
    }
}

/// Entry point: lists sessions and hands out session/window handles.
///
/// Cloning is cheap; clones share the executor and settings.
#[derive(Clone)]
pub struct TmuxService {
    executor: Arc<dyn CommandExecutor>,
    settings: Arc<TmuxSettings>,
}

impl TmuxService {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self::with_settings(executor, TmuxSettings::default())
    }

    pub fn with_settings(executor: Arc<dyn CommandExecutor>, settings: TmuxSettings) -> Self {
        Self {
            executor,
            settings: Arc::new(settings),
        }
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }

    pub fn settings(&self) -> &TmuxSettings {
        &self.settings
    }

    /// Names of all sessions on the server; empty when no server is running.
    pub async fn list_session_names(&self) -> Result<Vec<String>, TmuxError> {
        let output = self.run_tmux_allowing_failure(["ls"]).await?;
        if !output.is_success() {
            let stderr = output.stderr_as_string();
            if is_no_server_message(&stderr) {
                debug!(stderr = %stderr.trim(), "no tmux server running");
                return Ok(Vec::new());
            }
            return Err(TmuxError::Exec(ExecError::NonZeroExit {
                command: format!("{} ls", self.settings.binary),
                exit_code: output.exit_code,
                stdout: output.stdout_as_string(),
                stderr,
            }));
        }
        Ok(output
            .stdout_as_lines()
            .iter()
            .filter_map(|line| line.split_once(':').map(|(name, _)| name.to_string()))
            .collect())
    }

    /// Handle for `name`. No tmux call is made.
    pub fn get_session_by_name(&self, name: &str) -> Result<TmuxSession, TmuxError> {
        TmuxSession::new(self.clone(), name)
    }

    /// Handle for `session:window`. No tmux call is made.
    pub fn get_window_by_names(
        &self,
        session_name: &str,
        window_name: &str,
    ) -> Result<TmuxWindow, TmuxError> {
        self.get_session_by_name(session_name)?
            .get_window_by_name(window_name)
    }

    /// Whether `token` is sent as a named key rather than literal text.
    pub fn is_tmux_key(&self, token: &str) -> bool {
        keys::is_tmux_key(token)
    }

    /// `tmux -V` output, e.g. `tmux 3.4`.
    pub async fn tmux_version(&self) -> Result<String, TmuxError> {
        let output = self.run_tmux(["-V"]).await?;
        Ok(output.stdout_as_string().trim().to_string())
    }

    /// Run tmux with `args`; non-zero exits are errors.
    pub(crate) async fn run_tmux<I, S>(&self, args: I) -> Result<CommandOutput, TmuxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = RunCommandOptions::new(self.tmux_argv(args));
        Ok(self.executor.run_command(&options).await?)
    }

    /// Run tmux with `args` and return the output whatever the exit code.
    pub(crate) async fn run_tmux_allowing_failure<I, S>(
        &self,
        args: I,
    ) -> Result<CommandOutput, TmuxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = RunCommandOptions::new(self.tmux_argv(args)).allow_all_exit_codes(true);
        Ok(self.executor.run_command(&options).await?)
    }

    fn tmux_argv<I, S>(&self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        std::iter::once(self.settings.binary.clone())
            .chain(args.into_iter().map(Into::into))
            .collect()
    }
}

/// Reject empty or whitespace-only session/window names.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<String, TmuxError> {
    if name.trim().is_empty() {
        return Err(TmuxError::InvalidName(format!("{kind} name is empty")));
    }
    Ok(name.to_string())
}

fn is_no_server_message(stderr: &str) -> bool {
    stderr.contains("no server running") || stderr.contains("error connecting to")
}
