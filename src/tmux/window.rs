//! Window handle: keystrokes, pane introspection, and the command protocol.

use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ExecError, TmuxError};
use crate::execution::{join_shell_args, CommandExecutor, CommandOutput, RunCommandOptions};

use super::capture::{capture_pane_args, line_from_bottom, shown_lines, trim_trailing_blank_lines};
use super::keys::{send_keys_args, KeyKind};
use super::poll::{poll_until, PollOutcome};
use super::prompt::is_prompt_only_line;
use super::run::{
    build_command_line, capture_has_end_marker, pane_shows_end_marker, parse_capture,
    pipe_pane_command,
};
use super::service::{validate_name, TmuxService, TmuxSettings};
use super::session::TmuxSession;

/// Stateless handle to `session:window`; every query re-reads tmux.
///
/// Only one command or key sequence may drive a window at a time.
/// Interleaved callers corrupt each other's capture.
#[derive(Clone)]
pub struct TmuxWindow {
    session: TmuxSession,
    name: String,
}

impl TmuxWindow {
    pub(crate) fn new(session: TmuxSession, name: &str) -> Result<Self, TmuxError> {
        Ok(Self {
            name: validate_name("window", name)?,
            session,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> &TmuxSession {
        &self.session
    }

    /// Human-readable address, `session:window`, used in logs and errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.session.name(), self.name)
    }

    /// Target handed to tmux. The `=` makes tmux match the window name
    /// exactly, so a name such as `2` never resolves to window index 2.
    fn tmux_target(&self) -> String {
        format!("{}:={}", self.session.name(), self.name)
    }

    fn service(&self) -> &TmuxService {
        self.session.service()
    }

    fn settings(&self) -> &TmuxSettings {
        self.service().settings()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub async fn exists(&self) -> Result<bool, TmuxError> {
        Ok(self
            .session
            .list_window_names()
            .await?
            .iter()
            .any(|name| name == &self.name))
    }

    /// Create the window, and its session when missing.
    pub async fn create(&self) -> Result<(), TmuxError> {
        if self.exists().await? {
            debug!(target = %self.address(), changed = false, "tmux window already exists");
            return Ok(());
        }
        let session = self.session.name();
        if self.session.exists().await? {
            let target = format!("{session}:");
            self.service()
                .run_tmux([
                    "new-window",
                    "-d",
                    "-t",
                    target.as_str(),
                    "-n",
                    self.name.as_str(),
                ])
                .await?;
        } else {
            self.service()
                .run_tmux(["new-session", "-d", "-s", session, "-n", self.name.as_str()])
                .await?;
        }
        info!(target = %self.address(), changed = true, "created tmux window");
        Ok(())
    }

    pub async fn delete(&self) -> Result<(), TmuxError> {
        if !self.exists().await? {
            debug!(target = %self.address(), changed = false, "tmux window already absent");
            return Ok(());
        }
        let target = self.tmux_target();
        self.service()
            .run_tmux(["kill-window", "-t", target.as_str()])
            .await?;
        info!(target = %self.address(), changed = true, "deleted tmux window");
        Ok(())
    }

    pub async fn recreate(&self) -> Result<(), TmuxError> {
        self.delete().await?;
        self.create().await
    }

    /// Delete the owning session with every window in it.
    pub async fn delete_session(&self) -> Result<(), TmuxError> {
        self.session.delete().await
    }

    // -----------------------------------------------------------------------
    // Keystrokes
    // -----------------------------------------------------------------------

    /// Send each token in order: named keys as-is, anything else as hex bytes.
    pub async fn send_keys<S: AsRef<str>>(&self, tokens: &[S]) -> Result<(), TmuxError> {
        let address = self.address();
        let target = self.tmux_target();
        for token in tokens {
            let token = token.as_ref();
            self.service()
                .run_tmux(send_keys_args(&target, token))
                .await?;
            info!(
                target = %address,
                changed = true,
                kind = KeyKind::of(token).as_str(),
                bytes = token.len(),
                "sent keys to tmux window"
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Pane introspection
    // -----------------------------------------------------------------------

    /// Full scrollback with wrapped lines joined and trailing blank rows removed.
    pub async fn get_shown_output(&self) -> Result<String, TmuxError> {
        let raw = self.capture_pane().await?;
        Ok(trim_trailing_blank_lines(&raw))
    }

    pub async fn get_shown_lines(&self) -> Result<Vec<String>, TmuxError> {
        let raw = self.capture_pane().await?;
        Ok(shown_lines(&raw))
    }

    /// Last shown line, or `""` for an empty pane.
    pub async fn get_latest_pane_line(&self) -> Result<String, TmuxError> {
        let lines = self.get_shown_lines().await?;
        Ok(line_from_bottom(&lines, 0).to_string())
    }

    pub async fn get_second_latest_pane_line(&self) -> Result<String, TmuxError> {
        let lines = self.get_shown_lines().await?;
        Ok(line_from_bottom(&lines, 1).to_string())
    }

    pub async fn is_output_matching_regex(&self, regex: &Regex) -> Result<bool, TmuxError> {
        Ok(regex.is_match(&self.get_shown_output().await?))
    }

    /// Poll the pane until `regex` matches or `timeout` passes.
    pub async fn wait_until_output_matches_regex(
        &self,
        regex: &Regex,
        timeout: Duration,
    ) -> Result<(), TmuxError> {
        let policy = self.settings().output_match_policy(timeout);
        let outcome = poll_until(policy, || async move {
            Ok::<_, TmuxError>(self.is_output_matching_regex(regex).await?.then_some(()))
        })
        .await?;
        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::Exhausted { elapsed, .. } => Err(TmuxError::Timeout {
                target: self.address(),
                regex: regex.as_str().to_string(),
                elapsed,
            }),
        }
    }

    /// Wait until the last pane line is an idle shell prompt.
    pub async fn wait_until_cli_prompt_ready(&self) -> Result<(), TmuxError> {
        let settings = self.settings();
        let suffixes = settings.prompt_suffixes.as_slice();
        let outcome = poll_until(settings.prompt_ready, || async move {
            let line = self.get_latest_pane_line().await?;
            Ok::<_, TmuxError>(is_prompt_only_line(&line, suffixes).then_some(()))
        })
        .await?;
        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::Exhausted { attempts, .. } => Err(TmuxError::CliPromptNotReady {
                target: self.address(),
                attempts,
            }),
        }
    }

    async fn capture_pane(&self) -> Result<String, TmuxError> {
        let output = self
            .service()
            .run_tmux(capture_pane_args(&self.tmux_target()))
            .await?;
        Ok(output.stdout_as_string())
    }

    // -----------------------------------------------------------------------
    // Command protocol
    // -----------------------------------------------------------------------

    /// Type `options.argv` into the window's shell and recover its stdout and
    /// exit status through a pipe-pane capture file.
    ///
    /// Waits for completion without a bound unless the service settings carry
    /// a `command_timeout`. stderr is interleaved into stdout by the terminal,
    /// so the returned `stderr` is always empty.
    pub async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, TmuxError> {
        if options.argv.is_empty() {
            return Err(ExecError::InvalidArguments("argv cannot be empty".into()).into());
        }
        self.create().await?;
        self.wait_until_cli_prompt_ready().await?;

        let executor: &dyn CommandExecutor = self.service().executor().as_ref();
        let capture = executor.create_empty_temporary_file().await?;
        let path = capture.local_path();
        let result = self.run_with_capture(options, path).await;
        if let Err(e) = executor.remove_file(path).await {
            warn!(target = %self.address(), path = %path, error = %e, "failed to remove tmux capture file");
        }
        result
    }

    async fn run_with_capture(
        &self,
        options: &RunCommandOptions,
        path: &str,
    ) -> Result<CommandOutput, TmuxError> {
        let address = self.address();
        let target = self.tmux_target();
        let command = join_shell_args(&options.argv);
        let pipe = pipe_pane_command(path);
        self.service()
            .run_tmux(["pipe-pane", "-t", target.as_str(), pipe.as_str()])
            .await?;
        info!(target = %address, command = %command, "started command in tmux window");

        let waited = self.send_and_wait_for_end_marker(options).await;
        let stopped = self
            .service()
            .run_tmux(["pipe-pane", "-t", target.as_str(), ""])
            .await;
        waited?;
        stopped?;

        let prefix = self.settings().end_marker_prefix.as_str();
        let lines = self.read_capture(path).await?;
        let parsed = parse_capture(&lines, prefix)?;
        info!(
            target = %address,
            command = %command,
            exit_code = parsed.exit_code,
            "command finished in tmux window"
        );

        if parsed.exit_code != 0 && !options.allow_all_exit_codes {
            return Err(TmuxError::CommandFailed {
                target: address,
                command,
                exit_code: parsed.exit_code,
                stdout: parsed.stdout,
            });
        }
        Ok(CommandOutput::new(
            parsed.stdout,
            Vec::<u8>::new(),
            parsed.exit_code,
        ))
    }

    async fn send_and_wait_for_end_marker(&self, options: &RunCommandOptions) -> Result<(), TmuxError> {
        let settings = self.settings();
        let prefix = settings.end_marker_prefix.as_str();
        let line = build_command_line(&options.argv, prefix);
        self.send_keys(&[line.as_str(), "enter"]).await?;

        let outcome = poll_until(settings.command_completion_policy(), || async move {
            let lines = self.get_shown_lines().await?;
            Ok::<_, TmuxError>(pane_shows_end_marker(&lines, prefix).then_some(()))
        })
        .await?;
        match outcome {
            PollOutcome::Ready(()) => Ok(()),
            PollOutcome::Exhausted { elapsed, .. } => Err(TmuxError::Timeout {
                target: self.address(),
                regex: format!("^{}", regex::escape(prefix)),
                elapsed,
            }),
        }
    }

    /// Read the capture file, retrying while pipe-pane has not flushed the
    /// marker line yet.
    async fn read_capture(&self, path: &str) -> Result<Vec<Vec<u8>>, TmuxError> {
        let settings = self.settings();
        let prefix = settings.end_marker_prefix.as_str();
        let executor: &dyn CommandExecutor = self.service().executor().as_ref();
        let outcome = poll_until(settings.capture_flush, || async move {
            let lines = executor.read_file_as_lines(path).await?;
            Ok::<_, TmuxError>(capture_has_end_marker(&lines, prefix).then_some(lines))
        })
        .await?;
        match outcome {
            PollOutcome::Ready(lines) => Ok(lines),
            PollOutcome::Exhausted { attempts, .. } => {
                warn!(target = %self.address(), attempts, "tmux capture file never showed the end marker");
                Ok(executor.read_file_as_lines(path).await?)
            }
        }
    }
}
