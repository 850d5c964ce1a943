//! Shared execution data structures and backend-local context types.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ExecError;

/// Structured process output.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CommandOutput {
    #[serde(serialize_with = "serialize_lossy")]
    pub stdout: Vec<u8>,
    #[serde(serialize_with = "serialize_lossy")]
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn stdout_as_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_as_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout split into lines, without a phantom trailing empty line.
    pub fn stdout_as_lines(&self) -> Vec<String> {
        self.stdout_as_string()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero status into [`ExecError::NonZeroExit`].
    pub fn check_exit_success(self, command: &str) -> Result<Self, ExecError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(ExecError::NonZeroExit {
            command: command.to_string(),
            exit_code: self.exit_code,
            stdout: self.stdout_as_string(),
            stderr: self.stderr_as_string(),
        })
    }
}

fn serialize_lossy<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Generic run-command configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunCommandOptions {
    /// Argument vector; `argv[0]` is the program.
    pub argv: Vec<String>,
    /// Return non-zero exits as regular output instead of an error.
    pub allow_all_exit_codes: bool,
    /// Wall-clock limit for process executors. Ignored by tmux windows.
    pub timeout: Option<Duration>,
}

impl RunCommandOptions {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn allow_all_exit_codes(mut self, allow: bool) -> Self {
        self.allow_all_exit_codes = allow;
        self
    }

    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

/// Empty file created on an execution target.
///
/// The path is local to the target host, which is also where the tmux
/// server writes its pipe-pane output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemporaryFile {
    path: String,
}

impl TemporaryFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn local_path(&self) -> &str {
        &self.path
    }
}

pub(super) struct LocalContext;

pub(super) struct SshContext {
    pub(super) target: String,
    pub(super) control_path: PathBuf,
}

pub(super) struct ContainerContext {
    pub(super) engine: ContainerEngine,
    pub(super) container: String,
}

pub(super) struct ContainerEngine {
    pub(super) command: &'static str,
    pub(super) kind: ContainerEngineKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum ContainerEngineKind {
    Docker,
    Podman,
}
