//! Executor contract consumed by the tmux layer.

use crate::error::ExecError;
use async_trait::async_trait;

use super::file_io::{
    create_temporary_file_via_executor, read_file_via_executor, remove_file_via_executor,
    split_file_lines,
};
use super::types::{CommandOutput, RunCommandOptions, TemporaryFile};

/// Runs argument vectors on one execution target.
///
/// Only `summary` and `run_command` are required. File helpers default to
/// shelling out through `run_command` so the file lives next to whatever
/// the executor drives; local executors override them with direct I/O.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Human-readable target summary for logs and CLI output.
    fn summary(&self) -> String;

    /// Execute one command. Non-zero exits are errors unless
    /// `options.allow_all_exit_codes` is set.
    async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, ExecError>;

    async fn run_command_and_get_stdout_as_string(
        &self,
        argv: &[String],
    ) -> Result<String, ExecError> {
        let output = self.run_command(&RunCommandOptions::new(argv.to_vec())).await?;
        Ok(output.stdout_as_string())
    }

    async fn run_command_and_get_stdout_as_lines(
        &self,
        argv: &[String],
    ) -> Result<Vec<String>, ExecError> {
        let output = self.run_command(&RunCommandOptions::new(argv.to_vec())).await?;
        Ok(output.stdout_as_lines())
    }

    /// Create a fresh, empty file on the target.
    async fn create_empty_temporary_file(&self) -> Result<TemporaryFile, ExecError> {
        create_temporary_file_via_executor(self).await
    }

    /// Read a target-side file as raw bytes.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, ExecError> {
        read_file_via_executor(self, path).await
    }

    /// Read a target-side file as `\n`-separated byte lines. `\r` bytes and
    /// invalid UTF-8 are kept as written.
    async fn read_file_as_lines(&self, path: &str) -> Result<Vec<Vec<u8>>, ExecError> {
        Ok(split_file_lines(&self.read_file(path).await?))
    }

    /// Remove a target-side file; absent files are not an error.
    async fn remove_file(&self, path: &str) -> Result<(), ExecError> {
        remove_file_via_executor(self, path).await
    }
}
