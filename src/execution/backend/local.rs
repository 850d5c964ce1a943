//! Local process executor.

use crate::error::ExecError;
use async_trait::async_trait;

use crate::execution::contracts::CommandExecutor;
use crate::execution::process::{require_program, run_process_with_options};
use crate::execution::types::{CommandOutput, LocalContext, RunCommandOptions, TemporaryFile};

#[async_trait]
impl CommandExecutor for LocalContext {
    fn summary(&self) -> String {
        "local".to_string()
    }

    async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, ExecError> {
        let program = require_program(options)?;
        run_process_with_options(program, &options.argv[1..], options).await
    }

    async fn create_empty_temporary_file(&self) -> Result<TemporaryFile, ExecError> {
        let file = tempfile::Builder::new()
            .prefix("tmuxdrive-capture-")
            .suffix(".log")
            .tempfile()
            .map_err(|e| ExecError::ExecutionFailed(format!("failed to create temp file: {e}")))?;
        // The tmux server appends to this path from another process, so the
        // file must outlive the handle.
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| ExecError::ExecutionFailed(format!("failed to keep temp file: {e}")))?;
        Ok(TemporaryFile::new(path.display().to_string()))
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, ExecError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| ExecError::ExecutionFailed(format!("failed to read {path}: {e}")))
    }

    async fn remove_file(&self, path: &str) -> Result<(), ExecError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExecError::ExecutionFailed(format!(
                "failed to remove {path}: {e}"
            ))),
        }
    }
}
