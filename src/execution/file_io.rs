//! File helpers routed through command-capable executors.

use crate::error::ExecError;

use super::contracts::CommandExecutor;
use super::types::{RunCommandOptions, TemporaryFile};

/// Create an empty temp file with `mktemp` on the executor's target.
pub(super) async fn create_temporary_file_via_executor(
    executor: &(impl CommandExecutor + ?Sized),
) -> Result<TemporaryFile, ExecError> {
    let argv = vec![
        "mktemp".to_string(),
        "-t".to_string(),
        "tmuxdrive-capture.XXXXXXXXXX".to_string(),
    ];
    let path = executor.run_command_and_get_stdout_as_string(&argv).await?;
    let path = path.trim();
    if path.is_empty() {
        return Err(ExecError::ExecutionFailed(
            "mktemp returned an empty path".into(),
        ));
    }
    Ok(TemporaryFile::new(path))
}

/// Read a file via `cat` on the executor's target.
pub(super) async fn read_file_via_executor(
    executor: &(impl CommandExecutor + ?Sized),
    path: &str,
) -> Result<Vec<u8>, ExecError> {
    let argv = vec!["cat".to_string(), "--".to_string(), path.to_string()];
    let output = executor.run_command(&RunCommandOptions::new(argv)).await?;
    Ok(output.stdout)
}

/// Remove a file via `rm -f` on the executor's target.
pub(super) async fn remove_file_via_executor(
    executor: &(impl CommandExecutor + ?Sized),
    path: &str,
) -> Result<(), ExecError> {
    let argv = vec!["rm".to_string(), "-f".to_string(), "--".to_string(), path.to_string()];
    executor
        .run_command(&RunCommandOptions::new(argv))
        .await
        .map(|_| ())
}

/// Split file content on `\n` only, keeping `\r` bytes intact.
///
/// A terminating newline does not produce an extra empty line.
pub(crate) fn split_file_lines(content: &[u8]) -> Vec<Vec<u8>> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = content.strip_suffix(b"\n".as_slice()).unwrap_or(content);
    body.split(|&b| b == b'\n').map(<[u8]>::to_vec).collect()
}
