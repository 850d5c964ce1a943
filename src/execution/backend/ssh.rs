//! SSH executor and control-socket lifecycle helpers.

use crate::error::ExecError;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Stdio;
#[cfg(test)]
use std::sync::{Mutex as StdMutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::execution::contracts::CommandExecutor;
use crate::execution::process::{
    join_shell_args, require_program, run_process, run_process_with_options,
};
use crate::execution::types::{CommandOutput, RunCommandOptions, SshContext};

impl SshContext {
    /// Open a persistent master connection for `target`.
    pub(in crate::execution) async fn connect(target: String) -> Result<Self, ExecError> {
        let control_path = build_ssh_control_path(&target);
        let open_result = run_process(
            "ssh",
            &[
                "-MNf".into(),
                "-o".into(),
                "ControlMaster=yes".into(),
                "-o".into(),
                "ControlPersist=yes".into(),
                "-o".into(),
                format!("ControlPath={}", control_path.display()),
                target.clone(),
            ],
        )
        .await?;
        open_result.check_exit_success("ssh -MNf").map_err(|e| {
            ExecError::ExecutionFailed(format!("failed to open persistent ssh connection: {e}"))
        })?;
        debug!(
            target = %target,
            control_path = %control_path.display(),
            "ssh control master opened"
        );
        Ok(Self {
            target,
            control_path,
        })
    }
}

#[async_trait]
impl CommandExecutor for SshContext {
    fn summary(&self) -> String {
        format!("ssh:{}", self.target)
    }

    async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, ExecError> {
        require_program(options)?;
        // The remote login shell re-parses the command, so argv is joined
        // with quoting rather than passed through.
        let remote_command = join_shell_args(&options.argv);
        let args = ssh_raw_args(&self.target, &self.control_path, &remote_command);
        run_process_with_options("ssh", &args, options).await
    }
}

impl Drop for SshContext {
    fn drop(&mut self) {
        close_ssh_control_connection(&self.target, &self.control_path);
    }
}

/// Arguments that run `remote_command` through the shared control socket.
fn ssh_raw_args(target: &str, control_path: &Path, remote_command: &str) -> Vec<String> {
    vec![
        "-T".into(),
        "-S".into(),
        control_path.display().to_string(),
        "-o".into(),
        "ControlMaster=no".into(),
        target.into(),
        remote_command.into(),
    ]
}

#[cfg(test)]
type SshCloseHook = Box<dyn Fn(&str, &Path) + Send + Sync + 'static>;

#[cfg(test)]
fn ssh_close_hook_slot() -> &'static StdMutex<Option<SshCloseHook>> {
    static SLOT: OnceLock<StdMutex<Option<SshCloseHook>>> = OnceLock::new();
    SLOT.get_or_init(|| StdMutex::new(None))
}

#[cfg(test)]
fn set_ssh_close_hook_for_tests(hook: Option<SshCloseHook>) {
    *ssh_close_hook_slot().lock().expect("ssh close hook lock") = hook;
}

/// Best-effort control-master shutdown; failures are logged and ignored.
pub(in crate::execution) fn close_ssh_control_connection(target: &str, control_path: &Path) {
    #[cfg(test)]
    {
        if let Some(hook) = ssh_close_hook_slot()
            .lock()
            .expect("ssh close hook lock")
            .as_ref()
        {
            hook(target, control_path);
            return;
        }
    }

    let status = std::process::Command::new("ssh")
        .arg("-S")
        .arg(control_path)
        .arg("-O")
        .arg("exit")
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        warn!(target = %target, error = %e, "failed to close ssh control master");
    }
    let _ = std::fs::remove_file(control_path);
}

pub(in crate::execution) fn build_ssh_control_path(target: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    target.hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    let hash = hasher.finish();
    std::env::temp_dir().join(format!("tmuxdrive-ssh-{hash:x}.sock"))
}
