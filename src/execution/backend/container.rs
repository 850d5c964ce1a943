//! Container executor (`docker exec` / `podman exec`).

use crate::error::ExecError;
use async_trait::async_trait;

use crate::execution::contracts::CommandExecutor;
use crate::execution::process::{require_program, run_process_with_options};
use crate::execution::types::{
    CommandOutput, ContainerContext, ContainerEngineKind, RunCommandOptions,
};

impl ContainerContext {
    /// `exec` arguments that run `argv` inside the container.
    ///
    /// `exec` takes an argument vector directly, so no shell re-parses it.
    pub(in crate::execution) fn exec_args(&self, argv: &[String]) -> Vec<String> {
        let mut args = Vec::with_capacity(argv.len() + 2);
        args.push("exec".to_string());
        args.push(self.container.clone());
        args.extend(argv.iter().cloned());
        args
    }
}

#[async_trait]
impl CommandExecutor for ContainerContext {
    fn summary(&self) -> String {
        format!(
            "container:{} (via {}{})",
            self.container,
            self.engine.command,
            if self.engine.kind == ContainerEngineKind::Podman {
                ", podman-compatible"
            } else {
                ""
            }
        )
    }

    async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, ExecError> {
        require_program(options)?;
        let args = self.exec_args(&options.argv);
        run_process_with_options(self.engine.command, &args, options).await
    }
}
