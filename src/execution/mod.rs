//! Execution targets for the tmux binary.
//!
//! tmux (and the capture files it writes) can live on:
//! - the local machine (default)
//! - a running container (`docker exec` / `podman exec`)
//! - a remote host over SSH with a persistent master connection

mod backend;
mod contracts;
mod file_io;
mod process;
mod types;

use crate::error::ExecError;
use process::detect_container_engine;
use std::sync::Arc;
use types::{ContainerContext, LocalContext, SshContext};

pub use contracts::CommandExecutor;
pub use process::{format_duration, join_shell_args, parse_duration_arg, shell_quote};
pub use types::{CommandOutput, RunCommandOptions, TemporaryFile};

/// Shared handle to one execution target.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<dyn CommandExecutor>,
}

impl ExecutionContext {
    /// Build a local execution context.
    pub fn local() -> Self {
        Self {
            inner: Arc::new(LocalContext),
        }
    }

    /// Build a container execution context.
    pub async fn container(container: impl Into<String>) -> Result<Self, ExecError> {
        let container = container.into();
        if container.trim().is_empty() {
            return Err(ExecError::InvalidArguments(
                "container id/name cannot be empty".into(),
            ));
        }

        let engine = detect_container_engine().await?;
        Ok(Self {
            inner: Arc::new(ContainerContext { engine, container }),
        })
    }

    /// Build an SSH execution context with a persistent master connection.
    pub async fn ssh(target: impl Into<String>) -> Result<Self, ExecError> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(ExecError::InvalidArguments(
                "ssh target cannot be empty".into(),
            ));
        }
        let ctx = SshContext::connect(target).await?;
        Ok(Self {
            inner: Arc::new(ctx),
        })
    }

    pub fn summary(&self) -> String {
        self.inner.summary()
    }

    /// The executor shared by every handle built from this context.
    pub fn executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::clone(&self.inner)
    }
}
