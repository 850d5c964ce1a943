//! tmuxdrive: drive interactive shells inside tmux.
//!
//! Commands are typed into a tmux window the way a person would type them.
//! Their stdout and exit status are then recovered from the pane through an
//! end-marker protocol. The tmux server can be local, on a remote host over
//! SSH, or inside a container.
//!
//! # Quick start
//!
//! ```no_run
//! use tmuxdrive::execution::{ExecutionContext, RunCommandOptions};
//! use tmuxdrive::tmux::TmuxService;
//!
//! # async fn example() -> Result<(), tmuxdrive::error::TmuxError> {
//! let service = TmuxService::new(ExecutionContext::local().executor());
//! let window = service.get_window_by_names("build", "shell")?;
//! let output = window
//!     .run_command(&RunCommandOptions::new(["echo", "hello"]))
//!     .await?;
//! assert_eq!(output.stdout_as_string(), "hello\n");
//! # Ok(())
//! # }
//! ```

pub mod build_info;
pub mod config;
pub mod error;
pub mod execution;
#[cfg(test)]
pub mod testsupport;
pub mod tmux;
