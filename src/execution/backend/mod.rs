//! Backend-specific executor implementations.
//!
//! Each module implements [`CommandExecutor`](super::CommandExecutor) for one
//! transport domain.

pub(super) mod container;
pub(super) mod local;
pub(super) mod ssh;
