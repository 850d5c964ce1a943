//! Named tmux session handle.

use tracing::{debug, info};

use crate::error::TmuxError;

use super::service::{validate_name, TmuxService};
use super::window::TmuxWindow;

/// Stateless handle to one tmux session; every query re-reads tmux.
#[derive(Clone)]
pub struct TmuxSession {
    service: TmuxService,
    name: String,
}

impl TmuxSession {
    pub(crate) fn new(service: TmuxService, name: &str) -> Result<Self, TmuxError> {
        Ok(Self {
            name: validate_name("session", name)?,
            service,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &TmuxService {
        &self.service
    }

    /// Handle for a window in this session. No tmux call is made.
    pub fn get_window_by_name(&self, name: &str) -> Result<TmuxWindow, TmuxError> {
        TmuxWindow::new(self.clone(), name)
    }

    pub async fn exists(&self) -> Result<bool, TmuxError> {
        Ok(self
            .service
            .list_session_names()
            .await?
            .iter()
            .any(|name| name == &self.name))
    }

    /// Create the session (with tmux's default window) unless it exists.
    pub async fn create(&self) -> Result<(), TmuxError> {
        if self.exists().await? {
            debug!(session = %self.name, changed = false, "tmux session already exists");
            return Ok(());
        }
        self.service
            .run_tmux(["new-session", "-d", "-s", self.name.as_str()])
            .await?;
        info!(session = %self.name, changed = true, "created tmux session");
        Ok(())
    }

    /// Kill the session and all of its windows unless it is already gone.
    pub async fn delete(&self) -> Result<(), TmuxError> {
        if !self.exists().await? {
            debug!(session = %self.name, changed = false, "tmux session already absent");
            return Ok(());
        }
        self.service
            .run_tmux(["kill-session", "-t", self.name.as_str()])
            .await?;
        info!(session = %self.name, changed = true, "deleted tmux session");
        Ok(())
    }

    pub async fn recreate(&self) -> Result<(), TmuxError> {
        self.delete().await?;
        self.create().await
    }

    /// Window names in tmux order; empty when the session does not exist.
    pub async fn list_window_names(&self) -> Result<Vec<String>, TmuxError> {
        if !self.exists().await? {
            return Ok(Vec::new());
        }
        let output = self
            .service
            .run_tmux([
                "list-windows",
                "-t",
                self.name.as_str(),
                "-F",
                "#{window_name}",
            ])
            .await?;
        Ok(output.stdout_as_lines())
    }
}
