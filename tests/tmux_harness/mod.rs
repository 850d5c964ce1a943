//! Private tmux server for the on-demand regression suite.
//!
//! Every harness gets its own socket and a minimal shell, so tests never
//! touch the user's tmux server or depend on their shell prompt.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use tempfile::TempDir;
use tmuxdrive::execution::ExecutionContext;
use tmuxdrive::tmux::{TmuxService, TmuxSettings};

pub struct TmuxHarness {
    dir: TempDir,
    socket: String,
}

impl TmuxHarness {
    pub fn start(scenario: &str) -> Result<Self, String> {
        verify_tmux_available()?;
        let dir = tempfile::Builder::new()
            .prefix("tmuxdrive-regression-")
            .tempdir()
            .map_err(|e| format!("failed to create temp dir: {e}"))?;
        let socket = format!("tmuxdrive-{scenario}-{}", std::process::id());

        let conf = dir.path().join("tmux.conf");
        fs::write(
            &conf,
            "set -g default-command 'env PS1=\"$ \" bash --norc --noprofile'\n",
        )
        .map_err(|e| format!("failed to write {}: {e}", conf.display()))?;

        let wrapper = dir.path().join("tmux");
        fs::write(
            &wrapper,
            format!(
                "#!/bin/sh\nexec tmux -L '{socket}' -f '{}' \"$@\"\n",
                conf.display()
            ),
        )
        .map_err(|e| format!("failed to write {}: {e}", wrapper.display()))?;
        fs::set_permissions(&wrapper, fs::Permissions::from_mode(0o755))
            .map_err(|e| format!("failed to chmod {}: {e}", wrapper.display()))?;

        Ok(Self { dir, socket })
    }

    pub fn service(&self) -> TmuxService {
        let settings = TmuxSettings {
            binary: self.dir.path().join("tmux").display().to_string(),
            ..TmuxSettings::default()
        };
        TmuxService::with_settings(ExecutionContext::local().executor(), settings)
    }
}

impl Drop for TmuxHarness {
    fn drop(&mut self) {
        let _ = Command::new("tmux")
            .args(["-L", &self.socket, "kill-server"])
            .output();
    }
}

fn verify_tmux_available() -> Result<(), String> {
    let output = Command::new("tmux")
        .arg("-V")
        .output()
        .map_err(|e| format!("tmux is required for this suite: {e}"))?;
    if !output.status.success() {
        return Err("`tmux -V` failed".to_string());
    }
    Ok(())
}
