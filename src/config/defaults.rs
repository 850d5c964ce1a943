//! Default configuration constants.

/// Config file name looked up locally and under the config root.
pub(super) const CONFIG_FILE_NAME: &str = "tmuxdrive.toml";
/// Directory under `$XDG_CONFIG_HOME` (or `~/.config`).
pub(super) const CONFIG_DIR_NAME: &str = "tmuxdrive";
/// tmux executable looked up on the target's `PATH`.
pub(super) const DEFAULT_TMUX_BINARY: &str = "tmux";
/// Prompt checks before a window is declared not ready.
pub(super) const DEFAULT_PROMPT_ATTEMPTS: usize = 30;
pub(super) const DEFAULT_PROMPT_INTERVAL_MS: u64 = 100;
pub(super) const DEFAULT_OUTPUT_INTERVAL_MS: u64 = 100;
pub(super) const DEFAULT_COMPLETION_INTERVAL_MS: u64 = 200;
/// Capture-file reads while pipe-pane has not flushed the marker.
pub(super) const DEFAULT_CAPTURE_FLUSH_ATTEMPTS: usize = 20;
pub(super) const DEFAULT_CAPTURE_FLUSH_INTERVAL_MS: u64 = 100;
