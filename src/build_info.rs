//! Compile-time build metadata exposed to the CLI.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("TMUXDRIVE_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("TMUXDRIVE_BUILD_TIMESTAMP");

/// Version block used by `tmuxdrive --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("TMUXDRIVE_BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("TMUXDRIVE_BUILD_TIMESTAMP")
);

/// Help trailer block that surfaces build metadata in `tmuxdrive --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("TMUXDRIVE_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("TMUXDRIVE_BUILD_TIMESTAMP")
);
