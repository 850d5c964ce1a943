//! Process and shell helpers shared by execution backends.

use crate::error::ExecError;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::types::{CommandOutput, ContainerEngine, ContainerEngineKind, RunCommandOptions};

/// Spawn a program, wait for it, and apply the caller's exit-code policy.
pub(super) async fn run_process_with_options(
    program: &str,
    args: &[String],
    options: &RunCommandOptions,
) -> Result<CommandOutput, ExecError> {
    let command = join_shell_args(&options.argv);
    let output = match options.timeout {
        None => run_process(program, args).await?,
        Some(limit) => match timeout(limit, run_process(program, args)).await {
            Ok(out) => out?,
            Err(_) => {
                return Err(ExecError::TimedOut {
                    command,
                    limit,
                })
            }
        },
    };
    debug!(
        command = %command,
        exit_code = output.exit_code,
        "process finished"
    );
    if options.allow_all_exit_codes {
        return Ok(output);
    }
    output.check_exit_success(&command)
}

/// Spawn and wait for a process, capturing stdout and stderr.
pub(super) async fn run_process(program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
    let mut cmd = Command::new(program);
    // Dropping the owning future must not leave stray tmux/ssh children.
    cmd.kill_on_drop(true);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd
        .output()
        .await
        .map_err(|e| ExecError::ExecutionFailed(format!("{program}: {e}")))?;

    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Reject argument vectors that cannot name a program.
pub(super) fn require_program(options: &RunCommandOptions) -> Result<&str, ExecError> {
    match options.argv.first() {
        Some(program) if !program.trim().is_empty() => Ok(program.as_str()),
        _ => Err(ExecError::InvalidArguments(
            "command argv must start with a program name".into(),
        )),
    }
}

/// Human-oriented duration formatting used in error messages.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    if secs == 0 {
        return format!("{millis}ms");
    }
    if millis == 0 {
        if secs % 3600 == 0 {
            return format!("{}h", secs / 3600);
        }
        if secs % 60 == 0 {
            return format!("{}m", secs / 60);
        }
        return format!("{secs}s");
    }
    format!("{secs}.{millis:03}s")
}

/// Parse `250ms`, `2s`, `5m`, `1h`, `1d` or a bare number of seconds.
pub fn parse_duration_arg(input: &str) -> Option<Duration> {
    let s = input.trim().to_ascii_lowercase();
    if s.is_empty() {
        return None;
    }

    let (digits, unit) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, "ms")
    } else if let Some(last) = s.chars().last() {
        if last.is_ascii_alphabetic() {
            (&s[..s.len() - 1], &s[s.len() - 1..])
        } else {
            (s.as_str(), "s")
        }
    } else {
        return None;
    };
    let value = digits.parse::<u64>().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value
            .checked_mul(60)
            .and_then(|v| v.checked_mul(60))
            .map(Duration::from_secs),
        "d" => value
            .checked_mul(24)
            .and_then(|v| v.checked_mul(60))
            .and_then(|v| v.checked_mul(60))
            .map(Duration::from_secs),
        _ => None,
    }
}

/// Shell-safe single-quote escaping.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        "''".into()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Join an argument vector into one POSIX shell line.
///
/// Words made only of unambiguous characters are left bare so the typed
/// line stays readable in the pane; everything else is single-quoted.
pub fn join_shell_args(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if !arg.is_empty() && arg.chars().all(is_shell_safe_char) {
                arg.clone()
            } else {
                shell_quote(arg)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_shell_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ',' | ':' | '+' | '@' | '%')
}

/// Detect docker/podman frontend availability and compatibility mode.
pub(super) async fn detect_container_engine() -> Result<ContainerEngine, ExecError> {
    if let Some(version) = detect_version("docker").await? {
        let kind = docker_frontend_kind(&version);
        return Ok(ContainerEngine {
            command: "docker",
            kind,
        });
    }

    if detect_version("podman").await?.is_some() {
        return Ok(ContainerEngine {
            command: "podman",
            kind: ContainerEngineKind::Podman,
        });
    }

    Err(ExecError::ExecutionFailed(
        "neither `docker` nor `podman` was found in PATH".into(),
    ))
}

async fn detect_version(command: &str) -> Result<Option<String>, ExecError> {
    let output = match Command::new(command).arg("--version").output().await {
        Ok(out) => out,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ExecError::ExecutionFailed(format!(
                "failed to query {command}: {e}"
            )))
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(Some(format!("{stdout}\n{stderr}")))
}

/// Infer container frontend compatibility when docker binary is present.
pub(super) fn docker_frontend_kind(version_output: &str) -> ContainerEngineKind {
    let text = version_output.to_ascii_lowercase();
    if text.contains("podman") {
        ContainerEngineKind::Podman
    } else {
        ContainerEngineKind::Docker
    }
}
