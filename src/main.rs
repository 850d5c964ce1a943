//! CLI entry point for tmuxdrive.

mod cli;

use clap::Parser;
use regex::Regex;
use std::io::Write;
use tmuxdrive::config::{load_config, Config, ExecTarget, TargetKind};
use tmuxdrive::error::{AppError, TmuxError};
use tmuxdrive::execution::{CommandOutput, ExecutionContext, RunCommandOptions};
use tmuxdrive::tmux::{TmuxService, TmuxWindow};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => {
            let _ = std::io::stdout().flush();
            std::process::exit(code);
        }
        Err(e) => {
            let _ = std::io::stdout().flush();
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// `TMUXDRIVE_LOG` wins over `RUST_LOG`; both fall back to `warn`.
fn init_tracing() {
    let filter = std::env::var("TMUXDRIVE_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<i32, AppError> {
    let loaded = load_config(args.config.as_deref())?;
    let mut config = loaded.config;
    apply_cli_overrides(&mut config, &args);
    config.validate()?;
    debug!(source = ?loaded.source_path, "configuration loaded");

    let context = match config.exec_target()? {
        ExecTarget::Local => ExecutionContext::local(),
        ExecTarget::Ssh(target) => ExecutionContext::ssh(target).await?,
        ExecTarget::Container(name) => ExecutionContext::container(name).await?,
    };
    let service = TmuxService::with_settings(context.executor(), config.tmux_settings()?);
    // Fail early with tmux's own error when the binary is missing on the target.
    let version = service.tmux_version().await?;
    debug!(target = %context.summary(), %version, "tmux available");

    dispatch(&service, args.command).await
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(host) = &args.ssh {
        config.target.kind = TargetKind::Ssh;
        config.target.host = Some(host.clone());
    }
    if let Some(container) = &args.container {
        config.target.kind = TargetKind::Container;
        config.target.container = Some(container.clone());
    }
    if let Some(binary) = &args.tmux_bin {
        config.tmux.binary = binary.clone();
    }
}

async fn dispatch(service: &TmuxService, command: Command) -> Result<i32, AppError> {
    match command {
        Command::Sessions => {
            for name in service.list_session_names().await? {
                println!("{name}");
            }
        }
        Command::Windows { session } => {
            let session = service.get_session_by_name(&session)?;
            for name in session.list_window_names().await? {
                println!("{name}");
            }
        }
        Command::Create { session, window } => match window {
            Some(window) => service.get_window_by_names(&session, &window)?.create().await?,
            None => service.get_session_by_name(&session)?.create().await?,
        },
        Command::Delete { session, window } => match window {
            Some(window) => service.get_window_by_names(&session, &window)?.delete().await?,
            None => service.get_session_by_name(&session)?.delete().await?,
        },
        Command::Recreate { session, window } => match window {
            Some(window) => {
                service
                    .get_window_by_names(&session, &window)?
                    .recreate()
                    .await?
            }
            None => service.get_session_by_name(&session)?.recreate().await?,
        },
        Command::Show {
            session,
            window,
            lines,
        } => {
            let window = service.get_window_by_names(&session, &window)?;
            match lines {
                Some(count) => {
                    let shown = window.get_shown_lines().await?;
                    let start = shown.len().saturating_sub(count);
                    for line in &shown[start..] {
                        println!("{line}");
                    }
                }
                None => print!("{}", window.get_shown_output().await?),
            }
        }
        Command::SendKeys {
            session,
            window,
            tokens,
        } => {
            service
                .get_window_by_names(&session, &window)?
                .send_keys(tokens.as_slice())
                .await?;
        }
        Command::WaitFor {
            session,
            window,
            regex,
            timeout,
        } => {
            let regex = Regex::new(&regex)
                .map_err(|e| AppError::Usage(format!("invalid regex `{regex}`: {e}")))?;
            service
                .get_window_by_names(&session, &window)?
                .wait_until_output_matches_regex(&regex, timeout)
                .await?;
        }
        Command::Run {
            session,
            window,
            allow_all_exit_codes,
            json,
            argv,
        } => {
            let window = service.get_window_by_names(&session, &window)?;
            let options = RunCommandOptions::new(argv).allow_all_exit_codes(allow_all_exit_codes);
            return run_in_window(&window, &options, json).await;
        }
    }
    Ok(0)
}

/// Print the command's stdout (or JSON) and hand back its exit code. A
/// rejected non-zero exit still prints what the command wrote.
async fn run_in_window(
    window: &TmuxWindow,
    options: &RunCommandOptions,
    json: bool,
) -> Result<i32, AppError> {
    let (output, failure) = match window.run_command(options).await {
        Ok(output) => (output, None),
        Err(TmuxError::CommandFailed {
            target,
            command,
            exit_code,
            stdout,
        }) => (
            CommandOutput::new(stdout, Vec::<u8>::new(), exit_code),
            Some(format!(
                "`{command}` in tmux window '{target}' exited with {exit_code}"
            )),
        ),
        Err(e) => return Err(e.into()),
    };

    if json {
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|e| AppError::Usage(format!("failed to encode output: {e}")))?;
        println!("{rendered}");
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&output.stdout)?;
        stdout.flush()?;
    }
    if let Some(failure) = failure {
        eprintln!("error: {failure}");
    }
    Ok(output.exit_code)
}
