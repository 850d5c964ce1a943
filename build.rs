//! Embeds the commit and build time shown by `tmuxdrive --version`.
//!
//! `TMUXDRIVE_BUILD_GIT_HASH` and `TMUXDRIVE_BUILD_TIMESTAMP` override the
//! detected values. `SOURCE_DATE_EPOCH` pins the timestamp for reproducible
//! builds.

use std::env;
use std::fs;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const HASH_VAR: &str = "TMUXDRIVE_BUILD_GIT_HASH";
const TIMESTAMP_VAR: &str = "TMUXDRIVE_BUILD_TIMESTAMP";

fn main() {
    for var in [HASH_VAR, TIMESTAMP_VAR, "SOURCE_DATE_EPOCH"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    watch_git_head();

    let git_hash = env::var(HASH_VAR).unwrap_or_else(|_| describe_commit());
    let timestamp = env::var(TIMESTAMP_VAR).unwrap_or_else(|_| format_utc(build_epoch_secs()));

    println!("cargo:rustc-env={HASH_VAR}={git_hash}");
    println!("cargo:rustc-env={TIMESTAMP_VAR}={timestamp}");
}

/// Rebuild when HEAD moves, either to another branch or to a new commit.
fn watch_git_head() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    let reference = fs::read_to_string(".git/HEAD")
        .ok()
        .and_then(|head| head.trim().strip_prefix("ref: ").map(str::to_string));
    if let Some(reference) = reference {
        println!("cargo:rerun-if-changed=.git/{reference}");
    }
}

/// Short commit hash, suffixed with `-dirty` for uncommitted changes.
fn describe_commit() -> String {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty=-dirty", "--abbrev=12"])
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if text.is_empty() {
                "unknown".to_string()
            } else {
                text
            }
        }
        _ => "unknown".to_string(),
    }
}

fn build_epoch_secs() -> u64 {
    if let Some(pinned) = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
    {
        return pinned;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|delta| delta.as_secs())
        .unwrap_or(0)
}

/// `YYYY-MM-DDTHH:MM:SSZ` for seconds since the Unix epoch.
fn format_utc(epoch_secs: u64) -> String {
    let days = (epoch_secs / 86_400) as i64;
    let rem = epoch_secs % 86_400;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Proleptic Gregorian date for a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
