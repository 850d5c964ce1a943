//! End-marker command protocol: the typed line and capture-file parsing.

use crate::error::TmuxError;
use crate::execution::{join_shell_args, shell_quote};

use super::capture::line_from_bottom;

/// Literal that starts the line reporting a command's exit status.
pub const DEFAULT_END_MARKER_PREFIX: &str = "TMUXDRIVE_COMMAND_EXIT_CODE";

/// Shell line typed into the pane: the command, then a marker with `$?`.
///
/// The leading `\n` in the format string puts the marker on its own line
/// even when the command's output lacks a trailing newline.
pub(crate) fn build_command_line(argv: &[String], prefix: &str) -> String {
    format!(
        "{}; printf '\\n%s %s\\n' {} \"$?\"",
        join_shell_args(argv),
        shell_quote(prefix)
    )
}

/// Shell redirection handed to `pipe-pane` to append pane bytes to `path`.
pub(crate) fn pipe_pane_command(path: &str) -> String {
    format!("cat >> {}", shell_quote(path))
}

/// Whether the rendered pane shows the marker on one of its last two lines.
///
/// The shell usually redraws its prompt below the marker.
pub(crate) fn pane_shows_end_marker(lines: &[String], prefix: &str) -> bool {
    line_from_bottom(lines, 0).starts_with(prefix) || line_from_bottom(lines, 1).starts_with(prefix)
}

/// Whether the capture file already holds the marker line below the echo.
pub(crate) fn capture_has_end_marker(lines: &[Vec<u8>], prefix: &str) -> bool {
    lines
        .iter()
        .skip(1)
        .any(|line| strip_carriage_return(line).starts_with(prefix.as_bytes()))
}

/// Stdout and exit status recovered from one capture file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ParsedCapture {
    pub(crate) stdout: Vec<u8>,
    pub(crate) exit_code: i32,
}

/// Recover stdout and exit status from pipe-pane capture lines.
///
/// Layout: line 0 echoes the typed input, the last line starting with
/// `prefix` carries the exit status, and everything in between is output.
/// Anything after the marker (a redrawn prompt) is ignored. Output bytes are
/// kept as written; only the `\r` of each line ending is removed.
pub(crate) fn parse_capture(lines: &[Vec<u8>], prefix: &str) -> Result<ParsedCapture, TmuxError> {
    let lines: Vec<&[u8]> = lines.iter().map(|l| strip_carriage_return(l)).collect();
    if lines.len() < 2 {
        return Err(TmuxError::CaptureFormat(format!(
            "expected at least 2 captured lines, got {}",
            lines.len()
        )));
    }

    let body = &lines[1..];
    let Some(marker_idx) = body
        .iter()
        .rposition(|line| line.starts_with(prefix.as_bytes()))
    else {
        return Err(TmuxError::CaptureFormat(format!(
            "end marker `{prefix}` not found in {} captured lines",
            lines.len()
        )));
    };
    let exit_code = parse_exit_code(&String::from_utf8_lossy(body[marker_idx]), prefix)?;

    let mut output: Vec<&[u8]> = body[..marker_idx].to_vec();
    let Some(first) = output.first_mut() else {
        return Err(TmuxError::CaptureFormat(
            "no output lines between echoed input and end marker".into(),
        ));
    };
    // Shells emit escape sequences ending in `\r` once Enter is pressed.
    let line: &[u8] = *first;
    if let Some(cr) = line.iter().position(|&b| b == b'\r') {
        *first = &line[cr + 1..];
    }

    Ok(ParsedCapture {
        stdout: output.join(&b'\n'),
        exit_code,
    })
}

/// Parse `<prefix> <code>`.
pub(crate) fn parse_exit_code(line: &str, prefix: &str) -> Result<i32, TmuxError> {
    line.strip_prefix(prefix)
        .filter(|rest| rest.starts_with(' '))
        .and_then(|rest| rest.trim().parse::<i32>().ok())
        .ok_or_else(|| TmuxError::ExitCodeParse {
            line: line.to_string(),
        })
}

fn strip_carriage_return(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r".as_slice()).unwrap_or(line)
}
