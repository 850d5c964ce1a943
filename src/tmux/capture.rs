//! `capture-pane` arguments and rendered-screen normalization.

/// Arguments (after the tmux binary) that print the full scrollback of
/// `address` with wrapped lines joined.
pub(crate) fn capture_pane_args(address: &str) -> Vec<String> {
    ["capture-pane", "-J", "-p", "-S", "-", "-t", address]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Rendered pane text with trailing blank lines removed.
///
/// tmux pads the visible screen with empty rows below the cursor.
pub(crate) fn trim_trailing_blank_lines(raw: &str) -> String {
    let mut lines = shown_lines(raw);
    if lines.is_empty() {
        return String::new();
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Rendered pane lines without trailing blank rows.
pub(crate) fn shown_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = raw.lines().map(str::to_string).collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// `n`-th line counted from the bottom (0 = last), or `""`.
pub(crate) fn line_from_bottom(lines: &[String], n: usize) -> &str {
    lines
        .len()
        .checked_sub(n + 1)
        .and_then(|idx| lines.get(idx))
        .map(String::as_str)
        .unwrap_or("")
}
