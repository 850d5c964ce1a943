//! Shell prompt detection on rendered pane lines.

/// Prompt suffixes recognised when none are configured.
///
/// `>` and `%` are left out: bash's continuation prompt (`> `) and progress
/// lines such as `Downloading 45%` end with them. zsh users add `%` through
/// `[prompt] suffixes`.
pub const DEFAULT_PROMPT_SUFFIXES: &[&str] = &["$", "#"];

/// Whether `line` looks like an idle shell prompt with nothing typed after it.
///
/// tmux renders a prompt such as `user@host:~$ ` with the cursor after the
/// trailing space, so trailing whitespace is ignored before matching.
pub fn is_prompt_only_line<S: AsRef<str>>(line: &str, suffixes: &[S]) -> bool {
    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return false;
    }
    suffixes
        .iter()
        .map(AsRef::as_ref)
        .filter(|suffix| !suffix.is_empty())
        .any(|suffix| trimmed.ends_with(suffix))
}
