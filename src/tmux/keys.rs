//! Keystroke classification and `send-keys` argument builders.

/// Keys tmux understands by name.
const NAMED_KEYS: &[&str] = &[
    "enter", "Enter", "Escape", "Tab", "BSpace", "Space", "Up", "Down", "Left", "Right", "Home",
    "End", "PageUp", "PageDown", "PPage", "NPage", "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8",
    "F9", "F10", "F11", "F12",
];

/// Punctuation allowed after a `C-`/`M-`/`S-` modifier.
const CHORD_PUNCTUATION: &[char] = &['[', ']', '\\', '/', '@', '^', '_', '?', ' '];

/// Whether `token` names a tmux key rather than literal text.
pub fn is_tmux_key(token: &str) -> bool {
    if NAMED_KEYS.contains(&token) {
        return true;
    }
    is_modifier_chord(token)
}

fn is_modifier_chord(token: &str) -> bool {
    let Some(rest) = token
        .strip_prefix("C-")
        .or_else(|| token.strip_prefix("M-"))
        .or_else(|| token.strip_prefix("S-"))
    else {
        return false;
    };
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => ch.is_ascii_alphanumeric() || CHORD_PUNCTUATION.contains(&ch),
        _ => false,
    }
}

/// How one token travels to tmux.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum KeyKind {
    Named,
    Literal,
}

impl KeyKind {
    pub(crate) fn of(token: &str) -> Self {
        if is_tmux_key(token) {
            Self::Named
        } else {
            Self::Literal
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Named => "named",
            Self::Literal => "literal",
        }
    }
}

/// Space-free lowercase hex bytes of `text`, one argument per byte.
pub(crate) fn hex_bytes(text: &str) -> Vec<String> {
    text.bytes().map(|b| format!("{b:02x}")).collect()
}

/// Arguments (after the tmux binary) that deliver one token to `address`.
pub(crate) fn send_keys_args(address: &str, token: &str) -> Vec<String> {
    let mut args = vec!["send-keys".to_string(), "-t".to_string(), address.to_string()];
    match KeyKind::of(token) {
        KeyKind::Named => args.push(token.to_string()),
        KeyKind::Literal => {
            args.push("-H".to_string());
            args.extend(hex_bytes(token));
        }
    }
    args
}
