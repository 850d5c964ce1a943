//! tmux automation: sessions, windows, keystrokes and the end-marker
//! command protocol.
//!
//! [`TmuxService`] wraps one execution target. It hands out stateless
//! [`TmuxSession`] and [`TmuxWindow`] handles that re-query tmux on every
//! call.

mod capture;
mod keys;
pub mod poll;
pub mod prompt;
mod run;
mod service;
mod session;
mod window;

pub use keys::is_tmux_key;
pub use poll::{poll_until, PollLimit, PollOutcome, PollPolicy};
pub use prompt::{is_prompt_only_line, DEFAULT_PROMPT_SUFFIXES};
pub use run::DEFAULT_END_MARKER_PREFIX;
pub use service::{TmuxService, TmuxSettings};
pub use session::TmuxSession;
pub use window::TmuxWindow;
