//! Shared test fixtures for tmux-layer test modules.
//!
//! [`FakeTmux`] stands in for a tmux server behind the [`CommandExecutor`]
//! seam. It keeps sessions, windows, pane lines, pipe-pane targets and
//! capture files in memory, and plays a tiny shell for the command protocol.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use crate::error::ExecError;
use crate::execution::{CommandExecutor, CommandOutput, RunCommandOptions, TemporaryFile};
use crate::tmux::TmuxService;

const PROMPT: &str = "$ ";
/// Everything `build_command_line` appends after the user's command.
const MARKER_FRAGMENT: &str = "; printf '\\n%s %s\\n' ";
/// Bracketed-paste reset that bash prints once Enter is pressed.
const ENTER_ARTIFACT: &str = "\u{1b}[?2004l\r";

type Responder = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// In-memory tmux server. Clones share state.
#[derive(Clone)]
pub struct FakeTmux {
    state: Arc<StdMutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    server_running: bool,
    sessions: Vec<FakeSession>,
    invocations: Vec<Vec<String>>,
    failures: Vec<(String, i32, String)>,
    files: BTreeMap<String, Vec<u8>>,
    next_file: usize,
    file_reads: usize,
    capture_delay_reads: usize,
    delayed_capture: Option<DelayedCapture>,
    responder: Option<Responder>,
    exit_code: i32,
    completion_delay_polls: usize,
    capture_override: Option<Vec<String>>,
    pending: Option<PendingCompletion>,
}

struct FakeSession {
    name: String,
    windows: Vec<FakeWindow>,
}

struct FakeWindow {
    name: String,
    pane: Vec<String>,
    input: String,
    pipe: Option<String>,
}

impl FakeWindow {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pane: vec![PROMPT.to_string()],
            input: String::new(),
            pipe: None,
        }
    }
}

/// Output of a typed command that has not reached the pane yet.
struct PendingCompletion {
    address: String,
    polls_left: usize,
    pane_lines: Vec<String>,
    capture: String,
}

/// Capture bytes pipe-pane has not flushed to the file yet.
struct DelayedCapture {
    path: String,
    reads_left: usize,
    bytes: Vec<u8>,
}

impl Default for FakeTmux {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTmux {
    /// Window name tmux would give a session created without `-n`.
    pub const DEFAULT_WINDOW: &'static str = "bash";

    /// A running server with no sessions yet.
    pub fn new() -> Self {
        Self {
            state: Arc::new(StdMutex::new(FakeState {
                server_running: true,
                ..FakeState::default()
            })),
        }
    }

    /// `ls` reports that no server is running until a session is created.
    pub fn without_server(self) -> Self {
        self.lock().server_running = false;
        self
    }

    pub fn executor(&self) -> Arc<dyn CommandExecutor> {
        Arc::new(self.clone())
    }

    pub fn service(&self) -> TmuxService {
        TmuxService::new(self.executor())
    }

    pub fn add_session(&self, name: &str, windows: &[&str]) {
        let mut state = self.lock();
        state.server_running = true;
        state.sessions.push(FakeSession {
            name: name.to_string(),
            windows: windows.iter().map(|w| FakeWindow::new(w)).collect(),
        });
    }

    /// Replace the rendered lines of an existing window.
    pub fn set_pane(&self, session: &str, window: &str, lines: &[&str]) {
        let mut state = self.lock();
        let address = format!("{session}:{window}");
        let window = state
            .window_mut(&address)
            .unwrap_or_else(|| panic!("no fake window {address}"));
        window.pane = lines.iter().map(|l| l.to_string()).collect();
    }

    /// Lines appended to the pane when Enter submits a non-protocol line.
    pub fn on_enter<F>(&self, responder: F)
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.lock().responder = Some(Box::new(responder));
    }

    /// Exit status reported by every following protocol command.
    pub fn set_exit_code(&self, code: i32) {
        self.lock().exit_code = code;
    }

    /// Hold command output back for this many `capture-pane` calls.
    pub fn set_completion_delay_polls(&self, polls: usize) {
        self.lock().completion_delay_polls = polls;
    }

    /// Write these lines to the capture file instead of the real transcript.
    pub fn set_capture_override(&self, lines: Vec<String>) {
        self.lock().capture_override = Some(lines);
    }

    /// Keep each command's transcript out of the capture file for this many
    /// file reads, like a pipe-pane that flushes late.
    pub fn set_capture_delay_reads(&self, reads: usize) {
        self.lock().capture_delay_reads = reads;
    }

    /// Number of `read_file` calls served so far.
    pub fn file_reads(&self) -> usize {
        self.lock().file_reads
    }

    /// Make the next invocation of `subcommand` fail with `code` and `stderr`.
    pub fn fail_next(&self, subcommand: &str, code: i32, stderr: &str) {
        self.lock()
            .failures
            .push((subcommand.to_string(), code, stderr.to_string()));
    }

    /// Arguments of every tmux call, without the binary.
    pub fn tmux_invocations(&self) -> Vec<Vec<String>> {
        self.lock()
            .invocations
            .iter()
            .map(|argv| argv[1..].to_vec())
            .collect()
    }

    /// `argv[0]` of every call.
    pub fn programs(&self) -> Vec<String> {
        self.lock()
            .invocations
            .iter()
            .map(|argv| argv[0].clone())
            .collect()
    }

    pub fn count_invocations(&self, subcommand: &str) -> usize {
        self.lock()
            .invocations
            .iter()
            .filter(|argv| argv.get(1).map(String::as_str) == Some(subcommand))
            .count()
    }

    /// Paths of temporary files that have not been removed.
    pub fn live_files(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake tmux state lock")
    }
}

#[async_trait]
impl CommandExecutor for FakeTmux {
    fn summary(&self) -> String {
        "fake-tmux".to_string()
    }

    async fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput, ExecError> {
        if options.argv.is_empty() {
            return Err(ExecError::InvalidArguments("argv cannot be empty".into()));
        }
        let output = {
            let mut state = self.lock();
            state.invocations.push(options.argv.clone());
            state.dispatch(&options.argv[1..])
        };
        if options.allow_all_exit_codes {
            return Ok(output);
        }
        output.check_exit_success(&options.argv.join(" "))
    }

    async fn create_empty_temporary_file(&self) -> Result<TemporaryFile, ExecError> {
        let mut state = self.lock();
        state.next_file += 1;
        let path = format!("/tmp/fake-tmux-capture-{}.log", state.next_file);
        state.files.insert(path.clone(), Vec::new());
        Ok(TemporaryFile::new(path))
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, ExecError> {
        let mut state = self.lock();
        state.file_reads += 1;
        state.flush_delayed_capture(path);
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ExecError::ExecutionFailed(format!("no such file: {path}")))
    }

    async fn remove_file(&self, path: &str) -> Result<(), ExecError> {
        self.lock().files.remove(path);
        Ok(())
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::new(stdout.into(), Vec::<u8>::new(), 0)
}

fn fail(stderr: impl Into<String>) -> CommandOutput {
    CommandOutput::new(Vec::<u8>::new(), stderr.into(), 1)
}

/// Value following `flag` in `args`.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

impl FakeState {
    fn dispatch(&mut self, args: &[String]) -> CommandOutput {
        let Some(subcommand) = args.first().map(String::as_str) else {
            return fail("usage: tmux [-V] command\n");
        };
        if let Some(idx) = self.failures.iter().position(|(s, _, _)| s == subcommand) {
            let (_, code, stderr) = self.failures.remove(idx);
            return CommandOutput::new(Vec::<u8>::new(), stderr, code);
        }
        let rest = &args[1..];
        match subcommand {
            "-V" => ok("tmux 3.4\n"),
            "ls" => self.list_sessions(),
            "new-session" => self.new_session(rest),
            "new-window" => self.new_window(rest),
            "kill-session" => self.kill_session(rest),
            "kill-window" => self.kill_window(rest),
            "list-windows" => self.list_windows(rest),
            "send-keys" => self.send_keys(rest),
            "capture-pane" => self.capture_pane(rest),
            "pipe-pane" => self.pipe_pane(rest),
            other => fail(format!("unknown command: {other}\n")),
        }
    }

    fn session_mut(&mut self, name: &str) -> Option<&mut FakeSession> {
        self.sessions.iter_mut().find(|s| s.name == name)
    }

    /// Resolve `session:window`, also accepting tmux's exact-match `=` form.
    fn window_mut(&mut self, address: &str) -> Option<&mut FakeWindow> {
        let (session, window) = address.split_once(':')?;
        let window = window.strip_prefix('=').unwrap_or(window);
        self.session_mut(session)?
            .windows
            .iter_mut()
            .find(|w| w.name == window)
    }

    fn list_sessions(&self) -> CommandOutput {
        if !self.server_running || self.sessions.is_empty() {
            return fail("no server running on /tmp/tmux-1000/default\n");
        }
        ok(self
            .sessions
            .iter()
            .map(|s| {
                format!(
                    "{}: {} windows (created Fri Oct 16 09:00:00 2026)\n",
                    s.name,
                    s.windows.len()
                )
            })
            .collect::<String>())
    }

    fn new_session(&mut self, args: &[String]) -> CommandOutput {
        let Some(name) = flag_value(args, "-s") else {
            return fail("new-session: missing -s\n");
        };
        if self.sessions.iter().any(|s| s.name == name) {
            return fail(format!("duplicate session: {name}\n"));
        }
        let window = flag_value(args, "-n").unwrap_or(FakeTmux::DEFAULT_WINDOW);
        self.server_running = true;
        self.sessions.push(FakeSession {
            name: name.to_string(),
            windows: vec![FakeWindow::new(window)],
        });
        ok("")
    }

    fn new_window(&mut self, args: &[String]) -> CommandOutput {
        let target = flag_value(args, "-t").unwrap_or_default();
        let session_name = target.trim_end_matches(':').to_string();
        let Some(name) = flag_value(args, "-n").map(str::to_string) else {
            return fail("new-window: missing -n\n");
        };
        match self.session_mut(&session_name) {
            Some(session) => {
                session.windows.push(FakeWindow::new(&name));
                ok("")
            }
            None => fail(format!("can't find session: {session_name}\n")),
        }
    }

    fn kill_session(&mut self, args: &[String]) -> CommandOutput {
        let name = flag_value(args, "-t").unwrap_or_default();
        let before = self.sessions.len();
        self.sessions.retain(|s| s.name != name);
        if self.sessions.len() == before {
            return fail(format!("can't find session: {name}\n"));
        }
        ok("")
    }

    fn kill_window(&mut self, args: &[String]) -> CommandOutput {
        let address = flag_value(args, "-t").unwrap_or_default().to_string();
        let Some((session_name, window_name)) = address.split_once(':') else {
            return fail(format!("can't find window: {address}\n"));
        };
        let window_name = window_name.strip_prefix('=').unwrap_or(window_name);
        let Some(session) = self.session_mut(session_name) else {
            return fail(format!("can't find session: {session_name}\n"));
        };
        let before = session.windows.len();
        session.windows.retain(|w| w.name != window_name);
        if session.windows.len() == before {
            return fail(format!("can't find window: {window_name}\n"));
        }
        // tmux destroys a session together with its last window.
        if session.windows.is_empty() {
            self.sessions.retain(|s| s.name != session_name);
        }
        ok("")
    }

    fn list_windows(&mut self, args: &[String]) -> CommandOutput {
        let name = flag_value(args, "-t").unwrap_or_default().to_string();
        match self.session_mut(&name) {
            Some(session) => ok(session
                .windows
                .iter()
                .map(|w| format!("{}\n", w.name))
                .collect::<String>()),
            None => fail(format!("can't find session: {name}\n")),
        }
    }

    fn send_keys(&mut self, args: &[String]) -> CommandOutput {
        let address = flag_value(args, "-t").unwrap_or_default().to_string();
        let keys = &args[2.min(args.len())..];
        let submitted = {
            let Some(window) = self.window_mut(&address) else {
                return fail(format!("can't find pane: {address}\n"));
            };
            match keys.first().map(String::as_str) {
                Some("-H") => {
                    let bytes: Vec<u8> = keys[1..]
                        .iter()
                        .filter_map(|b| u8::from_str_radix(b, 16).ok())
                        .collect();
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    window.input.push_str(&text);
                    if let Some(last) = window.pane.last_mut() {
                        last.push_str(&text);
                    }
                    None
                }
                Some("enter") | Some("Enter") => Some(std::mem::take(&mut window.input)),
                Some("C-c") => {
                    window.input.clear();
                    if let Some(last) = window.pane.last_mut() {
                        last.push_str("^C");
                    }
                    window.pane.push(PROMPT.to_string());
                    None
                }
                _ => None,
            }
        };
        if let Some(typed) = submitted {
            self.submit_line(&address, &typed);
        }
        ok("")
    }

    fn submit_line(&mut self, address: &str, typed: &str) {
        let Some((command, marker_args)) = typed.split_once(MARKER_FRAGMENT) else {
            let lines = match &self.responder {
                Some(responder) => responder(typed),
                None => vec![PROMPT.to_string()],
            };
            if let Some(window) = self.window_mut(address) {
                window.pane.extend(lines);
            }
            return;
        };

        let prefix = shell_words(marker_args).into_iter().next().unwrap_or_default();
        let stdout = run_fake_shell(command);
        let exit_code = self.exit_code;
        let marker = format!("{prefix} {exit_code}");

        let mut pane_lines: Vec<String> = format!("{stdout}\n")
            .split_terminator('\n')
            .map(str::to_string)
            .collect();
        pane_lines.push(marker.clone());
        pane_lines.push(PROMPT.to_string());

        let capture = match &self.capture_override {
            Some(lines) => lines.iter().map(|l| format!("{l}\n")).collect(),
            None => format!(
                "{typed}\r\n{ENTER_ARTIFACT}{}\r\n{marker}\r\n{PROMPT}",
                stdout.replace('\n', "\r\n")
            ),
        };

        let pending = PendingCompletion {
            address: address.to_string(),
            polls_left: self.completion_delay_polls,
            pane_lines,
            capture,
        };
        if pending.polls_left == 0 {
            self.complete(pending);
        } else {
            self.pending = Some(pending);
        }
    }

    fn complete(&mut self, pending: PendingCompletion) {
        let Some(window) = self.window_mut(&pending.address) else {
            return;
        };
        window.pane.extend(pending.pane_lines);
        let Some(path) = window.pipe.clone() else {
            return;
        };
        if self.capture_delay_reads > 0 {
            self.delayed_capture = Some(DelayedCapture {
                path,
                reads_left: self.capture_delay_reads,
                bytes: pending.capture.into_bytes(),
            });
        } else if let Some(file) = self.files.get_mut(&path) {
            file.extend_from_slice(pending.capture.as_bytes());
        }
    }

    fn flush_delayed_capture(&mut self, path: &str) {
        let Some(mut delayed) = self.delayed_capture.take() else {
            return;
        };
        if delayed.path == path {
            delayed.reads_left = delayed.reads_left.saturating_sub(1);
        }
        if delayed.reads_left > 0 {
            self.delayed_capture = Some(delayed);
            return;
        }
        if let Some(file) = self.files.get_mut(&delayed.path) {
            file.extend_from_slice(&delayed.bytes);
        }
    }

    fn capture_pane(&mut self, args: &[String]) -> CommandOutput {
        let address = flag_value(args, "-t").unwrap_or_default().to_string();
        if let Some(mut pending) = self.pending.take() {
            if pending.address == address {
                pending.polls_left = pending.polls_left.saturating_sub(1);
            }
            if pending.polls_left == 0 {
                self.complete(pending);
            } else {
                self.pending = Some(pending);
            }
        }
        match self.window_mut(&address) {
            Some(window) => ok(window
                .pane
                .iter()
                .map(|l| format!("{l}\n"))
                .collect::<String>()),
            None => fail(format!("can't find pane: {address}\n")),
        }
    }

    fn pipe_pane(&mut self, args: &[String]) -> CommandOutput {
        let address = flag_value(args, "-t").unwrap_or_default().to_string();
        // `pipe-pane -t <addr> [<shell command>]`; an empty command stops it.
        let command = args.get(2).cloned().unwrap_or_default();
        let Some(window) = self.window_mut(&address) else {
            return fail(format!("can't find pane: {address}\n"));
        };
        window.pipe = command
            .strip_prefix("cat >> ")
            .and_then(|path| shell_words(path).into_iter().next());
        ok("")
    }
}

/// Minimal POSIX word splitting: whitespace, single/double quotes, backslash.
fn shell_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_word = true;
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    current.push(c);
                }
            }
            '\\' => {
                in_word = true;
                if let Some(c) = chars.next() {
                    current.push(c);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Stdout of the handful of commands the tests type: `echo`, `bash -c`,
/// and silent no-ops such as `sleep` or `true`.
fn run_fake_shell(script: &str) -> String {
    split_commands(script)
        .iter()
        .map(|part| {
            let words = shell_words(part);
            match words.first().map(String::as_str) {
                Some("echo") => fake_echo(&words[1..]),
                Some("bash") | Some("sh") if words.get(1).map(String::as_str) == Some("-c") => {
                    words.get(2).map(|s| run_fake_shell(s)).unwrap_or_default()
                }
                _ => String::new(),
            }
        })
        .collect()
}

/// Split on `;` outside quotes.
fn split_commands(script: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    for ch in script.chars() {
        match (quote, ch) {
            (None, ';') => parts.push(std::mem::take(&mut current)),
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

fn fake_echo(args: &[String]) -> String {
    let mut newline = true;
    let mut escapes = false;
    let mut idx = 0;
    while let Some(flag) = args.get(idx) {
        let Some(letters) = flag.strip_prefix('-') else {
            break;
        };
        if letters.is_empty() || !letters.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
            break;
        }
        for c in letters.chars() {
            match c {
                'n' => newline = false,
                'e' => escapes = true,
                _ => escapes = false,
            }
        }
        idx += 1;
    }
    let mut text = args[idx..].join(" ");
    if escapes {
        text = text
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\\\", "\\");
    }
    if newline {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_words_handle_quotes() {
        assert_eq!(
            shell_words("echo -en 'hello\\nworld\\n' \"a b\" c\\ d"),
            vec!["echo", "-en", "hello\\nworld\\n", "a b", "c d"]
        );
        assert_eq!(shell_words("'it'\\''s'"), vec!["it's"]);
    }

    #[test]
    fn fake_shell_runs_echo_variants() {
        assert_eq!(run_fake_shell("echo hello"), "hello\n");
        assert_eq!(run_fake_shell("echo -en hello"), "hello");
        assert_eq!(run_fake_shell("echo -en 'a\\nb\\n'"), "a\nb\n");
        assert_eq!(run_fake_shell("bash -c 'sleep 2s ; echo hello'"), "hello\n");
        assert_eq!(run_fake_shell("true"), "");
    }

    #[tokio::test]
    async fn fake_server_tracks_sessions() {
        let fake = FakeTmux::new();
        let out = fake
            .run_command(&RunCommandOptions::new(["tmux", "new-session", "-d", "-s", "a"]))
            .await
            .expect("new-session");
        assert!(out.is_success());
        let dup = fake
            .run_command(&RunCommandOptions::new(["tmux", "new-session", "-d", "-s", "a"]))
            .await
            .expect_err("duplicate");
        assert!(dup.to_string().contains("duplicate session"), "got: {dup}");
    }

    async fn pipe(fake: &FakeTmux, address: &str, command: &str) {
        fake.run_command(&RunCommandOptions::new([
            "tmux",
            "pipe-pane",
            "-t",
            address,
            command,
        ]))
        .await
        .expect("pipe-pane");
    }

    #[tokio::test]
    async fn pipe_pane_attaches_and_detaches_capture_file() {
        let fake = FakeTmux::new();
        fake.add_session("s", &["w"]);
        let file = fake.create_empty_temporary_file().await.expect("file");
        let path = file.local_path().to_string();

        pipe(&fake, "s:=w", &format!("cat >> '{path}'")).await;
        let window = fake.service().get_window_by_names("s", "w").expect("names");
        window
            .send_keys(&["echo hi; printf '\\n%s %s\\n' 'M' \"$?\"", "enter"])
            .await
            .expect("type");
        let captured = fake.read_file(&path).await.expect("read");
        assert!(
            String::from_utf8_lossy(&captured).contains("M 0\r\n"),
            "got: {captured:?}"
        );

        pipe(&fake, "s:=w", "").await;
        assert_eq!(fake.lock().window_mut("s:w").and_then(|w| w.pipe.clone()), None);
    }
}
