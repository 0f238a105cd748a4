//! In-memory tmux server for tests. Understands the subset of commands the client issues.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::client::{CommandOutput, TmuxRunner};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
struct FakePane {
    id: u32,
    index: u32,
    sent: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct FakeWindow {
    id: u32,
    index: u32,
    name: String,
    layout: Option<String>,
    panes: Vec<FakePane>,
}

#[derive(Debug, Clone, Default)]
struct FakeSession {
    id: u32,
    name: String,
    windows: Vec<FakeWindow>,
}

#[derive(Debug, Clone, Default)]
struct FakeState {
    sessions: Vec<FakeSession>,
    next_session_id: u32,
    next_window_id: u32,
    next_pane_id: u32,
    calls: Vec<Vec<String>>,
    failures: HashMap<String, (i32, String)>,
}

/// Snapshot of one simulated window, for assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WindowSummary {
    pub name: String,
    pub layout: Option<String>,
    pub pane_commands: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeTmux {
    state: Arc<Mutex<FakeState>>,
}

impl Clone for FakeTmux {
    /// Clones share the simulated server
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl FakeTmux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `command` exit with `code` and `stderr`
    pub fn fail_on(self, command: &str, code: i32, stderr: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(command.to_string(), (code, stderr.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn session_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.sessions.iter().map(|s| s.name.clone()).collect()
    }

    pub fn windows(&self, session: &str) -> Vec<WindowSummary> {
        let state = self.state.lock().unwrap();
        state
            .sessions
            .iter()
            .find(|s| s.name == session)
            .map(|s| {
                s.windows
                    .iter()
                    .map(|w| WindowSummary {
                        name: w.name.clone(),
                        layout: w.layout.clone(),
                        pane_commands: w.panes.iter().map(|p| p.sent.clone()).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TmuxRunner for FakeTmux {
    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());
        if let Some((code, stderr)) = state.failures.get(&args[0]).cloned() {
            return Ok(fail(code, &stderr));
        }
        Ok(state.dispatch(args))
    }
}

fn ok(stdout: String) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout,
        stderr: String::new(),
    }
}

fn fail(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Replace every `#{field}` with its value, unknown fields render empty
fn render(format: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::new();
    let mut rest = format;
    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        if let Some(value) = vars.get(&after[..end]) {
            out.push_str(value);
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

impl FakeState {
    fn dispatch(&mut self, args: &[String]) -> CommandOutput {
        let target = flag(args, "-t").map(|t| t.trim_start_matches('=').to_string());
        let format = flag(args, "-F").unwrap_or_default().to_string();
        match args[0].as_str() {
            "has-session" => match self.session_pos(target.as_deref()) {
                Some(_) => ok(String::new()),
                None => self.missing(target.as_deref()),
            },
            "kill-session" => match self.session_pos(target.as_deref()) {
                Some(pos) => {
                    self.sessions.remove(pos);
                    ok(String::new())
                }
                None => self.missing(target.as_deref()),
            },
            "new-session" => {
                let name = flag(args, "-s").unwrap_or("0").to_string();
                if self.session_pos(Some(name.as_str())).is_some() {
                    return fail(1, &format!("duplicate session: {}", name));
                }
                let window_name = flag(args, "-n").unwrap_or("bash").to_string();
                let id = self.bump_session();
                let window = self.make_window(0, &window_name);
                self.sessions.push(FakeSession {
                    id,
                    name,
                    windows: vec![window],
                });
                let pos = self.sessions.len() - 1;
                ok(format!("{}\n", render(&format, &self.session_vars(pos))))
            }
            "list-sessions" => {
                if self.sessions.is_empty() {
                    return fail(1, "no server running on /tmp/tmux-1000/default");
                }
                let lines: String = (0..self.sessions.len())
                    .map(|pos| format!("{}\n", render(&format, &self.session_vars(pos))))
                    .collect();
                ok(lines)
            }
            "list-windows" => {
                let Some(pos) = self.session_pos(target.as_deref()) else {
                    return self.missing(target.as_deref());
                };
                let lines: String = (0..self.sessions[pos].windows.len())
                    .map(|w| format!("{}\n", render(&format, &self.window_vars(pos, w))))
                    .collect();
                ok(lines)
            }
            "list-panes" => {
                let Some(pos) = self.session_pos(target.as_deref()) else {
                    return self.missing(target.as_deref());
                };
                let mut lines = String::new();
                for w in 0..self.sessions[pos].windows.len() {
                    for p in 0..self.sessions[pos].windows[w].panes.len() {
                        lines.push_str(&render(&format, &self.pane_vars(pos, w, p)));
                        lines.push('\n');
                    }
                }
                ok(lines)
            }
            "new-window" => {
                let session = target.unwrap_or_default();
                let session = session.trim_end_matches(':');
                let Some(pos) = self.session_pos(Some(session)) else {
                    return self.missing(Some(session));
                };
                let index = self.sessions[pos]
                    .windows
                    .iter()
                    .map(|w| w.index + 1)
                    .max()
                    .unwrap_or(0);
                let name = flag(args, "-n").unwrap_or("bash").to_string();
                let window = self.make_window(index, &name);
                self.sessions[pos].windows.push(window);
                let w = self.sessions[pos].windows.len() - 1;
                ok(format!("{}\n", render(&format, &self.pane_vars(pos, w, 0))))
            }
            "display-message" => {
                let format = args.last().cloned().unwrap_or_default();
                let target = target.unwrap_or_default();
                // tmux resolves `session:` to a pane but prints an empty row for a bare session
                let Some(session) = target.strip_suffix(':') else {
                    return ok(format!("{}\n", render(&format, &HashMap::new())));
                };
                let Some(pos) = self.session_pos(Some(session)) else {
                    return self.missing(Some(session));
                };
                ok(format!("{}\n", render(&format, &self.pane_vars(pos, 0, 0))))
            }
            "split-window" => {
                let Some((pos, w, p)) = self.find_pane(target.as_deref()) else {
                    return fail(1, "can't find pane");
                };
                let id = self.bump_pane();
                let window = &mut self.sessions[pos].windows[w];
                let index = window.panes.len() as u32;
                window.panes.insert(
                    p + 1,
                    FakePane {
                        id,
                        index,
                        sent: Vec::new(),
                    },
                );
                ok(format!("%{}\n", id))
            }
            "send-keys" => {
                let Some((pos, w, p)) = self.find_pane(target.as_deref()) else {
                    return fail(1, "can't find pane");
                };
                // only literal text is recorded; key names like `Enter` are keystrokes
                if let Some(text) = flag(args, "-l") {
                    let text = text.to_string();
                    self.sessions[pos].windows[w].panes[p].sent.push(text);
                }
                ok(String::new())
            }
            "select-layout" => {
                let target = target.unwrap_or_default();
                let Some((session, index)) = target.split_once(':') else {
                    return fail(1, "can't find window");
                };
                let Some(pos) = self.session_pos(Some(session)) else {
                    return self.missing(Some(session));
                };
                let Some(window) = self.sessions[pos]
                    .windows
                    .iter_mut()
                    .find(|w| w.index.to_string() == index)
                else {
                    return fail(1, &format!("can't find window: {}", index));
                };
                window.layout = args.last().cloned();
                ok(String::new())
            }
            other => fail(1, &format!("unknown command: {}", other)),
        }
    }

    fn missing(&self, target: Option<&str>) -> CommandOutput {
        if self.sessions.is_empty() {
            fail(1, "no server running on /tmp/tmux-1000/default")
        } else {
            fail(1, &format!("can't find session: {}", target.unwrap_or_default()))
        }
    }

    fn session_pos(&self, name: Option<&str>) -> Option<usize> {
        let name = name?;
        self.sessions.iter().position(|s| s.name == name)
    }

    fn find_pane(&self, pane_id: Option<&str>) -> Option<(usize, usize, usize)> {
        let id: u32 = pane_id?.strip_prefix('%')?.parse().ok()?;
        for (s, session) in self.sessions.iter().enumerate() {
            for (w, window) in session.windows.iter().enumerate() {
                if let Some(p) = window.panes.iter().position(|pane| pane.id == id) {
                    return Some((s, w, p));
                }
            }
        }
        None
    }

    fn bump_session(&mut self) -> u32 {
        self.next_session_id += 1;
        self.next_session_id - 1
    }

    fn bump_pane(&mut self) -> u32 {
        self.next_pane_id += 1;
        self.next_pane_id - 1
    }

    fn make_window(&mut self, index: u32, name: &str) -> FakeWindow {
        self.next_window_id += 1;
        let pane = FakePane {
            id: self.bump_pane(),
            index: 0,
            sent: Vec::new(),
        };
        FakeWindow {
            id: self.next_window_id - 1,
            index,
            name: name.to_string(),
            layout: None,
            panes: vec![pane],
        }
    }

    fn session_vars(&self, pos: usize) -> HashMap<&'static str, String> {
        let session = &self.sessions[pos];
        HashMap::from([
            ("session_name", session.name.clone()),
            ("session_id", format!("${}", session.id)),
            ("session_windows", session.windows.len().to_string()),
            ("session_width", "80".to_string()),
            ("session_height", "24".to_string()),
            ("session_created", "1700000000".to_string()),
            ("session_attached", "0".to_string()),
            ("session_grouped", "0".to_string()),
            ("session_group", String::new()),
        ])
    }

    fn window_vars(&self, pos: usize, w: usize) -> HashMap<&'static str, String> {
        let window = &self.sessions[pos].windows[w];
        let mut vars = self.session_vars(pos);
        vars.extend([
            ("window_id", format!("@{}", window.id)),
            ("window_name", window.name.clone()),
            ("window_index", window.index.to_string()),
            ("window_panes", window.panes.len().to_string()),
            ("window_layout", window.layout.clone().unwrap_or_default()),
            ("window_active", if w == 0 { "1" } else { "0" }.to_string()),
            ("window_flags", if w == 0 { "*" } else { "" }.to_string()),
            ("window_bell_flag", "0".to_string()),
        ]);
        vars
    }

    fn pane_vars(&self, pos: usize, w: usize, p: usize) -> HashMap<&'static str, String> {
        let pane = &self.sessions[pos].windows[w].panes[p];
        let mut vars = self.window_vars(pos, w);
        vars.extend([
            ("pane_id", format!("%{}", pane.id)),
            ("pane_index", p.to_string()),
            ("pane_active", if pane.index == 0 { "1" } else { "0" }.to_string()),
            ("pane_dead", "0".to_string()),
            ("pane_title", String::new()),
            ("pane_current_command", "bash".to_string()),
            ("history_limit", "2000".to_string()),
        ]);
        vars
    }
}
