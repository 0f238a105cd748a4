use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::formats::{AttributeMap, FieldSet, SESSION_FIELDS};
use super::model::Session;
use crate::error::{Result, TmuxError, ValidationError};

/// stderr of a command that failed only because the session or the whole server is absent
static RE_MISSING_SESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(can't find session|no server running|error connecting to|no sessions)")
        .unwrap()
});

/// Reply fields for commands that create a pane
static PANE_HANDLE_FIELDS: Lazy<FieldSet> =
    Lazy::new(|| FieldSet::new(&["window_index", "pane_id"]));

/// Captured result of one tmux invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can execute a tmux argument vector
#[allow(async_fn_in_trait)]
pub trait TmuxRunner {
    /// Run `tmux <args>` to completion. Only spawn failures are errors here;
    /// a non-zero exit is returned in the output.
    async fn run(&self, args: &[String]) -> Result<CommandOutput>;
}

/// Runs the tmux binary as a child process
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// Path to tmux binary
    tmux_path: String,
    /// Server socket name passed as `-L`
    socket_name: Option<String>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            tmux_path: "tmux".to_string(),
            socket_name: None,
        }
    }

    pub fn with_tmux_path(mut self, tmux_path: impl Into<String>) -> Self {
        self.tmux_path = tmux_path.into();
        self
    }

    pub fn with_socket_name(mut self, socket_name: impl Into<String>) -> Self {
        self.socket_name = Some(socket_name.into());
        self
    }

    pub fn tmux_path(&self) -> &str {
        &self.tmux_path
    }

    fn base_args(&self) -> Vec<String> {
        match &self.socket_name {
            Some(socket) => vec!["-L".to_string(), socket.clone()],
            None => Vec::new(),
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxRunner for SystemRunner {
    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(&self.tmux_path)
            .args(self.base_args())
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| TmuxError::Spawn {
                command: render_command(args),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Split orientation for `split-window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    /// Side by side (`-h`)
    Horizontal,
    /// Stacked (`-v`)
    Vertical,
}

impl SplitDirection {
    fn flag(self) -> &'static str {
        match self {
            SplitDirection::Horizontal => "-h",
            SplitDirection::Vertical => "-v",
        }
    }
}

/// A freshly created pane: the window it landed in and its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneHandle {
    pub window_index: u32,
    pub pane_id: String,
}

impl PaneHandle {
    fn from_attributes(attributes: &AttributeMap) -> std::result::Result<Self, ValidationError> {
        let raw_index = attributes
            .get("window_index")
            .ok_or(ValidationError::MissingField {
                entity: "pane",
                field: "window_index",
            })?;
        let window_index = raw_index.parse().map_err(|_| ValidationError::InvalidField {
            entity: "pane",
            field: "window_index",
            value: raw_index.to_string(),
        })?;
        let pane_id = attributes
            .get("pane_id")
            .ok_or(ValidationError::MissingField {
                entity: "pane",
                field: "pane_id",
            })?
            .to_string();
        Ok(Self {
            window_index,
            pane_id,
        })
    }
}

/// Client for interacting with tmux via CLI
pub struct TmuxClient<R = SystemRunner> {
    runner: R,
}

impl TmuxClient<SystemRunner> {
    pub fn new() -> Self {
        Self::with_runner(SystemRunner::new())
    }
}

impl Default for TmuxClient<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TmuxRunner> TmuxClient<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a command that must succeed and return its stdout
    pub(crate) async fn exec(&self, args: Vec<String>) -> Result<String> {
        let output = self.run_logged(&args).await?;
        if !output.success() {
            return Err(process_error(&args, &output));
        }
        Ok(output.stdout)
    }

    pub(crate) async fn run_logged(&self, args: &[String]) -> Result<CommandOutput> {
        debug!(command = %render_command(args), "running tmux");
        let output = self.runner.run(args).await?;
        debug!(code = ?output.code, "tmux finished");
        Ok(output)
    }

    /// Check whether a session with exactly this name is running.
    ///
    /// A missing session (or missing server) is `Ok(false)`; any other
    /// failure is an error.
    pub async fn has_session(&self, name: &str) -> Result<bool> {
        let args = strings(&["has-session", "-t", &session_target(name)]);
        let output = self.run_logged(&args).await?;
        if output.success() {
            return Ok(true);
        }
        if is_missing_session(&output) {
            return Ok(false);
        }
        Err(process_error(&args, &output))
    }

    /// Kill a session
    pub async fn kill_session(&self, name: &str) -> Result<()> {
        self.exec(strings(&["kill-session", "-t", &session_target(name)]))
            .await?;
        info!(session = name, "killed tmux session");
        Ok(())
    }

    /// `new-session -d`, reading the session fields straight from the reply
    pub async fn new_session(&self, name: &str, window_name: Option<&str>) -> Result<Session> {
        validate_session_name(name)?;
        let mut args = strings(&["new-session", "-d", "-s", name]);
        if let Some(window_name) = window_name {
            args.extend(strings(&["-n", window_name]));
        }
        args.extend(strings(&["-P", "-F", &SESSION_FIELDS.query()]));

        let stdout = self.exec(args).await?;
        let attributes = stdout
            .lines()
            .find(|line| !line.is_empty())
            .map(|line| SESSION_FIELDS.parse_row(line))
            .unwrap_or_default();
        let session = Session::created(name, attributes)?;
        info!(session = name, id = ?session.id(), "created tmux session");
        Ok(session)
    }

    /// Append a window to a session without selecting it
    pub async fn new_window(&self, session: &str, window_name: &str) -> Result<PaneHandle> {
        let target = format!("{}:", session_target(session));
        let stdout = self
            .exec(strings(&[
                "new-window",
                "-d",
                "-t",
                &target,
                "-n",
                window_name,
                "-P",
                "-F",
                &PANE_HANDLE_FIELDS.query(),
            ]))
            .await?;
        parse_handle(&stdout)
    }

    /// Window index and id of the active pane in a session
    pub async fn active_pane(&self, session: &str) -> Result<PaneHandle> {
        // a bare session is not a pane target; `name:` resolves to its current window
        let target = format!("{}:", session_target(session));
        let stdout = self
            .exec(strings(&[
                "display-message",
                "-p",
                "-t",
                &target,
                &PANE_HANDLE_FIELDS.query(),
            ]))
            .await?;
        parse_handle(&stdout)
    }

    /// Split a pane, giving the new pane `percent` of its space. Returns the new pane id.
    pub async fn split_window(
        &self,
        pane_id: &str,
        direction: SplitDirection,
        percent: u8,
    ) -> Result<String> {
        let stdout = self
            .exec(strings(&[
                "split-window",
                "-d",
                "-t",
                pane_id,
                direction.flag(),
                "-p",
                &percent.to_string(),
                "-P",
                "-F",
                "#{pane_id}",
            ]))
            .await?;
        let pane_id = stdout.trim();
        if pane_id.is_empty() {
            return Err(ValidationError::MissingField {
                entity: "pane",
                field: "pane_id",
            }
            .into());
        }
        Ok(pane_id.to_string())
    }

    /// Type a command into a pane literally, then press Enter
    pub async fn send_keys(&self, pane_id: &str, command: &str) -> Result<()> {
        self.exec(strings(&["send-keys", "-t", pane_id, "-l", command]))
            .await?;
        self.exec(strings(&["send-keys", "-t", pane_id, "Enter"]))
            .await?;
        Ok(())
    }

    /// Apply a layout to a window (`session:index`)
    pub async fn select_layout(
        &self,
        session: &str,
        window_index: u32,
        layout: &str,
    ) -> Result<()> {
        let target = window_target(session, window_index);
        self.exec(strings(&["select-layout", "-t", &target, layout]))
            .await?;
        Ok(())
    }
}

impl TmuxClient<SystemRunner> {
    /// Get the command to attach to a session (for external execution)
    pub fn attach_command(&self, name: &str) -> Vec<String> {
        let mut command = vec![self.runner.tmux_path.clone()];
        command.extend(self.runner.base_args());
        command.extend(strings(&["attach-session", "-t", &session_target(name)]));
        command
    }
}

/// Reject names tmux would rewrite or parse as a window/pane target.
///
/// tmux replaces `.` and `:` in session names, so the session created would
/// not be the one asked for.
pub fn validate_session_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingField {
            entity: "session",
            field: "session_name",
        });
    }
    if name.contains(['.', ':']) {
        return Err(ValidationError::InvalidField {
            entity: "session",
            field: "session_name",
            value: name.to_string(),
        });
    }
    Ok(())
}

/// True when a command failed only because the session or server does not exist
pub(crate) fn is_missing_session(output: &CommandOutput) -> bool {
    output.code == Some(1) && RE_MISSING_SESSION.is_match(&output.stderr)
}

/// Exact-match target for a session name
pub fn session_target(name: &str) -> String {
    format!("={}", name)
}

pub fn window_target(session: &str, window_index: u32) -> String {
    format!("{}:{}", session_target(session), window_index)
}

fn parse_handle(stdout: &str) -> Result<PaneHandle> {
    let attributes = stdout
        .lines()
        .find(|line| !line.is_empty())
        .map(|line| PANE_HANDLE_FIELDS.parse_row(line))
        .unwrap_or_default();
    Ok(PaneHandle::from_attributes(&attributes)?)
}

pub(crate) fn process_error(args: &[String], output: &CommandOutput) -> TmuxError {
    TmuxError::Process {
        command: render_command(args),
        code: output.code,
        stderr: output.stderr.clone(),
    }
}

pub(crate) fn render_command(args: &[String]) -> String {
    let mut rendered = String::from("tmux");
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push_str(&format!("{:?}", arg));
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

pub(crate) fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}
