use thiserror::Error;

/// Errors raised while constructing entities or normalizing layouts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{entity} requires field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity} field `{field}` has invalid value `{value}`")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A child reports a parent identity that differs from the parent it is attached to
    #[error("{entity} belongs to {parent} `{reported}`, not `{expected}`")]
    ParentMismatch {
        entity: &'static str,
        parent: &'static str,
        expected: String,
        reported: String,
    },

    #[error("unknown layout preset `{0}`")]
    UnknownLayout(String),

    #[error("window entry must have exactly one name, found {0}")]
    InvalidWindowEntry(usize),

    #[error("window `{0}` declares no panes")]
    EmptyWindow(String),
}

/// Errors surfaced by the tmux client, hydrator and materializer
#[derive(Debug, Error)]
pub enum TmuxError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("session `{name}` already exists")]
    SessionExists { name: String },

    #[error("`{command}` exited with {}: {stderr}", describe_code(.code))]
    Process {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to hydrate session `{session}`")]
    Hydration {
        session: String,
        #[source]
        source: Box<TmuxError>,
    },

    #[error("invalid layout config")]
    Config(#[from] serde_yaml::Error),
}

impl TmuxError {
    /// True when creation was refused because the target session is already running
    pub fn is_session_exists(&self) -> bool {
        matches!(self, TmuxError::SessionExists { .. })
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, TmuxError>;
