use serde::Serialize;

use super::formats::AttributeMap;
use crate::error::ValidationError;

/// A tmux session snapshot.
///
/// Built either from a `new-session` reply ([`Session::created`]) or from a
/// `list-sessions` row ([`Session::from_tmux`]); both give the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    name: String,
    attributes: AttributeMap,
    windows: Vec<Window>,
}

impl Session {
    /// Snapshot of a session this process just created
    pub fn created(name: &str, attributes: AttributeMap) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::MissingField {
                entity: "session",
                field: "session_name",
            });
        }
        if let Some(reported) = attributes.get("session_name") {
            if reported != name {
                return Err(ValidationError::ParentMismatch {
                    entity: "new-session reply",
                    parent: "session",
                    expected: name.to_string(),
                    reported: reported.to_string(),
                });
            }
        }
        Ok(Self {
            name: name.to_string(),
            attributes,
            windows: Vec::new(),
        })
    }

    /// Snapshot of an existing session from a `list-sessions` row
    pub fn from_tmux(attributes: AttributeMap) -> Result<Self, ValidationError> {
        let name = attributes
            .get("session_name")
            .ok_or(ValidationError::MissingField {
                entity: "session",
                field: "session_name",
            })?
            .to_string();
        Ok(Self {
            name,
            attributes,
            windows: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// tmux session id, e.g. `$3`
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("session_id")
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&str> {
        self.attributes.get(field)
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window(&self, name: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.name == name)
    }

    pub(crate) fn push_window(&mut self, window: Window) -> Result<(), ValidationError> {
        if window.session_name != self.name {
            return Err(ValidationError::ParentMismatch {
                entity: "window",
                parent: "session",
                expected: self.name.clone(),
                reported: window.session_name,
            });
        }
        self.windows.push(window);
        Ok(())
    }
}

/// A window inside a session. Holds the owning session's name, not the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    session_name: String,
    index: u32,
    name: String,
    attributes: AttributeMap,
    panes: Vec<Pane>,
}

impl Window {
    /// Window from a `list-windows` row belonging to `session`
    pub fn from_tmux(session: &Session, attributes: AttributeMap) -> Result<Self, ValidationError> {
        if let Some(reported) = attributes.get("session_name") {
            if reported != session.name() {
                return Err(ValidationError::ParentMismatch {
                    entity: "window",
                    parent: "session",
                    expected: session.name().to_string(),
                    reported: reported.to_string(),
                });
            }
        }
        let index = parse_index(&attributes, "window", "window_index")?;
        let name = attributes.get("window_name").unwrap_or_default().to_string();
        Ok(Self {
            session_name: session.name().to_string(),
            index,
            name,
            attributes,
            panes: Vec::new(),
        })
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// tmux window id, e.g. `@7`
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("window_id")
    }

    pub fn layout(&self) -> Option<&str> {
        self.attributes.get("window_layout")
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&str> {
        self.attributes.get(field)
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub(crate) fn push_pane(&mut self, pane: Pane) -> Result<(), ValidationError> {
        if pane.session_name != self.session_name || pane.window_index != self.index {
            return Err(ValidationError::ParentMismatch {
                entity: "pane",
                parent: "window",
                expected: format!("{}:{}", self.session_name, self.index),
                reported: format!("{}:{}", pane.session_name, pane.window_index),
            });
        }
        self.panes.push(pane);
        Ok(())
    }
}

/// A pane inside a window. Both parents are referenced by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pane {
    session_name: String,
    window_index: u32,
    index: u32,
    attributes: AttributeMap,
}

impl Pane {
    /// Pane from a `list-panes` row belonging to `window` of `session`
    pub fn from_tmux(
        session: &Session,
        window: &Window,
        attributes: AttributeMap,
    ) -> Result<Self, ValidationError> {
        if window.session_name() != session.name() {
            return Err(ValidationError::ParentMismatch {
                entity: "window",
                parent: "session",
                expected: session.name().to_string(),
                reported: window.session_name().to_string(),
            });
        }
        if let Some(reported) = attributes.get("window_index") {
            if reported != window.index().to_string() {
                return Err(ValidationError::ParentMismatch {
                    entity: "pane",
                    parent: "window",
                    expected: window.index().to_string(),
                    reported: reported.to_string(),
                });
            }
        }
        let index = parse_index(&attributes, "pane", "pane_index")?;
        Ok(Self {
            session_name: session.name().to_string(),
            window_index: window.index(),
            index,
            attributes,
        })
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn window_index(&self) -> u32 {
        self.window_index
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// tmux pane id, e.g. `%12`
    pub fn id(&self) -> Option<&str> {
        self.attributes.get("pane_id")
    }

    pub fn current_command(&self) -> Option<&str> {
        self.attributes.get("pane_current_command")
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, field: &str) -> Option<&str> {
        self.attributes.get(field)
    }
}

fn parse_index(
    attributes: &AttributeMap,
    entity: &'static str,
    field: &'static str,
) -> Result<u32, ValidationError> {
    let raw = attributes
        .get(field)
        .ok_or(ValidationError::MissingField { entity, field })?;
    raw.parse().map_err(|_| ValidationError::InvalidField {
        entity,
        field,
        value: raw.to_string(),
    })
}
