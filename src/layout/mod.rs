mod materialize;

pub use materialize::{split_plan, Split};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Pane arrangements tmux can apply with `select-layout`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    /// Panes spread evenly from left to right
    EvenHorizontal,
    /// Panes spread evenly from top to bottom
    EvenVertical,
    /// One large pane on top, the rest side by side below
    MainHorizontal,
    /// One large pane on the left, the rest stacked on the right
    MainVertical,
    /// Panes spread as evenly as possible in rows and columns
    Tiled,
}

impl LayoutPreset {
    pub const ALL: [LayoutPreset; 5] = [
        LayoutPreset::EvenHorizontal,
        LayoutPreset::EvenVertical,
        LayoutPreset::MainHorizontal,
        LayoutPreset::MainVertical,
        LayoutPreset::Tiled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutPreset::EvenHorizontal => "even-horizontal",
            LayoutPreset::EvenVertical => "even-vertical",
            LayoutPreset::MainHorizontal => "main-horizontal",
            LayoutPreset::MainVertical => "main-vertical",
            LayoutPreset::Tiled => "tiled",
        }
    }
}

impl fmt::Display for LayoutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutPreset {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LayoutPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownLayout(s.to_string()))
    }
}

/// Value side of one window entry: a bare command or the full form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WindowOptions {
    Command(String),
    Full {
        #[serde(default)]
        layout: Option<String>,
        #[serde(default)]
        panes: Vec<String>,
    },
}

/// Declarative layout as written in a config file.
///
/// ```yaml
/// windows:
///   - editor:
///       layout: main-vertical
///       panes:
///         - vim
///         - cowsay "hey"
///   - server: htop
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub windows: Vec<BTreeMap<String, WindowOptions>>,
}

impl LayoutConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Expand short-form entries and validate presets
    pub fn normalize(&self) -> std::result::Result<SessionLayout, ValidationError> {
        let windows = self
            .windows
            .iter()
            .map(|entry| {
                let mut names = entry.iter();
                match (names.next(), names.next()) {
                    (Some((name, options)), None) => WindowDescriptor::normalize(name, options),
                    _ => Err(ValidationError::InvalidWindowEntry(entry.len())),
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(SessionLayout { windows })
    }
}

/// Canonical description of one window to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowDescriptor {
    pub name: String,
    pub layout: Option<LayoutPreset>,
    /// One command per pane, in creation order
    pub panes: Vec<String>,
}

impl WindowDescriptor {
    pub fn normalize(
        name: &str,
        options: &WindowOptions,
    ) -> std::result::Result<Self, ValidationError> {
        let (layout, panes) = match options {
            WindowOptions::Command(command) => (None, vec![command.clone()]),
            WindowOptions::Full { layout, panes } => {
                let layout = layout.as_deref().map(LayoutPreset::from_str).transpose()?;
                (layout, panes.clone())
            }
        };
        if panes.is_empty() {
            return Err(ValidationError::EmptyWindow(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            layout,
            panes,
        })
    }
}

/// Ordered windows of a session, ready to materialize
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionLayout {
    pub windows: Vec<WindowDescriptor>,
}
