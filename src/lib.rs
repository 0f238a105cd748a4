//! Mirror tmux sessions, windows and panes as an object graph, and build
//! sessions from a declarative window/pane layout.

pub mod error;
pub mod layout;
pub mod tmux;

pub use error::{Result, TmuxError, ValidationError};
pub use layout::{LayoutConfig, LayoutPreset, SessionLayout, WindowDescriptor};
pub use tmux::{Pane, Session, SystemRunner, TmuxClient, TmuxRunner, Window};
