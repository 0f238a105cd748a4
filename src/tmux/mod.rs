mod client;
pub mod formats;
mod hydrate;
mod model;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{
    session_target, validate_session_name, window_target, CommandOutput, PaneHandle,
    SplitDirection, SystemRunner, TmuxClient, TmuxRunner,
};
pub use formats::{
    AttributeMap, FieldSet, PANE_FIELDS, PANE_LISTING_FIELDS, SESSION_FIELDS, WINDOW_FIELDS,
};
pub use hydrate::panes_in_window;
pub use model::{Pane, Session, Window};
