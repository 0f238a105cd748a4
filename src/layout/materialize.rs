//! Turns a normalized layout into tmux commands.
//!
//! Splits always cut the most recently created pane along one axis, handing the
//! new pane the share still owed to the panes after it, so `n` panes come out
//! roughly `1/n` each. The preset applied afterwards decides the final
//! arrangement; the split geometry only has to reach the right pane count.

use tracing::{debug, info};

use super::{LayoutPreset, SessionLayout, WindowDescriptor};
use crate::error::{Result, TmuxError};
use crate::tmux::{
    validate_session_name, PaneHandle, Session, SplitDirection, TmuxClient, TmuxRunner,
};

/// One `split-window` step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub direction: SplitDirection,
    /// Share of the split pane given to the new pane
    pub percent: u8,
}

/// The `n - 1` splits that turn one pane into `n`
pub fn split_plan(panes: usize, preset: Option<LayoutPreset>) -> Vec<Split> {
    let direction = match preset {
        Some(LayoutPreset::EvenHorizontal) | Some(LayoutPreset::MainVertical) => {
            SplitDirection::Horizontal
        }
        _ => SplitDirection::Vertical,
    };
    (1..panes)
        .map(|created| {
            // panes the current pane still has to hold, itself included
            let remaining = panes - created + 1;
            let percent = (100 * (remaining - 1) + remaining / 2) / remaining;
            Split {
                direction,
                percent: percent as u8,
            }
        })
        .collect()
}

impl<R: TmuxRunner> TmuxClient<R> {
    /// Create session `name` laid out as `layout`.
    ///
    /// An existing session of that name is killed first when `kill_session`
    /// is set; otherwise creation stops with [`TmuxError::SessionExists`]
    /// and the running session is left alone.
    pub async fn create_session(
        &self,
        name: &str,
        layout: &SessionLayout,
        kill_session: bool,
    ) -> Result<Session> {
        validate_session_name(name)?;
        if self.has_session(name).await? {
            if !kill_session {
                return Err(TmuxError::SessionExists {
                    name: name.to_string(),
                });
            }
            info!(session = name, "session exists, replacing it");
            self.kill_session(name).await?;
        }

        let first_window = layout.windows.first().map(|w| w.name.as_str());
        let session = self.new_session(name, first_window).await?;

        for (position, window) in layout.windows.iter().enumerate() {
            let first_pane = if position == 0 {
                self.active_pane(name).await?
            } else {
                self.new_window(name, &window.name).await?
            };
            self.build_window(name, window, first_pane).await?;
        }

        Ok(session)
    }

    async fn build_window(
        &self,
        session: &str,
        window: &WindowDescriptor,
        first_pane: PaneHandle,
    ) -> Result<()> {
        let window_index = first_pane.window_index;
        let mut pane_ids = vec![first_pane.pane_id];

        for split in split_plan(window.panes.len(), window.layout) {
            let target = pane_ids.last().cloned().unwrap_or_default();
            let pane_id = self
                .split_window(&target, split.direction, split.percent)
                .await?;
            pane_ids.push(pane_id);
        }

        for (pane_id, command) in pane_ids.iter().zip(&window.panes) {
            if !command.trim().is_empty() {
                self.send_keys(pane_id, command).await?;
            }
        }

        if let Some(preset) = window.layout {
            self.select_layout(session, window_index, preset.as_str())
                .await?;
        }

        debug!(
            session,
            window = %window.name,
            index = window_index,
            panes = pane_ids.len(),
            "built window"
        );
        Ok(())
    }
}
