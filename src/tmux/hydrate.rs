//! Builds the session → window → pane graph from live tmux state.

use tracing::{debug, warn};

use super::client::{
    is_missing_session, process_error, session_target, strings, TmuxClient, TmuxRunner,
};
use super::formats::{AttributeMap, PANE_LISTING_FIELDS, SESSION_FIELDS, WINDOW_FIELDS};
use super::model::{Pane, Session, Window};
use crate::error::{Result, TmuxError};

impl<R: TmuxRunner> TmuxClient<R> {
    /// List all tmux sessions with their windows and panes
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let args = strings(&["list-sessions", "-F", &SESSION_FIELDS.query()]);
        let output = self.run_logged(&args).await?;

        if !output.success() {
            if is_missing_session(&output) {
                warn!(stderr = %output.stderr, "no tmux server, nothing to hydrate");
                return Ok(Vec::new());
            }
            return Err(process_error(&args, &output));
        }

        let mut sessions = Vec::new();
        for attributes in SESSION_FIELDS.parse_output(&output.stdout) {
            let session = Session::from_tmux(attributes)?;
            let name = session.name().to_string();
            let session = self
                .hydrate_session(session)
                .await
                .map_err(|source| TmuxError::Hydration {
                    session: name,
                    source: Box::new(source),
                })?;
            sessions.push(session);
        }
        Ok(sessions)
    }

    /// Fill a session with its windows, and each window with its panes
    pub async fn hydrate_session(&self, mut session: Session) -> Result<Session> {
        let window_rows = self.list_window_rows(session.name()).await?;
        // one query for every pane of the session, split per window below
        let pane_rows = self.list_pane_rows(session.name()).await?;

        for window_row in window_rows {
            let mut window = Window::from_tmux(&session, window_row)?;
            let index = window.index().to_string();
            for pane_row in panes_in_window(&pane_rows, &index) {
                let pane = Pane::from_tmux(&session, &window, pane_row.clone())?;
                window.push_pane(pane)?;
            }
            debug!(
                session = session.name(),
                window = window.index(),
                panes = window.panes().len(),
                "hydrated window"
            );
            session.push_window(window)?;
        }
        Ok(session)
    }

    /// Raw `list-windows` rows for one session, in display order
    pub async fn list_window_rows(&self, session: &str) -> Result<Vec<AttributeMap>> {
        let stdout = self
            .exec(strings(&[
                "list-windows",
                "-t",
                &session_target(session),
                "-F",
                &WINDOW_FIELDS.query(),
            ]))
            .await?;
        Ok(WINDOW_FIELDS.parse_output(&stdout))
    }

    /// Raw `list-panes -s` rows covering every window of one session
    pub async fn list_pane_rows(&self, session: &str) -> Result<Vec<AttributeMap>> {
        let stdout = self
            .exec(strings(&[
                "list-panes",
                "-s",
                "-t",
                &session_target(session),
                "-F",
                &PANE_LISTING_FIELDS.query(),
            ]))
            .await?;
        Ok(PANE_LISTING_FIELDS.parse_output(&stdout))
    }
}

/// Rows of a session-wide pane listing whose `window_index` matches, in listing order
pub fn panes_in_window<'a>(
    rows: &'a [AttributeMap],
    window_index: &'a str,
) -> impl Iterator<Item = &'a AttributeMap> + 'a {
    rows.iter()
        .filter(move |row| row.get("window_index") == Some(window_index))
}
