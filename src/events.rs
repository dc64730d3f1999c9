//! Keyboard handling for the viewer.

use std::time::Duration;

use color_eyre::eyre::Result;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

use crate::App;

/// How long to wait for input before redrawing.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handles input events and updates the viewer state accordingly.
///
/// This function polls for keyboard events with a timeout, so the frame is redrawn at least every
/// [`POLL_INTERVAL`] even when nothing is pressed and explorer moves stay visible.
///
/// # Errors
///
/// - [`std::io::Error`] if polling or reading the terminal fails.
pub(crate) fn handle_events(app: &mut App) -> Result<()> {
    if event::poll(POLL_INTERVAL)? {
        if let Event::Key(key) = event::read()? {
            handle_key(app, key);
        }
    }

    Ok(())
}

/// Applies a single key press.
pub(crate) fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.exit = true;
    }
}
