//! Terminal viewer state and main loop.

use color_eyre::eyre::Result;
use ratatui::DefaultTerminal;

use crate::{coordinator::View, events, simulation::Scoreboard, ui};

/// Viewer state for a running simulation.
///
/// This structure holds everything Ratatui renders from: a read-only coordinator [`View`] for the
/// maze and position snapshots, and the scoreboard of finished explorers. The view type only
/// exposes reads, so the viewer cannot change what the coordinator serves.
pub struct App {
    /// Application exit flag.
    ///
    /// This field indicates whether the viewer should exit. It starts off `false` and is set when
    /// the user asks to quit.
    pub(crate) exit: bool,
    /// Read-only view of the coordinator.
    pub(crate) view: View,
    /// Outcomes of finished explorers.
    pub(crate) scoreboard: Scoreboard,
}

impl App {
    /// Creates a viewer over a coordinator view and a scoreboard.
    #[must_use]
    pub const fn new(view: View, scoreboard: Scoreboard) -> Self {
        Self {
            exit: false,
            view,
            scoreboard,
        }
    }

    /// Runs the main loop of the viewer.
    ///
    /// Every iteration renders fresh snapshots and then polls for input. The loop continues until
    /// the exit flag is set, after which the function returns to the call site.
    ///
    /// # Errors
    ///
    /// - [`std::io::Error`]
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.exit {
            let _ = terminal.try_draw(|frame| {
                ui::draw(self, frame).map_err(std::io::Error::other)
            })?;
            events::handle_events(self)?;
        }

        Ok(())
    }
}
