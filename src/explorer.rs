//! Reactive explorer actors.
//!
//! An explorer knows only the grid size and its own cell. It picks a random direction, asks the
//! coordinator about it and reacts to the replies: it leaves on `exit`, stays put on `wall` and
//! otherwise steps into the neighbouring cell.

use std::time::Duration;

use rand::{rngs::SmallRng, seq::SliceRandom as _, Rng as _};
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    cell::Direction,
    coordinator::Mailbox,
    maze::{self, Position},
    protocol::{CoordinateOrder, Query, Response},
};

/// Pacing of an explorer's moves.
///
/// This structure bundles the two knobs that bound how long an explorer keeps running: the pause
/// taken after every answered query and the number of queries sent before it gives up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pace {
    /// Pause between two queries.
    pub step_delay: Duration,
    /// Queries sent before giving up, unlimited when `None`.
    pub max_steps: Option<u64>,
}

/// How an explorer's run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Found the exit.
    Escaped {
        /// Queries sent, the final one included.
        steps: u64,
    },
    /// Reached its step limit.
    GaveUp {
        /// Queries sent.
        steps: u64,
    },
    /// The coordinator stopped first.
    Disconnected {
        /// Queries answered before the coordinator stopped.
        steps: u64,
    },
}

impl Outcome {
    /// Returns whether the explorer found the exit.
    #[must_use]
    pub const fn escaped(self) -> bool {
        matches!(self, Self::Escaped { .. })
    }
}

/// A single explorer actor.
///
/// This structure holds everything an explorer needs to wander the maze on its own task. It only
/// knows the size of the grid, never its walls: every move is a query to the coordinator, and the
/// replies decide whether the explorer steps into the neighbouring cell, stays put or stops because
/// it found the exit.
#[derive(Debug)]
pub struct Explorer {
    /// Name the coordinator knows this explorer by.
    name: String,
    /// Current cell.
    position: Position,
    /// Grid size as `(lines, columns)`.
    bounds: (usize, usize),
    /// Handle to the coordinator.
    mailbox: Mailbox,
    /// Move pacing.
    pace: Pace,
    /// Source of direction choices.
    rng: SmallRng,
}

impl Explorer {
    /// Creates an explorer on a random cell of a `bounds.0` by `bounds.1` grid.
    #[must_use]
    pub fn new(
        name: String,
        mailbox: Mailbox,
        bounds: (usize, usize),
        pace: Pace,
        mut rng: SmallRng,
    ) -> Self {
        let (lines, columns) = bounds;
        let position = Position::new(
            rng.gen_range(0..lines.max(1)),
            rng.gen_range(0..columns.max(1)),
        );

        Self {
            name,
            position,
            bounds,
            mailbox,
            pace,
            rng,
        }
    }

    /// The explorer's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explorer's current cell.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Explores until the exit is found, the step limit is hit or the coordinator stops.
    ///
    /// Each iteration picks one of the four directions uniformly at random, sends a query stating
    /// the current cell and sleeps for the configured step delay after the replies arrive. The
    /// returned [`Outcome`] carries the number of queries that were answered.
    pub async fn run(mut self) -> Outcome {
        debug!(explorer = %self.name, start = %self.position, "explorer started");
        let mut steps = 0;

        loop {
            if self.pace.max_steps.is_some_and(|max_steps| steps >= max_steps) {
                info!(explorer = %self.name, steps, "explorer gave up");
                return Outcome::GaveUp { steps };
            }

            let Some(direction) = Direction::ALL.choose(&mut self.rng).copied() else {
                return Outcome::GaveUp { steps };
            };
            let query = Query::new(direction, self.position).encode(CoordinateOrder::RowColumn);
            let Ok(replies) = self.mailbox.send(&self.name, query).await else {
                warn!(explorer = %self.name, steps, "coordinator stopped");
                return Outcome::Disconnected { steps };
            };
            steps += 1;

            if self.react(direction, &replies) {
                info!(explorer = %self.name, steps, exit = %self.position, "explorer escaped");
                return Outcome::Escaped { steps };
            }

            time::sleep(self.pace.step_delay).await;
        }
    }

    /// Updates the position from the replies to a move in `direction`.
    ///
    /// This function returns `true` when the replies contain `exit`. A `wall` reply, or no reply
    /// at all because the query was dropped, leaves the explorer where it is. Otherwise it steps
    /// into the neighbouring cell, staying inside the grid bounds.
    fn react(&mut self, direction: Direction, replies: &[Response]) -> bool {
        if replies.contains(&Response::Exit) {
            return true;
        }
        if replies.is_empty() || replies.contains(&Response::Wall) {
            return false;
        }

        let (lines, columns) = self.bounds;
        if let Some(next) = maze::neighbour_within(lines, columns, self.position, direction) {
            self.position = next;
        }

        false
    }
}
