//! The environment coordinator: sole authority over the maze and the explorer position table.
//!
//! Explorers talk to the coordinator through a [`Mailbox`]. The coordinator task drains its inbox
//! one envelope at a time, so position updates are serialised without any per-explorer locking,
//! and answers every query with an ordered list of zero to three [`Response`]s.

use std::{collections::BTreeMap, sync::Arc};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    maze::{Maze, Position},
    positions::PositionTable,
    protocol::{CoordinateOrder, Heading, Message, ParseError, Response},
};

/// Name the coordinator uses for itself in logs.
pub const COORDINATOR_NAME: &str = "coordinator";

/// Envelopes buffered in the coordinator inbox before senders wait.
pub const INBOX_CAPACITY: usize = 64;

/// How the two integers of a query position are read by each check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CoordinateMode {
    /// Both the exit check and the wall check read `row column`.
    #[default]
    Canonical,
    /// The exit check reads `row column` while the wall check reads `column row`.
    Legacy,
}

impl CoordinateMode {
    /// Order used by the exit check and stored in the position table.
    ///
    /// Both modes agree on this order; they only differ in how the wall check reads a position.
    pub const EXIT_ORDER: CoordinateOrder = CoordinateOrder::RowColumn;

    /// Order used by the wall check.
    #[must_use]
    pub const fn wall_order(self) -> CoordinateOrder {
        match self {
            Self::Canonical => CoordinateOrder::RowColumn,
            Self::Legacy => CoordinateOrder::ColumnRow,
        }
    }
}

/// Reasons a query is dropped without a reply.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The line could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The stated position lies outside the maze.
    #[error("position {position} lies outside the {lines}x{columns} maze")]
    OutOfBounds {
        /// The offending position.
        position: Position,
        /// Maze row count.
        lines: usize,
        /// Maze column count.
        columns: usize,
    },
}

/// One inbound query together with the channel its replies go back on.
#[derive(Debug)]
pub struct Envelope {
    /// Name of the sending explorer.
    pub sender: String,
    /// Raw query line.
    pub content: String,
    /// Receives the ordered replies, empty when the query was dropped.
    pub reply: oneshot::Sender<Vec<Response>>,
}

/// The coordinator stopped before answering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("the coordinator is no longer running")]
pub struct Disconnected;

/// Cloneable handle used to send queries to a running coordinator.
#[derive(Clone, Debug)]
pub struct Mailbox {
    /// Sending half of the coordinator inbox.
    inbox: mpsc::Sender<Envelope>,
}

impl Mailbox {
    /// Sends `content` on behalf of `explorer` and waits for the replies.
    ///
    /// # Errors
    ///
    /// [`Disconnected`] if the coordinator task has stopped.
    pub async fn send(
        &self,
        explorer: &str,
        content: String,
    ) -> Result<Vec<Response>, Disconnected> {
        let (reply, replies) = oneshot::channel();
        self.inbox
            .send(Envelope {
                sender: explorer.to_owned(),
                content,
                reply,
            })
            .await
            .map_err(|_err| Disconnected)?;

        replies.await.map_err(|_err| Disconnected)
    }
}

/// Creates a coordinator inbox holding up to `capacity` envelopes and its sending handle.
#[must_use]
pub fn mailbox(capacity: usize) -> (Mailbox, mpsc::Receiver<Envelope>) {
    let (inbox, receiver) = mpsc::channel(capacity);
    (Mailbox { inbox }, receiver)
}

/// Read-only view of a coordinator's maze and position table.
///
/// This structure is what snapshot consumers such as the terminal viewer hold. It shares the
/// maze and the position table with the coordinator it was taken from, but it only exposes
/// reads, which leaves the coordinator as the sole writer of explorer positions.
#[derive(Clone, Debug)]
pub struct View {
    /// Immutable maze shared with the coordinator.
    maze: Arc<Maze>,
    /// The coordinator's position table, only ever snapshotted through this view.
    positions: PositionTable,
}

impl View {
    /// Shared handle to the maze.
    #[must_use]
    pub fn maze(&self) -> Arc<Maze> {
        Arc::clone(&self.maze)
    }

    /// Consistent copy of every explorer's last reported cell.
    ///
    /// The copy is taken under the table's read lock, so it never mixes positions from before
    /// and after a concurrent update.
    #[must_use]
    pub fn explorer_positions(&self) -> BTreeMap<String, Position> {
        self.positions.snapshot()
    }
}

/// Owner of the generated maze and the explorer position table.
///
/// This structure is the single authority the explorers talk to. It validates every query,
/// records the sender's stated position and answers with the ordered `exit`, `wall` and `pass`
/// replies. It is not [`Clone`]; other tasks observe it through a [`View`] and reach it through a
/// [`Mailbox`] once [`Coordinator::spawn`] has moved it onto its own task.
#[derive(Debug)]
pub struct Coordinator {
    /// Immutable maze shared with viewers.
    maze: Arc<Maze>,
    /// Last reported position of every explorer.
    positions: PositionTable,
    /// Coordinate reading policy.
    mode: CoordinateMode,
}

impl Coordinator {
    /// Creates a coordinator over `maze` with an empty position table.
    #[must_use]
    pub fn new(maze: Arc<Maze>, mode: CoordinateMode) -> Self {
        Self {
            maze,
            positions: PositionTable::new(),
            mode,
        }
    }

    /// Shared handle to the maze, safe to read at any time.
    #[must_use]
    pub fn maze(&self) -> Arc<Maze> {
        Arc::clone(&self.maze)
    }

    /// Read-only view sharing this coordinator's maze and position table.
    #[must_use]
    pub fn view(&self) -> View {
        View {
            maze: Arc::clone(&self.maze),
            positions: self.positions.clone(),
        }
    }

    /// Handle to the live position table.
    #[must_use]
    pub(crate) const fn positions(&self) -> &PositionTable {
        &self.positions
    }

    /// Consistent copy of every explorer's last reported cell.
    #[must_use]
    pub fn explorer_positions(&self) -> BTreeMap<String, Position> {
        self.positions.snapshot()
    }

    /// Serves one query and returns its replies in `exit`, `wall`, `pass` order.
    ///
    /// The position is validated before anything is recorded, so a failing query leaves the
    /// position table untouched. An unknown direction keyword still records the position and is
    /// answered with a lone `pass`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Parse`] if the line is empty or its position is malformed.
    /// - [`QueryError::OutOfBounds`] if a position reading falls outside the maze.
    pub fn query(&self, sender: &str, content: &str) -> Result<Vec<Response>, QueryError> {
        let message: Message = content.parse()?;
        let parameters = message.joined_parameters();
        let heading = Heading::from(message.action());

        let position = CoordinateMode::EXIT_ORDER.decode(message.action(), &parameters)?;
        let wall_position = self
            .mode
            .wall_order()
            .decode(message.action(), &parameters)?;
        for reading in [position, wall_position] {
            if !self.maze.contains(reading) {
                return Err(QueryError::OutOfBounds {
                    position: reading,
                    lines: self.maze.lines(),
                    columns: self.maze.columns(),
                });
            }
        }

        self.positions.record(sender, position);

        let mut responses = Vec::with_capacity(3);
        let exit = self.maze.exit();
        if position == exit.position && heading.direction() == Some(exit.side) {
            responses.push(Response::Exit);
        }
        match heading.direction() {
            Some(direction) => {
                if self.maze.is_wall(wall_position, direction) == Some(true) {
                    responses.push(Response::Wall);
                }
            }
            None => warn!(sender, %heading, "unknown direction, treating as open"),
        }
        responses.push(Response::Pass);

        Ok(responses)
    }

    /// Serves one query, logging and dropping it on failure.
    #[must_use]
    pub fn handle(&self, sender: &str, content: &str) -> Vec<Response> {
        debug!("[{sender} -> {COORDINATOR_NAME}]: {content}");
        self.query(sender, content).unwrap_or_else(|err| {
            warn!(sender, content, error = %err, "dropping query");
            Vec::new()
        })
    }

    /// Drains `inbox` until every [`Mailbox`] is dropped.
    pub async fn run(self, mut inbox: mpsc::Receiver<Envelope>) {
        let exit = self.maze.exit();
        info!(
            lines = self.maze.lines(),
            columns = self.maze.columns(),
            exit = %exit.position,
            side = %exit.side,
            "starting {COORDINATOR_NAME}"
        );

        while let Some(envelope) = inbox.recv().await {
            let replies = self.handle(&envelope.sender, &envelope.content);
            if envelope.reply.send(replies).is_err() {
                debug!(sender = %envelope.sender, "explorer left before its replies arrived");
            }
        }

        info!("{COORDINATOR_NAME} stopped");
    }

    /// Spawns the coordinator loop on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> (Mailbox, JoinHandle<()>) {
        let (mailbox, receiver) = mailbox(INBOX_CAPACITY);
        let task = tokio::spawn(self.run(receiver));

        (mailbox, task)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::{Mutex, PoisonError},
    };

    use super::*;
    use crate::{
        cell::{Cell, Direction},
        maze::Exit,
    };

    /// Builds a 6x7 maze with its exit on the top side of `(0, 5)`, a wall on the left of
    /// `(3, 3)` and a wall above `(5, 0)`.
    fn create_test_maze() -> Arc<Maze> {
        let (lines, columns) = (6, 7);
        let mut cells = vec![Cell::OPEN; lines * columns];
        let mut wall = |row: usize, column: usize, side: Direction| {
            if let Some(cell) = cells.get_mut(row * columns + column) {
                cell.set_wall(side, true);
            }
        };

        for column in 0..columns {
            if column != 5 {
                wall(0, column, Direction::Up);
            }
            wall(lines - 1, column, Direction::Down);
        }
        for row in 0..lines {
            wall(row, 0, Direction::Left);
            wall(row, columns - 1, Direction::Right);
        }
        wall(3, 3, Direction::Left);
        wall(3, 2, Direction::Right);
        wall(5, 0, Direction::Up);
        wall(4, 0, Direction::Down);

        let exit = Exit {
            position: Position::new(0, 5),
            side: Direction::Up,
        };
        Arc::new(Maze::new(lines, columns, cells, exit).expect("failed to build test maze"))
    }

    fn create_test_coordinator(mode: CoordinateMode) -> Coordinator {
        Coordinator::new(create_test_maze(), mode)
    }

    #[test]
    fn test_exit_query_replies_exit_then_pass() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.handle("explorer-1", "up 0 5"),
            vec![Response::Exit, Response::Pass]
        );
    }

    #[test]
    fn test_wall_query_replies_wall_then_pass() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.handle("explorer-1", "left 3 3"),
            vec![Response::Wall, Response::Pass]
        );
    }

    #[test]
    fn test_open_query_replies_pass_only() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.handle("explorer-1", "right 3 3"),
            vec![Response::Pass]
        );
        assert_eq!(
            coordinator.handle("explorer-1", "down 3 3"),
            vec![Response::Pass]
        );
    }

    #[test]
    fn test_boundary_next_to_exit_is_walled() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.handle("explorer-1", "up 0 4"),
            vec![Response::Wall, Response::Pass]
        );
        assert_eq!(
            coordinator.handle("explorer-1", "left 0 5"),
            vec![Response::Pass]
        );
    }

    #[test]
    fn test_every_query_records_position() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        let _replies = coordinator.handle("explorer-1", "left 3 3");
        let _replies = coordinator.handle("explorer-2", "up 1 1");
        let _replies = coordinator.handle("explorer-1", "up 0 5");

        let positions = coordinator.explorer_positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions.get("explorer-1"), Some(&Position::new(0, 5)));
        assert_eq!(positions.get("explorer-2"), Some(&Position::new(1, 1)));
    }

    #[test]
    fn test_missing_position_is_dropped() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.query("explorer-1", "left"),
            Err(QueryError::Parse(ParseError::MissingPosition {
                action: "left".to_owned()
            }))
        );
        assert!(coordinator.handle("explorer-1", "left").is_empty());
        assert!(coordinator.positions().is_empty());
    }

    /// In-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        /// Number of captured lines logged at `level`.
        fn count(&self, level: &str) -> usize {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.split_whitespace().any(|word| word == level))
                .count()
        }
    }

    /// Runs `serve` under a subscriber that captures everything down to debug level.
    fn capture_logs<F: FnOnce()>(serve: F) -> LogBuffer {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, serve);
        buffer
    }

    #[test]
    fn test_dropped_query_logs_exactly_one_error() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        let logs = capture_logs(|| {
            assert!(coordinator.handle("explorer-1", "left").is_empty());
        });

        assert_eq!(logs.count("WARN"), 1);
        assert_eq!(logs.count("DEBUG"), 1, "the inbound line is still logged");
        assert!(coordinator.positions().is_empty());
    }

    #[test]
    fn test_valid_query_logs_no_error() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        let logs = capture_logs(|| {
            assert_eq!(
                coordinator.handle("explorer-1", "up 0 5"),
                vec![Response::Exit, Response::Pass]
            );
        });

        assert_eq!(logs.count("WARN"), 0);
        assert_eq!(logs.count("DEBUG"), 1);
    }

    #[test]
    fn test_malformed_queries_do_not_mutate_state() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);
        coordinator.positions().record("explorer-1", Position::new(2, 2));

        for content in ["", "up x 1", "up 1 2 3", "down 6 0", "right 0 7"] {
            assert!(
                coordinator.handle("explorer-1", content).is_empty(),
                "`{content}` should be dropped"
            );
        }

        assert_eq!(
            coordinator.positions().get("explorer-1"),
            Some(Position::new(2, 2))
        );
    }

    #[test]
    fn test_out_of_bounds_is_reported() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.query("explorer-1", "down 6 0"),
            Err(QueryError::OutOfBounds {
                position: Position::new(6, 0),
                lines: 6,
                columns: 7
            })
        );
    }

    #[test]
    fn test_unknown_direction_still_passes() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);

        assert_eq!(
            coordinator.handle("explorer-1", "jump 3 3"),
            vec![Response::Pass]
        );
        assert_eq!(
            coordinator.positions().get("explorer-1"),
            Some(Position::new(3, 3))
        );
    }

    #[test]
    fn test_legacy_mode_reads_wall_position_swapped() {
        let coordinator = create_test_coordinator(CoordinateMode::Legacy);

        // The exit check reads (0, 5) while the wall check reads (5, 0), which is walled above.
        assert_eq!(
            coordinator.handle("explorer-1", "up 0 5"),
            vec![Response::Exit, Response::Wall, Response::Pass]
        );
        assert_eq!(
            coordinator.positions().get("explorer-1"),
            Some(Position::new(0, 5))
        );

        // (3, 3) reads the same either way.
        assert_eq!(
            coordinator.handle("explorer-1", "left 3 3"),
            vec![Response::Wall, Response::Pass]
        );
    }

    #[test]
    fn test_legacy_mode_drops_when_swapped_reading_is_outside() {
        let coordinator = create_test_coordinator(CoordinateMode::Legacy);

        assert_eq!(
            coordinator.query("explorer-1", "up 0 6"),
            Err(QueryError::OutOfBounds {
                position: Position::new(6, 0),
                lines: 6,
                columns: 7
            })
        );
        assert!(coordinator.positions().is_empty());
    }

    #[test]
    fn test_view_follows_coordinator_updates() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);
        let view = coordinator.view();
        assert!(view.explorer_positions().is_empty());

        let _replies = coordinator.handle("explorer-1", "down 4 2");

        assert_eq!(
            view.explorer_positions().get("explorer-1"),
            Some(&Position::new(4, 2))
        );
        assert_eq!(view.maze().exit(), coordinator.maze().exit());
    }

    #[tokio::test]
    async fn test_mailbox_round_trip() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);
        let view = coordinator.view();
        let (mailbox, task) = coordinator.spawn();

        let replies = mailbox
            .send("explorer-1", "left 3 3".to_owned())
            .await
            .expect("coordinator stopped early");
        assert_eq!(replies, vec![Response::Wall, Response::Pass]);

        let replies = mailbox
            .send("explorer-1", "left".to_owned())
            .await
            .expect("coordinator stopped early");
        assert!(replies.is_empty());

        drop(mailbox);
        task.await.expect("coordinator task panicked");

        assert_eq!(
            view.explorer_positions().get("explorer-1"),
            Some(&Position::new(3, 3))
        );
    }

    #[tokio::test]
    async fn test_queries_from_one_explorer_keep_their_order() {
        let coordinator = create_test_coordinator(CoordinateMode::Canonical);
        let positions = coordinator.positions().clone();
        let (mailbox, task) = coordinator.spawn();

        for column in 0..7 {
            let _replies = mailbox
                .send("explorer-1", format!("right 2 {column}"))
                .await
                .expect("coordinator stopped early");
            assert_eq!(positions.get("explorer-1"), Some(Position::new(2, column)));
        }

        drop(mailbox);
        task.await.expect("coordinator task panicked");
    }

    #[tokio::test]
    async fn test_mailbox_reports_stopped_coordinator() {
        let (mailbox, receiver) = mailbox(1);
        drop(receiver);

        assert_eq!(
            mailbox.send("explorer-1", "up 1 1".to_owned()).await,
            Err(Disconnected)
        );
    }
}
