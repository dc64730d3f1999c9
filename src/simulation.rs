//! Startup wiring: one maze, one coordinator, many explorers.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use color_eyre::eyre::Result;
use rand::{rngs::SmallRng, SeedableRng as _};
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    config::Config,
    coordinator::{Coordinator, View},
    explorer::{Explorer, Outcome},
    generator::{GenerationError, MazeGenerator},
};

/// Final outcome of every explorer that has finished so far.
///
/// This structure is shared between the explorer tasks, which record their outcome once when they
/// stop, and the viewer, which reads the escape count on every frame. Cloning it clones the
/// handle, not the outcomes.
#[derive(Clone, Debug, Default)]
pub struct Scoreboard {
    /// Outcomes keyed by explorer name.
    outcomes: Arc<Mutex<BTreeMap<String, Outcome>>>,
}

impl Scoreboard {
    /// Records how `explorer` finished.
    pub fn record(&self, explorer: &str, outcome: Outcome) {
        let _previous = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(explorer.to_owned(), outcome);
    }

    /// Copy of every recorded outcome.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Outcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of explorers that found the exit.
    #[must_use]
    pub fn escaped(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|outcome| outcome.escaped())
            .count()
    }
}

/// A running simulation.
///
/// This structure owns the join handles of the coordinator task and of every explorer task, along
/// with the read-only view and the scoreboard that snapshot consumers need. Dropping it does not
/// stop the tasks; use [`Simulation::abort`] or [`Simulation::wait`] for that.
#[derive(Debug)]
pub struct Simulation {
    /// Seed the maze and explorers were derived from.
    seed: u64,
    /// Read-only view of the coordinator, sharing its maze and position table.
    view: View,
    /// Outcomes of finished explorers.
    scoreboard: Scoreboard,
    /// The coordinator loop.
    coordinator_task: JoinHandle<()>,
    /// One task per explorer.
    explorer_tasks: Vec<JoinHandle<Outcome>>,
}

impl Simulation {
    /// Generates the maze and spawns the coordinator and every explorer on the current runtime.
    ///
    /// Explorer `n` (counting from one) is seeded with `seed + n`. The coordinator stops on its
    /// own once every explorer has finished.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::TooSmall`] if the configured grid is smaller than 2x2.
    /// - [`GenerationError::TooLarge`] if a configured dimension exceeds
    ///   [`MAX_DIMENSION`](crate::generator::MAX_DIMENSION). Nothing is spawned in either case.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: &Config) -> Result<Self, GenerationError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let maze = MazeGenerator::seeded(seed).generate(config.lines, config.columns)?;
        let bounds = (maze.lines(), maze.columns());
        info!(seed, lines = bounds.0, columns = bounds.1, "maze generated");

        let coordinator = Coordinator::new(Arc::new(maze), config.coordinates);
        let view = coordinator.view();
        let (mailbox, coordinator_task) = coordinator.spawn();

        let scoreboard = Scoreboard::default();
        let explorer_tasks = (1_u64..)
            .zip(0..config.explorer_count)
            .map(|(ordinal, _)| {
                let name = format!("explorer-{ordinal}");
                let explorer = Explorer::new(
                    name.clone(),
                    mailbox.clone(),
                    bounds,
                    config.pace(),
                    SmallRng::seed_from_u64(seed.wrapping_add(ordinal)),
                );
                let scoreboard = scoreboard.clone();
                tokio::spawn(async move {
                    let outcome = explorer.run().await;
                    scoreboard.record(&name, outcome);
                    outcome
                })
            })
            .collect();

        Ok(Self {
            seed,
            view,
            scoreboard,
            coordinator_task,
            explorer_tasks,
        })
    }

    /// Seed the run was derived from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only view of the coordinator for snapshot consumers.
    #[must_use]
    pub const fn view(&self) -> &View {
        &self.view
    }

    /// Outcomes of finished explorers.
    #[must_use]
    pub const fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Waits for every explorer and then for the coordinator to wind down.
    ///
    /// # Errors
    ///
    /// - [`tokio::task::JoinError`] if a task panicked or was cancelled.
    pub async fn wait(self) -> Result<BTreeMap<String, Outcome>> {
        for task in self.explorer_tasks {
            let _outcome = task.await?;
        }
        self.coordinator_task.await?;

        let outcomes = self.scoreboard.snapshot();
        info!(
            explorers = outcomes.len(),
            escaped = self.scoreboard.escaped(),
            "simulation finished"
        );

        Ok(outcomes)
    }

    /// Cancels every running task.
    pub fn abort(&self) {
        for task in &self.explorer_tasks {
            task.abort();
        }
        self.coordinator_task.abort();
    }
}
