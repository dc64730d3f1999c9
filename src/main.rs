//! This crate contains the source code for the `labyrinth-explorers` binary.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]
#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use clap::Parser as _;
use color_eyre::{eyre::Result, install};
use labyrinth_explorers::{config::Config, logging, simulation::Simulation, App};
use tokio::runtime::Runtime;
use tracing::info;

fn main() -> Result<()> {
    install()?;

    let config = Config::parse();
    logging::init(&config)?;

    let runtime = Runtime::new()?;
    let _guard = runtime.enter();
    let simulation = Simulation::start(&config)?;
    info!(seed = simulation.seed(), "simulation started");

    if config.headless {
        let outcomes = runtime.block_on(simulation.wait())?;
        for (explorer, outcome) in &outcomes {
            info!(%explorer, ?outcome, "explorer finished");
        }
        return Ok(());
    }

    let mut terminal = ratatui::init();
    let result = App::new(
        simulation.view().clone(),
        simulation.scoreboard().clone(),
    )
    .run(&mut terminal);
    ratatui::restore();
    simulation.abort();

    result
}
