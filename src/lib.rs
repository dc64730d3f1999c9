//! Explorers wandering a generated labyrinth.
//!
//! A maze is carved by recursive division, then a single coordinator task answers movement
//! queries from many concurrent explorer tasks over a small text protocol. Each explorer walks at
//! random until the coordinator tells it that it stands next to the exit. The optional terminal
//! viewer renders snapshots of the maze and of the latest reported explorer positions.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]

pub mod app;
pub mod cell;
pub mod config;
pub mod coordinator;
mod events;
pub mod explorer;
pub mod generator;
pub mod logging;
pub mod maze;
pub mod positions;
pub mod protocol;
pub mod simulation;
mod ui;

pub use app::App;
