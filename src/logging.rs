//! Tracing subscriber installation.

use std::{fs::File, io, sync::Arc};

use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Filter applied when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "labyrinth_explorers=info";

/// Installs the global subscriber.
///
/// Headless runs log to stderr. While the viewer owns the terminal, logs go to
/// [`Config::log_file`] instead so they do not tear the rendered frame.
///
/// # Errors
///
/// - [`std::io::Error`] if the log file cannot be created.
/// - An error if a global subscriber is already installed.
pub fn init(config: &Config) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_err) => EnvFilter::try_new(DEFAULT_DIRECTIVE)?,
    };
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = if config.headless {
        subscriber.with_writer(io::stderr).try_init()
    } else {
        let file = File::create(&config.log_file)?;
        subscriber
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .try_init()
    };

    installed.map_err(|err| eyre!("failed to install log subscriber: {err}"))
}
