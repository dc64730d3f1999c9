//! Startup configuration parsed from the command line.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{coordinator::CoordinateMode, explorer::Pace};

/// Default grid row count.
pub const DEFAULT_LINES: usize = 21;

/// Default grid column count.
pub const DEFAULT_COLUMNS: usize = 23;

/// Default number of explorer actors.
pub const DEFAULT_EXPLORERS: usize = 5;

/// Default pause between two explorer moves, in milliseconds.
pub const DEFAULT_STEP_DELAY_MS: u64 = 7;

/// Default log file used while the viewer owns the terminal.
pub const DEFAULT_LOG_FILE: &str = "labyrinth-explorers.log";

/// Explorer actors searching a generated maze for its exit.
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Number of maze rows.
    #[arg(long, default_value_t = DEFAULT_LINES)]
    pub lines: usize,

    /// Number of maze columns.
    #[arg(long, default_value_t = DEFAULT_COLUMNS)]
    pub columns: usize,

    /// Number of concurrent explorers.
    #[arg(long = "explorers", default_value_t = DEFAULT_EXPLORERS)]
    pub explorer_count: usize,

    /// Pause between two moves of an explorer, in milliseconds.
    #[arg(long = "step-delay", value_name = "MS", default_value_t = DEFAULT_STEP_DELAY_MS)]
    pub step_delay_ms: u64,

    /// Seed for the maze and the explorers; drawn at random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Moves after which an explorer gives up; unlimited when omitted.
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// How the coordinator reads the two integers of a query position.
    #[arg(long, value_enum, default_value_t = CoordinateMode::Canonical)]
    pub coordinates: CoordinateMode,

    /// Run without the terminal viewer and log to stderr.
    #[arg(long)]
    pub headless: bool,

    /// Log file used while the viewer is running.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lines: DEFAULT_LINES,
            columns: DEFAULT_COLUMNS,
            explorer_count: DEFAULT_EXPLORERS,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            seed: None,
            max_steps: None,
            coordinates: CoordinateMode::Canonical,
            headless: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Pause between two moves of an explorer.
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Explorer pacing derived from this configuration.
    #[must_use]
    pub const fn pace(&self) -> Pace {
        Pace {
            step_delay: self.step_delay(),
            max_steps: self.max_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        let parsed = Config::try_parse_from(["labyrinth-explorers"]).expect("failed to parse");

        assert_eq!(parsed, Config::default());
        assert_eq!(parsed.lines, 21);
        assert_eq!(parsed.columns, 23);
        assert_eq!(parsed.explorer_count, 5);
        assert_eq!(parsed.step_delay(), Duration::from_millis(7));
    }

    #[test]
    fn test_parse_every_option() {
        let parsed = Config::try_parse_from([
            "labyrinth-explorers",
            "--lines",
            "8",
            "--columns",
            "9",
            "--explorers",
            "2",
            "--step-delay",
            "50",
            "--seed",
            "1234",
            "--max-steps",
            "500",
            "--coordinates",
            "legacy",
            "--headless",
            "--log-file",
            "run.log",
        ])
        .expect("failed to parse");

        assert_eq!(parsed.lines, 8);
        assert_eq!(parsed.columns, 9);
        assert_eq!(parsed.explorer_count, 2);
        assert_eq!(parsed.seed, Some(1234));
        assert_eq!(parsed.coordinates, CoordinateMode::Legacy);
        assert!(parsed.headless);
        assert_eq!(parsed.log_file, PathBuf::from("run.log"));
        assert_eq!(
            parsed.pace(),
            Pace {
                step_delay: Duration::from_millis(50),
                max_steps: Some(500),
            }
        );
    }

    #[test]
    fn test_rejects_unknown_coordinate_mode() {
        let result =
            Config::try_parse_from(["labyrinth-explorers", "--coordinates", "diagonal"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_negative_dimensions() {
        let result = Config::try_parse_from(["labyrinth-explorers", "--lines", "-3"]);

        assert!(result.is_err());
    }
}
