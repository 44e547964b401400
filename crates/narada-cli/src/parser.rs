//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;
use narada_core::paths::{DATA_DIR_ENV, RESOURCE_DIR_ENV};

use crate::commands::Commands;

/// Command-line interface for the narada service supervisor.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "narada")]
#[command(about = "Supervise the drone video relay, analyzer and license checker")]
#[command(version)]
pub struct Cli {
    /// Directory holding presets, streams and settings
    #[arg(long = "data-dir", global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the relay, analyzer and license checker
    #[arg(long = "resource-dir", global = true, env = RESOURCE_DIR_ENV)]
    pub resource_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{PresetCommand, StreamCommand};
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "narada",
            "--verbose",
            "--data-dir",
            "/tmp/narada",
            "--resource-dir",
            "/opt/narada",
            "paths",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/narada")));
        assert_eq!(cli.resource_dir, Some(PathBuf::from("/opt/narada")));
        assert!(matches!(cli.command, Some(Commands::Paths)));
    }

    #[test]
    fn test_nested_subcommands() {
        let cli = Cli::parse_from(["narada", "presets", "select", "traffic"]);
        let Some(Commands::Presets {
            command: PresetCommand::Select { id },
        }) = cli.command
        else {
            panic!("expected presets select");
        };
        assert_eq!(id, "traffic");

        let cli = Cli::parse_from(["narada", "streams", "probe", "rtsp://cam.local/feed"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Streams {
                command: StreamCommand::Probe { .. }
            })
        ));
    }

    #[test]
    fn test_run_takes_optional_preset() {
        let cli = Cli::parse_from(["narada", "run", "--preset", "multiscale", "--json"]);
        let Some(Commands::Run { preset, json }) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(preset.as_deref(), Some("multiscale"));
        assert!(json);
    }
}
