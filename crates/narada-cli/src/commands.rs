//! Subcommands of the `narada` binary.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use narada_core::StreamType;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the supervisor: check the license, start the relay, and stream
    /// status events until interrupted. Reads console commands from stdin.
    Run {
        /// Also start the analyzer with this preset
        #[arg(long)]
        preset: Option<String>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Run the license checker once and print the verdict
    License {
        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage analyzer presets
    Presets {
        #[command(subcommand)]
        command: PresetCommand,
    },

    /// Manage configured viewer streams
    Streams {
        #[command(subcommand)]
        command: StreamCommand,
    },

    /// Inspect how the analyzer would be launched
    Analyzer {
        #[command(subcommand)]
        command: AnalyzerCommand,
    },

    /// Show and edit persisted settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Show resolved data and collaborator paths
    Paths,
}

#[derive(Subcommand)]
pub enum PresetCommand {
    /// List built-in and custom presets
    List,

    /// Show one preset and the analyzer flags it produces
    Show { id: String },

    /// Create a custom preset, or overwrite one with --id
    Save {
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Overwrite this custom preset instead of creating a new one
        #[arg(long)]
        id: Option<String>,
        /// Start from the settings of this preset
        #[arg(long = "from")]
        base: Option<String>,
        /// JSON file with analyzer settings, applied over --from
        #[arg(long = "settings-file")]
        settings_file: Option<PathBuf>,
    },

    /// Delete a custom preset
    Delete { id: String },

    /// Make a preset the selected one
    Select { id: String },
}

#[derive(Subcommand)]
pub enum StreamCommand {
    /// List configured streams in display order
    List {
        /// Only enabled streams
        #[arg(long)]
        enabled: bool,
    },

    /// Add a stream
    Add {
        /// Unique id
        #[arg(long)]
        id: String,
        /// Relay path name, e.g. `drone`
        #[arg(long)]
        name: String,
        #[arg(long = "display-name", default_value = "")]
        display_name: String,
        #[arg(long = "type", value_enum, default_value_t = StreamTypeArg::Hls)]
        stream_type: StreamTypeArg,
        /// Playback URL; derived from the relay base URLs when omitted
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        disabled: bool,
    },

    /// Enable or disable a stream
    Toggle {
        id: String,
        #[arg(long)]
        off: bool,
    },

    /// Remove a stream
    Delete { id: String },

    /// Print the HLS, RTSP and RTMP URLs the relay serves for a path name
    Urls { name: String },

    /// Check that a stream URL accepts TCP connections
    Probe {
        url: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[derive(Subcommand)]
pub enum AnalyzerCommand {
    /// Print the analyzer command line for a preset
    Args {
        /// Preset id; the selected preset when omitted
        #[arg(long)]
        preset: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print stored settings and their effective values
    Show,

    /// Update one or more settings
    Set {
        #[arg(long = "license-interval")]
        license_check_interval_secs: Option<u64>,
        #[arg(long = "license-timeout")]
        license_check_timeout_secs: Option<u64>,
        #[arg(long = "restart-settle-ms")]
        restart_settle_ms: Option<u64>,
        #[arg(long = "stop-grace")]
        stop_grace_secs: Option<u64>,
        #[arg(long = "source-url")]
        analyzer_source_url: Option<String>,
        #[arg(long = "output-url")]
        analyzer_output_url: Option<String>,
        #[arg(long = "license-python")]
        license_python: Option<String>,
    },
}

/// Stream transport as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamTypeArg {
    Hls,
    Rtsp,
    Rtmp,
    Webrtc,
}

impl From<StreamTypeArg> for StreamType {
    fn from(arg: StreamTypeArg) -> Self {
        match arg {
            StreamTypeArg::Hls => Self::Hls,
            StreamTypeArg::Rtsp => Self::Rtsp,
            StreamTypeArg::Rtmp => Self::Rtmp,
            StreamTypeArg::Webrtc => Self::Webrtc,
        }
    }
}
