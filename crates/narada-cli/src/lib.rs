//! Headless control panel for the narada supervisor.
//!
//! Parses the command line, composes a `NaradaRuntime` in [`bootstrap`] and
//! hands each subcommand to a handler.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{AnalyzerCommand, Commands, PresetCommand, SettingsCommand, StreamCommand};
pub use error::CliError;
pub use parser::Cli;
