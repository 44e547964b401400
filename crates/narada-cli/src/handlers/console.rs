//! Commands typed on stdin while `narada run` is active.

use narada_core::ServiceKind;
use narada_runtime::StartOutcome;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{render_license_state, render_snapshot};

pub const HELP: &str = "\
Commands:
  status                      show both services and the license
  start relay|analyzer [ID]   start a service (analyzer with preset ID)
  stop relay|analyzer         stop a service
  restart relay|analyzer      stop, pause, start again
  alive relay|analyzer        probe the OS for the process
  preset ID                   restart the analyzer with preset ID
  check                       run the license checker now
  quit                        stop everything and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Status,
    Start {
        kind: ServiceKind,
        preset: Option<String>,
    },
    Stop(ServiceKind),
    Restart(ServiceKind),
    Alive(ServiceKind),
    Preset(String),
    Check,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CliError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match (verb, rest.as_slice()) {
            ("status", []) => Self::Status,
            ("start", [kind]) => Self::Start {
                kind: service(kind)?,
                preset: None,
            },
            ("start", [kind, preset]) => {
                let kind = service(kind)?;
                if kind != ServiceKind::Analyzer {
                    return Err(CliError::Arguments(
                        "only the analyzer takes a preset".to_string(),
                    ));
                }
                Self::Start {
                    kind,
                    preset: Some((*preset).to_string()),
                }
            }
            ("stop", [kind]) => Self::Stop(service(kind)?),
            ("restart", [kind]) => Self::Restart(service(kind)?),
            ("alive", [kind]) => Self::Alive(service(kind)?),
            ("preset", [id]) => Self::Preset((*id).to_string()),
            ("check", []) => Self::Check,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => {
                return Err(CliError::Arguments(format!(
                    "unrecognised command `{}`; type `help`",
                    line.trim()
                )));
            }
        };
        Ok(Some(command))
    }
}

fn service(word: &str) -> Result<ServiceKind, CliError> {
    match word {
        "relay" => Ok(ServiceKind::Relay),
        "analyzer" => Ok(ServiceKind::Analyzer),
        other => Err(CliError::Arguments(format!("unknown service `{other}`"))),
    }
}

/// Carry out a console command. Failures are printed, never returned, so a
/// typo does not end the session.
pub async fn apply(ctx: &CliContext, command: ConsoleCommand) {
    if let Err(e) = dispatch(ctx, command).await {
        eprintln!("error: {e}");
    }
}

async fn dispatch(ctx: &CliContext, command: ConsoleCommand) -> Result<(), CliError> {
    let runtime = ctx.runtime();
    let orchestrator = runtime.orchestrator();

    match command {
        ConsoleCommand::Status => {
            for kind in ServiceKind::ALL {
                println!("{}", render_snapshot(&runtime.get_status(kind)));
            }
            println!(
                "License   {}",
                render_license_state(&runtime.last_license_state())
            );
        }
        ConsoleCommand::Start {
            kind: ServiceKind::Analyzer,
            preset,
        } => {
            let id = match preset {
                Some(id) => id,
                None => runtime.presets().last_used()?,
            };
            report(ServiceKind::Analyzer, runtime.start_analyzer_with_preset(&id)?);
        }
        ConsoleCommand::Start { kind, .. } => {
            report(kind, orchestrator.ensure_started(kind, None)?);
        }
        ConsoleCommand::Stop(kind) => {
            orchestrator.stop(kind);
        }
        ConsoleCommand::Restart(kind) => {
            orchestrator.restart(kind).await?;
        }
        ConsoleCommand::Alive(kind) => {
            let alive = orchestrator.probe_alive(kind);
            println!(
                "{} is {}",
                kind.label(),
                if alive { "alive" } else { "not running" }
            );
        }
        ConsoleCommand::Preset(id) => {
            runtime.reconfigure_analyzer_with_preset(&id).await?;
        }
        ConsoleCommand::Check => {
            runtime.check_license().await;
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
    Ok(())
}

fn report(kind: ServiceKind, outcome: StartOutcome) {
    if let StartOutcome::AlreadyRunning { pid } = outcome {
        match pid {
            Some(pid) => println!("{} already running (pid {pid})", kind.label()),
            None => println!("{} is already starting", kind.label()),
        }
    }
}
