//! `narada run`: the long-lived supervisor session.

use narada_core::StatusEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::console::{self, ConsoleCommand};
use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::render_event;

/// Start the license schedule (which brings up the relay), optionally the
/// analyzer, and print every status event until Ctrl-C or `quit`.
pub async fn execute(ctx: &CliContext, preset: Option<&str>, json: bool) -> Result<(), CliError> {
    let runtime = ctx.runtime();
    let (subscription, mut events) = runtime.bus().subscribe_channel(None);

    runtime.start_background();
    if let Some(id) = preset {
        if let Err(e) = runtime.start_analyzer_with_preset(id) {
            eprintln!("error: {}", CliError::from(e));
        }
    }
    if !json {
        eprintln!("Supervisor running. Type `help` for commands, Ctrl-C to quit.");
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupt received");
                break;
            }
            Some(event) = events.recv() => print_event(&event, json),
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => match ConsoleCommand::parse(&line) {
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(command)) => console::apply(ctx, command).await,
                    Ok(None) => {}
                    Err(e) => eprintln!("{e}"),
                },
                Ok(None) => input_open = false,
                Err(e) => {
                    warn!(error = %e, "console input unavailable");
                    input_open = false;
                }
            },
        }
    }

    runtime.shutdown().await;
    while let Ok(event) = events.try_recv() {
        print_event(&event, json);
    }
    runtime.bus().unsubscribe(subscription);
    Ok(())
}

fn print_event(event: &StatusEvent, json: bool) {
    if !json {
        println!("{}", render_event(event));
        return;
    }
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(event = event.event_name(), error = %e, "could not encode event"),
    }
}
