//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use narada_cli::{AnalyzerCommand, Cli, CliConfig, CliError, Commands, bootstrap, handlers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(CliConfig {
        data_dir: cli.data_dir,
        resource_dir: cli.resource_dir,
    })?;

    match command {
        Commands::Run { preset, json } => {
            handlers::run::execute(&ctx, preset.as_deref(), json).await?;
        }
        Commands::License { json } => handlers::license::execute(&ctx, json).await?,
        Commands::Presets { command } => handlers::presets::execute(&ctx, command)?,
        Commands::Streams { command } => handlers::streams::execute(&ctx, command).await?,
        Commands::Analyzer {
            command: AnalyzerCommand::Args { preset },
        } => handlers::analyzer::execute(&ctx, preset.as_deref())?,
        Commands::Settings { command } => handlers::settings::execute(&ctx, command)?,
        Commands::Paths => handlers::paths::execute(&ctx),
    }
    Ok(())
}
