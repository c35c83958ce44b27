// ABOUTME: Entry point for the dockyard CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dockyard::config;
use dockyard::error::Result;
use dockyard::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", path.display()));
            Ok(())
        }
        Commands::Up => {
            let config = commands::load_config(config_path)?;
            commands::up(config, output).await
        }
        Commands::Down { volumes } => {
            let config = commands::load_config(config_path)?;
            commands::down(config, volumes, output).await
        }
        Commands::Ps { all } => {
            let engine = commands::load_engine_config(config_path)?;
            commands::ps(&engine, all, output).await
        }
        Commands::Exec { name, sh, command } => {
            let engine = commands::load_engine_config(config_path)?;
            commands::exec_command(&engine, &name, command, sh, output).await
        }
        Commands::Logs { name, tail, follow } => {
            let engine = commands::load_engine_config(config_path)?;
            commands::logs(&engine, &name, tail, follow, output).await
        }
        Commands::Info => {
            let engine = commands::load_engine_config(config_path)?;
            commands::info(&engine, output).await
        }
    }
}
