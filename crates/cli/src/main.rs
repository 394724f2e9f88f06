// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lf - LumenFlow CLI

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use commands::{gates, init, state, wu};
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "lf",
    version,
    about = "LumenFlow - safe concurrent work units over one repository"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Request cloud mode explicitly
    #[arg(long, global = true)]
    cloud: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the LumenFlow layout in the current directory
    Init,
    /// Work unit lifecycle
    #[command(subcommand)]
    Wu(wu::WuCommand),
    /// Run the regression gates (exit 2 on regression)
    Gates,
    /// Engine state inspection
    #[command(subcommand)]
    State(state::StateCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    if let Some(dir) = &cli.directory {
        if let Err(e) = std::env::set_current_dir(dir) {
            output::print_error(&anyhow::anyhow!("cannot enter {}: {e}", dir.display()), format);
            return ExitCode::from(1);
        }
    }

    match dispatch(cli, format).await {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&e, format);
            ExitCode::from(1)
        }
    }
}

async fn dispatch(cli: Cli, format: OutputFormat) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Init => init::run(format),
        Commands::Wu(command) => {
            let ctx = context::load(format, cli.cloud).await?;
            wu::run(command, ctx).await
        }
        Commands::Gates => {
            let ctx = context::load(format, cli.cloud).await?;
            gates::run(ctx)
        }
        Commands::State(command) => {
            let ctx = context::load(format, cli.cloud).await?;
            state::run(command, ctx).await
        }
    }
}
