// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! deepwork - process entry points for the workflow orchestration server.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{hook, jobs, serve};

#[derive(Parser)]
#[command(name = "deepwork", version, about = "Workflow orchestration server for AI coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server
    Serve(serve::ServeArgs),
    /// Load a named hook module and invoke its main
    Hook(hook::HookArgs),
    /// Job registry and session-stack inspection
    Jobs(jobs::JobsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve::serve(args).await,
        Commands::Hook(args) => {
            let code = hook::hook(args)?;
            std::process::exit(code)
        }
        Commands::Jobs(args) => jobs::jobs(args).await,
    }
}

/// Logs to stderr so stdout stays reserved for the stdio MCP transport and
/// for `jobs get-stack`'s JSON output.
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
