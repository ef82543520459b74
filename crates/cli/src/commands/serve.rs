// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `deepwork serve` - start the MCP server over stdio or streamable HTTP.

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use deepwork_adapters::ClaudeReviewerAdapter;
use deepwork_core::{SystemClock, UuidIdGen};
use deepwork_mcp::DeepworkServer;
use deepwork_storage::StateStore;
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Sse,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ExternalRunner {
    Claude,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Project root
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    /// Disable the quality-review gate entirely
    #[arg(long)]
    pub no_quality_gate: bool,
    /// Transport to serve over
    #[arg(long, value_enum, default_value = "stdio")]
    pub transport: Transport,
    /// Port to listen on (streamable HTTP only)
    #[arg(long, default_value_t = 8000)]
    pub port: u16,
    /// External reviewer subprocess; absent means self-review mode
    #[arg(long, value_enum)]
    pub external_runner: Option<ExternalRunner>,
}

/// Canonicalize and validate `path`, then ensure `.deepwork/tmp/` exists
/// underneath it.
fn resolve_project_root(path: &std::path::Path) -> Result<PathBuf> {
    let project_root = std::fs::canonicalize(path)
        .with_context(|| format!("project root '{}' does not exist", path.display()))?;
    if !project_root.is_dir() {
        bail!("project root '{}' is not a directory", project_root.display());
    }
    std::fs::create_dir_all(project_root.join(".deepwork").join("tmp"))
        .context("failed to create .deepwork/tmp")?;
    Ok(project_root)
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let project_root = resolve_project_root(&args.path)?;

    let store = StateStore::new(project_root.clone(), Arc::new(SystemClock), Arc::new(UuidIdGen));

    let server = if args.no_quality_gate {
        DeepworkServer::new(project_root.clone(), store)
    } else {
        match args.external_runner {
            Some(ExternalRunner::Claude) => {
                let adapter = Arc::new(ClaudeReviewerAdapter::default());
                DeepworkServer::with_external_reviewer(project_root.clone(), store, adapter, 3)
            }
            None => DeepworkServer::with_self_review(project_root.clone(), store),
        }
    };

    match args.transport {
        Transport::Stdio => {
            info!(path = %project_root.display(), "serving deepwork over stdio");
            let running = server
                .serve(rmcp::transport::io::stdio())
                .await
                .context("failed to start MCP server over stdio")?;
            running.waiting().await.context("MCP server loop failed")?;
        }
        Transport::Sse => {
            info!(port = args.port, path = %project_root.display(), "serving deepwork over streamable HTTP");
            let bind = format!("127.0.0.1:{}", args.port);
            let http_server =
                rmcp::transport::streamable_http_server::StreamableHttpServer::serve(
                    bind.parse().with_context(|| format!("invalid bind address {bind}"))?,
                )
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            let cancellation = http_server.with_service(move || server.clone());
            cancellation
                .await
                .context("MCP server loop failed")?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;
