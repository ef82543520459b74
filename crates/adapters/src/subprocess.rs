// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers.

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Run a subprocess command with a timeout, optionally feeding it bytes on
/// stdin first.
///
/// With `stdin_data: None`, wraps `Command::output()` directly. With
/// `stdin_data: Some(bytes)`, spawns the child with a piped stdin, writes
/// `bytes`, then waits for exit. Either way, the whole run (write included)
/// is bounded by `timeout`; the child is killed automatically when the
/// timeout elapses, via the tokio `Child` drop implementation.
pub async fn run_with_timeout(
    mut cmd: Command,
    stdin_data: Option<&[u8]>,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    let run = async {
        match stdin_data {
            None => cmd.output().await,
            Some(data) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn()?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(data).await?;
                }
                child.wait_with_output().await
            }
        }
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{description} failed: {io_err}")),
        Err(_elapsed) => Err(format!(
            "{description} timed out after {}s",
            timeout.as_secs()
        )),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
