// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reviewer adapter backed by the `claude` CLI, invoked as a one-shot
//! subprocess per evaluation task.

use super::{response_schema, ReviewRequest, ReviewResult, ReviewerAdapter, ReviewerError};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Invokes `{command} --print --output-format json --system-prompt <prompt>
/// --json-schema <schema>`, feeding the payload on stdin and decoding the
/// reviewer's stdout as a [`ReviewResult`].
pub struct ClaudeReviewerAdapter {
    command: String,
}

impl ClaudeReviewerAdapter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for ClaudeReviewerAdapter {
    fn default() -> Self {
        Self::new("claude")
    }
}

#[async_trait]
impl ReviewerAdapter for ClaudeReviewerAdapter {
    async fn review(&self, request: ReviewRequest) -> Result<ReviewResult, ReviewerError> {
        let schema = serde_json::to_string(&response_schema())
            .map_err(|e| ReviewerError::Process(e.to_string()))?;

        let mut cmd = Command::new(&self.command);
        cmd.arg("--print")
            .arg("--output-format")
            .arg("json")
            .arg("--system-prompt")
            .arg(&request.system_prompt)
            .arg("--json-schema")
            .arg(&schema)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = run_with_timeout(
            cmd,
            Some(request.user_payload.as_bytes()),
            request.timeout,
            "reviewer",
        )
        .await
        .map_err(ReviewerError::Process)?;

        if !output.status.success() {
            return Err(ReviewerError::NonZeroExit {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ReviewerError::MalformedJson(e.to_string()))
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
