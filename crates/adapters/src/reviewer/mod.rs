// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reviewer adapter: a minimal boundary over an external LLM
//! subprocess that scores a quality-gate payload against a rubric.

mod claude;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use claude::ClaudeReviewerAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeReviewerAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One invocation of the external reviewer: a system prompt, a rendered
/// payload, and how long to wait before giving up.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub system_prompt: String,
    pub user_payload: String,
    pub timeout: Duration,
}

/// A single criterion's verdict within a [`ReviewResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: String,
    pub passed: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

fn default_feedback() -> String {
    "No feedback provided".to_string()
}

/// The reviewer's structured verdict. Missing fields in a reviewer's raw
/// response default rather than fail the call: `passed` to `false`,
/// `feedback` to a placeholder, `criteria_results` to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    #[serde(default)]
    pub passed: bool,
    #[serde(default = "default_feedback")]
    pub feedback: String,
    #[serde(default)]
    pub criteria_results: Vec<CriterionResult>,
}

impl Default for ReviewResult {
    fn default() -> Self {
        Self {
            passed: false,
            feedback: default_feedback(),
            criteria_results: Vec::new(),
        }
    }
}

/// The JSON Schema (as a `serde_json::Value`) the reviewer's response must
/// conform to: `{passed: bool, feedback: string, criteria_results?: [...]}`.
pub fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["passed", "feedback"],
        "properties": {
            "passed": { "type": "boolean" },
            "feedback": { "type": "string" },
            "criteria_results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["criterion", "passed"],
                    "properties": {
                        "criterion": { "type": "string" },
                        "passed": { "type": "boolean" },
                        "feedback": { "type": ["string", "null"] }
                    }
                }
            }
        }
    })
}

#[derive(Debug, Error)]
pub enum ReviewerError {
    #[error("reviewer process error: {0}")]
    Process(String),
    #[error("reviewer exited with status {status}: {stderr}")]
    NonZeroExit { status: String, stderr: String },
    #[error("reviewer produced malformed JSON: {0}")]
    MalformedJson(String),
}

/// Invokes an external reviewer with a prompt and payload, returning its
/// structured verdict.
#[async_trait]
pub trait ReviewerAdapter: Send + Sync {
    async fn review(&self, request: ReviewRequest) -> Result<ReviewResult, ReviewerError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
