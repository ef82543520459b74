// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime session state: one in-flight execution of a workflow.

use crate::id::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a [`WorkflowSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Aborted,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Progress record for a single step within a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepProgress {
    pub step_id: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// User-submitted outputs map for this step (key -> path or list of paths).
    #[serde(default)]
    pub outputs: HashMap<String, OutputValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub quality_attempts: u32,
}

impl StepProgress {
    pub fn new(step_id: impl Into<String>, started_at: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            started_at: started_at.into(),
            completed_at: None,
            outputs: HashMap::new(),
            notes: None,
            quality_attempts: 0,
        }
    }
}

/// The value type of a single submitted output: a filepath, or a list of
/// filepaths (for `OutputKind::Files` outputs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    File(String),
    Files(Vec<String>),
}

impl OutputValue {
    /// All filepaths referenced by this value, as a flat list.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            OutputValue::File(p) => vec![p.as_str()],
            OutputValue::Files(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

/// One in-flight execution of a workflow, persisted on disk by the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub session_id: SessionId,
    pub job_name: String,
    pub workflow_name: String,
    /// Free-text description of what the agent is trying to accomplish.
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    pub current_step_id: String,
    pub current_entry_index: usize,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub step_progress: HashMap<String, StepProgress>,
}

impl WorkflowSession {
    /// `"{job_name}/{workflow_name}"`, used in [`StackEntry`] and tool responses.
    pub fn workflow_label(&self) -> String {
        format!("{}/{}", self.job_name, self.workflow_name)
    }

    /// Get or create the progress record for `step_id`.
    pub fn progress_mut(&mut self, step_id: &str) -> &mut StepProgress {
        self.step_progress
            .entry(step_id.to_string())
            .or_insert_with(|| StepProgress::new(step_id, String::new()))
    }

    /// Merge `outputs` from every completed step, in step-completion order
    /// (by `completed_at`, ties broken by step id for determinism). Later
    /// wins on key collision.
    pub fn all_outputs(&self) -> HashMap<String, OutputValue> {
        let mut completed: Vec<&StepProgress> = self
            .step_progress
            .values()
            .filter(|p| p.completed_at.is_some())
            .collect();
        completed.sort_by(|a, b| {
            a.completed_at
                .cmp(&b.completed_at)
                .then_with(|| a.step_id.cmp(&b.step_id))
        });
        let mut merged = HashMap::new();
        for p in completed {
            for (k, v) in &p.outputs {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

/// Derived, compact view of a session on the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEntry {
    pub workflow: String,
    pub step: String,
}

impl From<&WorkflowSession> for StackEntry {
    fn from(s: &WorkflowSession) -> Self {
        StackEntry {
            workflow: s.workflow_label(),
            step: s.current_step_id.clone(),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
