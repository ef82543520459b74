// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response DTOs for the four MCP tools. Kept separate from
//! `deepwork-core`'s runtime types so schema-derive concerns stay at the MCP
//! boundary rather than leaking into the shared data model.

use deepwork_core::OutputValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire shape of a submitted output value: a single filepath, or a list of
/// filepaths. Mirrors `deepwork_core::OutputValue` but derives `JsonSchema`
/// for `finished_step`'s parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OutputValueDto {
    File(String),
    Files(Vec<String>),
}

impl From<OutputValueDto> for OutputValue {
    fn from(dto: OutputValueDto) -> Self {
        match dto {
            OutputValueDto::File(p) => OutputValue::File(p),
            OutputValueDto::Files(ps) => OutputValue::Files(ps),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StartWorkflowRequest {
    /// Free-text description of what the agent is trying to accomplish.
    pub goal: String,
    pub job_name: String,
    pub workflow_name: String,
    #[serde(default)]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FinishedStepRequest {
    pub outputs: HashMap<String, OutputValueDto>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub quality_review_override_reason: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AbortWorkflowRequest {
    pub explanation: String,
    #[serde(default)]
    pub session_id: Option<String>,
}
