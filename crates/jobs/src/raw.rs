// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The as-written shape of `job.yml`, decoded straight off YAML before any
//! schema or semantic validation. Exists only to carry the legacy
//! `stop_hooks` field and raw hook actions through conversion into the
//! clean [`deepwork_core`] types.

use deepwork_core::{
    FileInput, HookAction, Hooks, JobDefinition, OutputKind, OutputSpec, RawHookAction, Review,
    Step, StepInput, UserInput, Workflow, WorkflowEntry,
};
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawJobDefinition {
    pub name: String,
    pub version: String,
    pub summary: String,
    #[serde(rename = "common_job_info_provided_to_all_steps_at_runtime")]
    pub common_job_info: String,
    pub steps: Vec<RawStep>,
    #[serde(default)]
    pub workflows: Vec<RawWorkflow>,
}

#[derive(Debug, Deserialize)]
pub struct RawStep {
    pub id: String,
    pub name: String,
    pub description: String,
    pub instructions_file: String,
    #[serde(default)]
    pub outputs: IndexMap<String, RawOutputSpec>,
    #[serde(default)]
    pub reviews: Vec<RawReview>,
    #[serde(default)]
    pub inputs: Vec<RawStepInput>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub hooks: RawHooks,
    /// Legacy field: entries here are migrated onto `hooks.after_agent`.
    #[serde(default)]
    pub stop_hooks: Vec<RawHookAction>,
    #[serde(default)]
    pub agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOutputSpec {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawReview {
    pub run_each: String,
    #[serde(default)]
    pub quality_criteria: IndexMap<String, String>,
    #[serde(default)]
    pub additional_review_guidance: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawStepInput {
    User(UserInput),
    File(FileInput),
}

#[derive(Debug, Deserialize, Default)]
pub struct RawHooks {
    #[serde(default)]
    pub after_agent: Vec<RawHookAction>,
    #[serde(default)]
    pub before_tool: Vec<RawHookAction>,
    #[serde(default)]
    pub before_prompt: Vec<RawHookAction>,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkflow {
    pub name: String,
    pub summary: String,
    pub steps: Vec<RawWorkflowEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawWorkflowEntry {
    Single(String),
    Concurrent(Vec<String>),
}

/// Error converting a raw hook action list: which lifecycle event and index
/// failed, and why.
#[derive(Debug, Clone)]
pub struct HookActionError {
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for HookActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

fn convert_hook_actions(
    raw: Vec<RawHookAction>,
    location_prefix: &str,
) -> Result<Vec<HookAction>, HookActionError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, action)| {
            action
                .into_action()
                .map_err(|message| HookActionError {
                    location: format!("{location_prefix}[{i}]"),
                    message,
                })
        })
        .collect()
}

impl RawJobDefinition {
    /// Convert to the clean, schema-validated [`JobDefinition`] shape,
    /// migrating `stop_hooks` onto `hooks.after_agent` along the way.
    pub fn into_job_definition(self) -> Result<JobDefinition, HookActionError> {
        let mut steps = Vec::with_capacity(self.steps.len());
        for raw_step in self.steps {
            steps.push(raw_step.into_step()?);
        }
        Ok(JobDefinition {
            name: self.name,
            version: self.version,
            summary: self.summary,
            common_job_info: self.common_job_info,
            steps,
            workflows: self.workflows.into_iter().map(RawWorkflow::into_workflow).collect(),
        })
    }
}

impl RawStep {
    fn into_step(self) -> Result<Step, HookActionError> {
        let location = format!("steps[{}].hooks", self.id);
        let mut after_agent = convert_hook_actions(self.hooks.after_agent, &format!("{location}.after_agent"))?;
        after_agent.extend(convert_hook_actions(
            self.stop_hooks,
            &format!("steps[{}].stop_hooks", self.id),
        )?);
        let before_tool = convert_hook_actions(self.hooks.before_tool, &format!("{location}.before_tool"))?;
        let before_prompt =
            convert_hook_actions(self.hooks.before_prompt, &format!("{location}.before_prompt"))?;

        Ok(Step {
            id: self.id,
            name: self.name,
            description: self.description,
            instructions_file: self.instructions_file,
            outputs: self
                .outputs
                .into_iter()
                .map(|(k, v)| {
                    (
                        k,
                        OutputSpec {
                            kind: v.kind,
                            description: v.description,
                            required: v.required,
                        },
                    )
                })
                .collect(),
            reviews: self
                .reviews
                .into_iter()
                .map(|r| Review {
                    run_each: r.run_each,
                    quality_criteria: r.quality_criteria,
                    additional_review_guidance: r.additional_review_guidance,
                })
                .collect(),
            inputs: self
                .inputs
                .into_iter()
                .map(|i| match i {
                    RawStepInput::User(u) => StepInput::User(u),
                    RawStepInput::File(f) => StepInput::File(f),
                })
                .collect(),
            dependencies: self.dependencies,
            hooks: Hooks {
                after_agent,
                before_tool,
                before_prompt,
            },
            agent: self.agent,
        })
    }
}

impl RawWorkflow {
    fn into_workflow(self) -> Workflow {
        Workflow {
            name: self.name,
            summary: self.summary,
            steps: self
                .steps
                .into_iter()
                .map(|e| match e {
                    RawWorkflowEntry::Single(id) => WorkflowEntry::Single(id),
                    RawWorkflowEntry::Concurrent(ids) => WorkflowEntry::Concurrent(ids),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "raw_tests.rs"]
mod tests;
