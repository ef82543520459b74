// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definition types: the typed shape of a `job.yml` after schema
//! validation and decoding. Values here are immutable once loaded — the
//! job loader (`deepwork-jobs`) is the only producer.

use serde::{Deserialize, Serialize};

/// A named, versioned bundle of steps and workflows loaded from a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Lowercase identifier, unique among loaded jobs.
    pub name: String,
    /// Semantic version, e.g. `"1.0.0"`.
    pub version: String,
    /// Human summary, at most 200 characters.
    pub summary: String,
    /// Free-form context delivered to every step of every workflow in this job.
    #[serde(rename = "common_job_info_provided_to_all_steps_at_runtime")]
    pub common_job_info: String,
    /// Ordered steps, keyed by [`Step::id`].
    pub steps: Vec<Step>,
    /// Zero or more named workflows over this job's steps.
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

impl JobDefinition {
    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Look up a workflow by name.
    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.name == name)
    }
}

/// The smallest unit of work: the agent performs the step and submits outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Lowercase identifier, unique within the job.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Path to the Markdown instructions file, relative to the job directory.
    pub instructions_file: String,
    /// Declared outputs, keyed by output name.
    #[serde(default)]
    pub outputs: indexmap::IndexMap<String, OutputSpec>,
    /// Ordered rubric reviews run against this step's outputs.
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Inputs this step expects: user parameters and/or prior-step file outputs.
    #[serde(default)]
    pub inputs: Vec<StepInput>,
    /// Step ids that must complete before this step can run.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Lifecycle hooks for this step.
    #[serde(default)]
    pub hooks: Hooks,
    /// Optional hint naming the agent persona/profile that should run this step.
    #[serde(default)]
    pub agent: Option<String>,
}

/// A single declared output of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub kind: OutputKind,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl OutputSpec {
    /// The `syntax_for_finished_step_tool` hint returned to the agent in
    /// `begin_step.step_expected_outputs`.
    pub fn syntax_hint(&self) -> &'static str {
        match self.kind {
            OutputKind::File => "filepath",
            OutputKind::Files => "array of filepaths for all individual files",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    File,
    Files,
}

/// A step input: either a user-supplied parameter or a prior step's file output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepInput {
    /// A free-text parameter the agent supplies at `start_workflow` time via `goal`,
    /// or that is otherwise surfaced in instructions.
    User(UserInput),
    /// A reference to a prior step's declared file output.
    File(FileInput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInput {
    /// The output key on `from_step` that this input consumes.
    pub file: String,
    /// The id of the step that produced `file`. Invariant: this id must
    /// appear in the consuming step's `dependencies`.
    pub from_step: String,
}

/// A rubric evaluated against a step's outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// `"step"` (evaluate all submitted files together) or the name of a
    /// declared output on the same step (evaluate per-file or as a whole,
    /// depending on the output's kind).
    pub run_each: String,
    /// Criterion name -> criterion question. At least one entry required;
    /// an empty map causes the review to auto-pass without invoking a reviewer.
    #[serde(default)]
    pub quality_criteria: indexmap::IndexMap<String, String>,
    #[serde(default)]
    pub additional_review_guidance: Option<String>,
}

impl Review {
    pub fn runs_over_whole_step(&self) -> bool {
        self.run_each == "step"
    }
}

/// An ordered (possibly concurrent-grouped) sequence of step ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub summary: String,
    pub steps: Vec<WorkflowEntry>,
}

impl Workflow {
    /// Flatten to the ordered list of every step id referenced, regardless
    /// of grouping.
    pub fn all_step_ids(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|e| e.step_ids())
            .collect()
    }
}

/// One entry in a workflow's step list: either a single sequential step or a
/// group of step ids meant to run concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowEntry {
    Single(String),
    Concurrent(Vec<String>),
}

impl WorkflowEntry {
    pub fn step_ids(&self) -> Vec<&str> {
        match self {
            WorkflowEntry::Single(id) => vec![id.as_str()],
            WorkflowEntry::Concurrent(ids) => ids.iter().map(String::as_str).collect(),
        }
    }

    /// The primary step id of this entry: the only id for a `Single` entry,
    /// the first id of a `Concurrent` group.
    pub fn primary_step_id(&self) -> &str {
        match self {
            WorkflowEntry::Single(id) => id,
            WorkflowEntry::Concurrent(ids) => ids.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Additional step ids in a concurrent group that the agent should also
    /// run in parallel with the primary step.
    pub fn companion_step_ids(&self) -> Vec<&str> {
        match self {
            WorkflowEntry::Single(_) => Vec::new(),
            WorkflowEntry::Concurrent(ids) => ids.iter().skip(1).map(String::as_str).collect(),
        }
    }
}

/// Lifecycle hooks for a step: event name -> ordered list of actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hooks {
    #[serde(default)]
    pub after_agent: Vec<HookAction>,
    #[serde(default)]
    pub before_tool: Vec<HookAction>,
    #[serde(default)]
    pub before_prompt: Vec<HookAction>,
}

/// A single hook action: exactly one of `prompt`, `prompt_file`, or `script`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookAction {
    Prompt(String),
    PromptFile(String),
    Script(String),
}

/// Raw, untyped hook action as it appears in `job.yml` (one of three mutually
/// exclusive keys). Used by the job loader to validate "exactly one of"
/// before converting to [`HookAction`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawHookAction {
    pub prompt: Option<String>,
    pub prompt_file: Option<String>,
    pub script: Option<String>,
}

impl RawHookAction {
    /// Convert to a typed [`HookAction`], failing if zero or more than one
    /// of `prompt` / `prompt_file` / `script` is set.
    pub fn into_action(self) -> Result<HookAction, String> {
        let mut set = Vec::new();
        if let Some(p) = self.prompt {
            set.push(HookAction::Prompt(p));
        }
        if let Some(p) = self.prompt_file {
            set.push(HookAction::PromptFile(p));
        }
        if let Some(s) = self.script {
            set.push(HookAction::Script(s));
        }
        match set.len() {
            1 => Ok(set.into_iter().next().expect("checked len == 1")),
            0 => Err("hook action must set one of prompt, prompt_file, script".to_string()),
            _ => Err("hook action must set exactly one of prompt, prompt_file, script".to_string()),
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
