// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-tool MCP surface: `get_workflows`, `start_workflow`,
//! `finished_step`, `abort_workflow`. Every response carries a `stack` field
//! reflecting the session stack after the call.

use crate::dto::{AbortWorkflowRequest, FinishedStepRequest, StartWorkflowRequest};
use deepwork_adapters::ReviewerAdapter;
use deepwork_core::OutputValue;
use deepwork_engine::{validate_outputs, GateOutcome, QualityGate};
use deepwork_jobs::{load_all_jobs, JobLoadError, LoadedJob};
use deepwork_storage::StateStore;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string(&value).map_err(|e| internal_error(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// How the quality gate, if any, is wired in. Tracked separately from
/// [`GateOutcome`] because attempt-counting only applies in external mode.
enum GateSetup {
    Disabled,
    External {
        gate: QualityGate,
        max_attempts: u32,
    },
    SelfReview {
        gate: QualityGate,
    },
}

/// The `deepwork` MCP server: job registry, session stack, and quality gate
/// wired together behind the four tools.
#[derive(Clone)]
pub struct DeepworkServer {
    inner: Arc<Inner>,
    tool_router: ToolRouter<DeepworkServer>,
}

struct Inner {
    project_root: PathBuf,
    jobs: Vec<LoadedJob>,
    job_errors: Vec<JobLoadError>,
    store: StateStore,
    gate: GateSetup,
}

impl DeepworkServer {
    /// Load every job visible under `project_root` and build a server with
    /// no quality gate configured (`--no-quality-gate`).
    pub fn new(project_root: impl Into<PathBuf>, store: StateStore) -> Self {
        Self::build(project_root, store, GateSetup::Disabled)
    }

    /// Build a server backed by an external reviewer subprocess.
    pub fn with_external_reviewer(
        project_root: impl Into<PathBuf>,
        store: StateStore,
        adapter: Arc<dyn ReviewerAdapter>,
        max_attempts: u32,
    ) -> Self {
        Self::build(
            project_root,
            store,
            GateSetup::External {
                gate: QualityGate::external(adapter),
                max_attempts,
            },
        )
    }

    /// Build a server that emits self-review instruction files instead of
    /// invoking a reviewer subprocess.
    pub fn with_self_review(project_root: impl Into<PathBuf>, store: StateStore) -> Self {
        Self::build(
            project_root,
            store,
            GateSetup::SelfReview {
                gate: QualityGate::self_review(),
            },
        )
    }

    fn build(project_root: impl Into<PathBuf>, store: StateStore, gate: GateSetup) -> Self {
        let project_root = project_root.into();
        let (jobs, job_errors) = load_all_jobs(&project_root);
        Self {
            inner: Arc::new(Inner {
                project_root,
                jobs,
                job_errors,
                store,
                gate,
            }),
            tool_router: Self::tool_router(),
        }
    }

    fn find_job(&self, name: &str) -> Option<&LoadedJob> {
        self.inner.jobs.iter().find(|j| j.definition.name == name)
    }
}

#[tool_router]
impl DeepworkServer {
    #[tool(description = "List every loaded job and the workflows it defines.")]
    pub async fn get_workflows(&self) -> Result<CallToolResult, McpError> {
        let jobs: Vec<serde_json::Value> = self
            .inner
            .jobs
            .iter()
            .map(|j| {
                serde_json::json!({
                    "name": j.definition.name,
                    "summary": j.definition.summary,
                    "workflows": j.definition.workflows.iter().map(|w| serde_json::json!({
                        "name": w.name,
                        "summary": w.summary,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        let errors: Vec<serde_json::Value> = self
            .inner
            .job_errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "job_name": e.job_name,
                    "job_dir": e.job_dir.display().to_string(),
                    "error": e.error,
                })
            })
            .collect();
        json_result(serde_json::json!({ "jobs": jobs, "errors": errors }))
    }

    #[tool(description = "Start a workflow within a job, creating a new session.")]
    pub async fn start_workflow(
        &self,
        Parameters(req): Parameters<StartWorkflowRequest>,
    ) -> Result<CallToolResult, McpError> {
        let job = self
            .find_job(&req.job_name)
            .ok_or_else(|| invalid_params(format!("unknown job '{}'", req.job_name)))?;

        let workflow = if job.definition.workflows.len() == 1 {
            &job.definition.workflows[0]
        } else {
            job.definition
                .workflow(&req.workflow_name)
                .ok_or_else(|| {
                    invalid_params(format!(
                        "no workflow named '{}' in job '{}'",
                        req.workflow_name, req.job_name
                    ))
                })?
        };

        let first_entry = workflow
            .steps
            .first()
            .ok_or_else(|| invalid_params(format!("workflow '{}' has no steps", workflow.name)))?;
        let step_id = first_entry.primary_step_id();
        let step = job
            .definition
            .step(step_id)
            .ok_or_else(|| internal_error(format!("step '{step_id}' not found in job")))?;

        let session = self
            .inner
            .store
            .create_session(
                job.definition.name.clone(),
                workflow.name.clone(),
                req.goal.clone(),
                req.instance_id.clone(),
                step_id,
            )
            .await
            .map_err(|e| internal_error(e.to_string()))?;
        self.inner
            .store
            .start_step(step_id, Some(session.session_id.as_str()))
            .await
            .map_err(|e| internal_error(e.to_string()))?;

        let instructions = read_instructions(&job.job_dir, &step.instructions_file)?;
        let stack = self.inner.store.get_stack().await;

        let mut begin_step = begin_step_payload(
            session.session_id.as_str(),
            &job.job_dir,
            step,
            &instructions,
            &job.definition.common_job_info,
        );
        let companions = first_entry.companion_step_ids();
        if !companions.is_empty() {
            begin_step["concurrent_with"] = serde_json::json!(companions);
        }

        json_result(serde_json::json!({
            "begin_step": begin_step,
            "stack": stack,
        }))
    }

    #[tool(description = "Submit a completed step's outputs for validation and review.")]
    pub async fn finished_step(
        &self,
        Parameters(req): Parameters<FinishedStepRequest>,
    ) -> Result<CallToolResult, McpError> {
        let session_id = req.session_id.clone();
        let session = self
            .inner
            .store
            .get_session(session_id.as_deref())
            .await
            .map_err(|e| invalid_params(e.to_string()))?;
        let job = self.find_job(&session.job_name).ok_or_else(|| {
            internal_error(format!("active session references unknown job '{}'", session.job_name))
        })?;
        let step = job.definition.step(&session.current_step_id).ok_or_else(|| {
            internal_error(format!(
                "active session references unknown step '{}'",
                session.current_step_id
            ))
        })?;

        let outputs: HashMap<String, OutputValue> = req
            .outputs
            .into_iter()
            .map(|(k, v)| (k, OutputValue::from(v)))
            .collect();
        validate_outputs(step, &outputs, &self.inner.project_root)
            .map_err(|e| invalid_params(e.to_string()))?;

        if !step.reviews.is_empty() && req.quality_review_override_reason.is_none() {
            if let Some(outcome) = self
                .run_quality_gate(step, &outputs, &session, req.notes.as_deref(), session_id.as_deref())
                .await?
            {
                return outcome;
            }
        }

        let updated = self
            .inner
            .store
            .complete_step(
                &session.current_step_id,
                outputs,
                req.notes.clone(),
                session_id.as_deref(),
            )
            .await
            .map_err(|e| internal_error(e.to_string()))?;

        let workflow = job
            .definition
            .workflow(&updated.workflow_name)
            .ok_or_else(|| internal_error("active session references unknown workflow"))?;
        let next_index = updated.current_entry_index + 1;

        if let Some(next_entry) = workflow.steps.get(next_index) {
            let next_step_id = next_entry.primary_step_id();
            let next_step = job.definition.step(next_step_id).ok_or_else(|| {
                internal_error(format!("step '{next_step_id}' not found in job"))
            })?;
            self.inner
                .store
                .advance_to_step(next_step_id, next_index, session_id.as_deref())
                .await
                .map_err(|e| internal_error(e.to_string()))?;
            self.inner
                .store
                .start_step(next_step_id, session_id.as_deref())
                .await
                .map_err(|e| internal_error(e.to_string()))?;

            let instructions = read_instructions(&job.job_dir, &next_step.instructions_file)?;
            let stack = self.inner.store.get_stack().await;
            let mut begin_step = begin_step_payload(
                updated.session_id.as_str(),
                &job.job_dir,
                next_step,
                &instructions,
                &job.definition.common_job_info,
            );
            let companions = next_entry.companion_step_ids();
            if !companions.is_empty() {
                begin_step["concurrent_with"] = serde_json::json!(companions);
            }
            json_result(serde_json::json!({
                "status": "next_step",
                "begin_step": begin_step,
                "stack": stack,
            }))
        } else {
            let transition = self
                .inner
                .store
                .complete_workflow(session_id.as_deref())
                .await
                .map_err(|e| internal_error(e.to_string()))?;
            let stack = self.inner.store.get_stack().await;
            json_result(serde_json::json!({
                "status": "workflow_complete",
                "all_outputs": transition.removed.all_outputs(),
                "stack": stack,
            }))
        }
    }

    #[tool(description = "Abort the active (or a named) workflow session.")]
    pub async fn abort_workflow(
        &self,
        Parameters(req): Parameters<AbortWorkflowRequest>,
    ) -> Result<CallToolResult, McpError> {
        let transition = self
            .inner
            .store
            .abort_workflow(req.explanation.clone(), req.session_id.as_deref())
            .await
            .map_err(|e| invalid_params(e.to_string()))?;
        let stack = self.inner.store.get_stack().await;

        json_result(serde_json::json!({
            "aborted_workflow": transition.removed.workflow_label(),
            "aborted_step": transition.removed.current_step_id,
            "explanation": req.explanation,
            "stack": stack,
            "resumed_workflow": transition.new_top.as_ref().map(|s| s.workflow_label()),
            "resumed_step": transition.new_top.as_ref().map(|s| s.current_step_id.clone()),
        }))
    }
}

impl DeepworkServer {
    /// Runs the quality gate (if configured) against a just-submitted step.
    /// Returns `Ok(Some(result))` when the caller should return early with
    /// `result` (the step needs more work, or a fatal error was raised);
    /// `Ok(None)` means the step passed and `finished_step` should proceed to
    /// mark it complete.
    async fn run_quality_gate(
        &self,
        step: &deepwork_core::Step,
        outputs: &HashMap<String, OutputValue>,
        session: &deepwork_core::WorkflowSession,
        notes: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Option<Result<CallToolResult, McpError>>, McpError> {
        let (gate, is_external, max_attempts) = match &self.inner.gate {
            GateSetup::Disabled => return Ok(None),
            GateSetup::External { gate, max_attempts } => (gate, true, *max_attempts),
            GateSetup::SelfReview { gate } => (gate, false, 0),
        };

        let attempt_number = if is_external {
            let updated = self
                .inner
                .store
                .record_quality_attempt(&session.current_step_id, session_id)
                .await
                .map_err(|e| internal_error(e.to_string()))?;
            updated
                .step_progress
                .get(&session.current_step_id)
                .map(|p| p.quality_attempts)
                .unwrap_or(1)
        } else {
            0
        };

        let outcome = gate
            .evaluate_reviews(
                step,
                outputs,
                &self.inner.project_root,
                notes,
                session.session_id.as_str(),
            )
            .await
            .map_err(|e| internal_error(e.to_string()))?;

        match outcome {
            GateOutcome::Passed => Ok(None),
            GateOutcome::Failed(failures) => {
                let feedback = failures
                    .iter()
                    .map(|f| format!("[{}] {}", f.label, f.feedback))
                    .collect::<Vec<_>>()
                    .join("\n");
                let stack = self.inner.store.get_stack().await;
                if is_external && attempt_number >= max_attempts {
                    Ok(Some(Err(McpError::internal_error(
                        format!("quality gate failed after {attempt_number} attempts: {feedback}"),
                        None,
                    ))))
                } else {
                    Ok(Some(json_result(serde_json::json!({
                        "status": "needs_work",
                        "feedback": feedback,
                        "stack": stack,
                    }))))
                }
            }
            GateOutcome::SelfReviewRequired(path) => {
                let stack = self.inner.store.get_stack().await;
                let instructions = format!(
                    "Spawn a sub-agent to evaluate the rubric in {}. Once every criterion \
                     passes, re-invoke finished_step with quality_review_override_reason set.",
                    path.display()
                );
                Ok(Some(json_result(serde_json::json!({
                    "status": "needs_work",
                    "instructions": instructions,
                    "stack": stack,
                }))))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for DeepworkServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "deepwork".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Workflow orchestration for multi-step job definitions. Call get_workflows to \
                 discover what's available, start_workflow to begin, finished_step after each \
                 step, and abort_workflow to bail out."
                    .to_string(),
            ),
        }
    }
}

fn read_instructions(job_dir: &std::path::Path, instructions_file: &str) -> Result<String, McpError> {
    std::fs::read_to_string(job_dir.join(instructions_file))
        .map_err(|e| internal_error(format!("failed to read instructions file: {e}")))
}

fn begin_step_payload(
    session_id: &str,
    job_dir: &std::path::Path,
    step: &deepwork_core::Step,
    instructions: &str,
    common_job_info: &str,
) -> serde_json::Value {
    let expected_outputs: Vec<serde_json::Value> = step
        .outputs
        .iter()
        .map(|(name, spec)| {
            serde_json::json!({
                "name": name,
                "type": spec.kind,
                "description": spec.description,
                "required": spec.required,
                "syntax_for_finished_step_tool": spec.syntax_hint(),
            })
        })
        .collect();

    serde_json::json!({
        "session_id": session_id,
        "step_id": step.id,
        "job_dir": job_dir.display().to_string(),
        "step_expected_outputs": expected_outputs,
        "step_reviews": step.reviews,
        "step_instructions": instructions,
        "common_job_info": common_job_info,
    })
}
