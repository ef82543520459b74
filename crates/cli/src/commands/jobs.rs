// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `deepwork jobs get-stack` - dump the active session stack as JSON.

use anyhow::Result;
use clap::{Args, Subcommand};
use deepwork_core::{SessionStatus, SystemClock, UuidIdGen};
use deepwork_jobs::load_all_jobs;
use deepwork_storage::StateStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Subcommand)]
pub enum JobsCommand {
    /// Emit the active session stack as JSON
    GetStack {
        /// Project root (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

pub async fn jobs(args: JobsArgs) -> Result<()> {
    match args.command {
        JobsCommand::GetStack { path } => get_stack(&path).await,
    }
}

async fn get_stack(project_root: &std::path::Path) -> Result<()> {
    let store = StateStore::new(
        project_root.to_path_buf(),
        Arc::new(SystemClock),
        Arc::new(UuidIdGen),
    );
    let (jobs, _errors) = load_all_jobs(project_root);
    let sessions = store.list_sessions().await?;

    let active_sessions: Vec<serde_json::Value> = sessions
        .into_iter()
        .filter(|s| s.status == SessionStatus::Active)
        .map(|s| {
            let completed_steps: Vec<&str> = s
                .step_progress
                .values()
                .filter(|p| p.completed_at.is_some())
                .map(|p| p.step_id.as_str())
                .collect();

            let mut value = serde_json::json!({
                "session_id": s.session_id,
                "job_name": s.job_name,
                "workflow_name": s.workflow_name,
                "goal": s.goal,
                "current_step_id": s.current_step_id,
                "instance_id": s.instance_id,
                "completed_steps": completed_steps,
            });

            if let Some(job) = jobs.iter().find(|j| j.definition.name == s.job_name) {
                value["common_job_info"] = serde_json::json!(job.definition.common_job_info);
                if let Some(workflow) = job.definition.workflow(&s.workflow_name) {
                    value["total_steps"] = serde_json::json!(workflow.steps.len());
                    value["step_number"] = serde_json::json!(s.current_entry_index + 1);
                }
                if let Some(step) = job.definition.step(&s.current_step_id) {
                    if let Ok(text) =
                        std::fs::read_to_string(job.job_dir.join(&step.instructions_file))
                    {
                        value["current_step_instructions"] = serde_json::json!(text);
                    }
                }
            }

            value
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({ "active_sessions": active_sessions }))?
    );
    Ok(())
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
