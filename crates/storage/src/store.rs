// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent, mutex-guarded session state.
//!
//! One JSON file per session under `{project_root}/.deepwork/tmp/`, written
//! atomically (temp file, `sync_all`, rename) so a crash mid-write never
//! leaves a half-written `session_*.json` behind for another process to load.

use crate::error::StateError;
use crate::stack::SessionStack;
use deepwork_core::{
    Clock, IdGen, OutputValue, SessionId, SessionStatus, StackEntry, WorkflowSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// The result of completing or aborting a workflow: the session that was
/// removed, and whatever now sits on top of the stack (if anything).
#[derive(Debug, Clone)]
pub struct StackTransition {
    pub removed: WorkflowSession,
    pub new_top: Option<WorkflowSession>,
}

/// Guards a [`SessionStack`] with an async mutex and persists every mutation
/// to `{project_root}/.deepwork/tmp/session_{id}.json`.
pub struct StateStore {
    project_root: PathBuf,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGen>,
    stack: Mutex<SessionStack>,
}

impl StateStore {
    pub fn new(project_root: impl Into<PathBuf>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGen>) -> Self {
        Self {
            project_root: project_root.into(),
            clock,
            ids,
            stack: Mutex::new(SessionStack::new()),
        }
    }

    fn sessions_dir(&self) -> PathBuf {
        self.project_root.join(".deepwork").join("tmp")
    }

    fn session_path(&self, id: &str) -> PathBuf {
        self.sessions_dir().join(format!("session_{id}.json"))
    }

    /// Write `session` to its file atomically: write to a sibling `.tmp`
    /// file, `sync_all`, then rename over the final path.
    async fn persist(&self, session: &WorkflowSession) -> Result<(), StateError> {
        let dir = self.sessions_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let final_path = self.session_path(session.session_id.as_str());
        let tmp_path = final_path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(session)?;
        {
            let file = tokio::fs::File::create(&tmp_path).await?;
            use tokio::io::AsyncWriteExt;
            let mut file = file;
            file.write_all(&body).await?;
            file.sync_all().await?;
        }
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }

    async fn lock(&self) -> MutexGuard<'_, SessionStack> {
        self.stack.lock().await
    }

    pub async fn get_stack(&self) -> Vec<StackEntry> {
        self.lock().await.entries()
    }

    pub async fn get_stack_depth(&self) -> usize {
        self.lock().await.depth()
    }

    pub async fn create_session(
        &self,
        job: impl Into<String>,
        workflow: impl Into<String>,
        goal: impl Into<String>,
        instance_id: Option<String>,
        first_step_id: impl Into<String>,
    ) -> Result<WorkflowSession, StateError> {
        let id = self.ids.next_session_id();
        let now = self.clock.now_iso();
        let session = WorkflowSession {
            session_id: id,
            job_name: job.into(),
            workflow_name: workflow.into(),
            goal: goal.into(),
            instance_id,
            current_step_id: first_step_id.into(),
            current_entry_index: 0,
            status: SessionStatus::Active,
            abort_reason: None,
            started_at: now,
            completed_at: None,
            step_progress: std::collections::HashMap::new(),
        };
        self.persist(&session).await?;
        let mut stack = self.lock().await;
        stack.push(session.clone());
        Ok(session)
    }

    /// Read `session_{id}.json` from disk, replace the top of the in-memory
    /// stack with it (or push it if the stack is empty), and return it.
    pub async fn load_session(&self, id: &str) -> Result<WorkflowSession, StateError> {
        let path = self.session_path(id);
        if !path.is_file() {
            return Err(StateError::SessionFileNotFound(id.to_string()));
        }
        let bytes = tokio::fs::read(&path).await?;
        let session: WorkflowSession = serde_json::from_slice(&bytes).map_err(|source| {
            StateError::CorruptSessionFile {
                path: path.display().to_string(),
                source,
            }
        })?;
        let mut stack = self.lock().await;
        stack.replace_top_or_push(session.clone());
        Ok(session)
    }

    pub async fn start_step(
        &self,
        step_id: &str,
        session_id: Option<&str>,
    ) -> Result<WorkflowSession, StateError> {
        let now = self.clock.now_iso();
        let mut stack = self.lock().await;
        let session = stack.resolve_mut(session_id)?;
        session.current_step_id = step_id.to_string();
        let progress = session.progress_mut(step_id);
        if progress.started_at.is_empty() {
            progress.started_at = now;
        }
        let snapshot = session.clone();
        drop(stack);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    pub async fn complete_step(
        &self,
        step_id: &str,
        outputs: std::collections::HashMap<String, OutputValue>,
        notes: Option<String>,
        session_id: Option<&str>,
    ) -> Result<WorkflowSession, StateError> {
        let now = self.clock.now_iso();
        let mut stack = self.lock().await;
        let session = stack.resolve_mut(session_id)?;
        let progress = session.progress_mut(step_id);
        progress.outputs = outputs;
        progress.notes = notes;
        progress.completed_at = Some(now);
        let snapshot = session.clone();
        drop(stack);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    pub async fn record_quality_attempt(
        &self,
        step_id: &str,
        session_id: Option<&str>,
    ) -> Result<WorkflowSession, StateError> {
        let mut stack = self.lock().await;
        let session = stack.resolve_mut(session_id)?;
        let progress = session.progress_mut(step_id);
        progress.quality_attempts += 1;
        let snapshot = session.clone();
        drop(stack);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    pub async fn advance_to_step(
        &self,
        step_id: &str,
        entry_index: usize,
        session_id: Option<&str>,
    ) -> Result<WorkflowSession, StateError> {
        let mut stack = self.lock().await;
        let session = stack.resolve_mut(session_id)?;
        session.current_step_id = step_id.to_string();
        session.current_entry_index = entry_index;
        let snapshot = session.clone();
        drop(stack);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    /// Remove the target session from wherever it sits in the stack, mark it
    /// completed, persist it, and return it alongside whatever now sits on
    /// top.
    pub async fn complete_workflow(
        &self,
        session_id: Option<&str>,
    ) -> Result<StackTransition, StateError> {
        let now = self.clock.now_iso();
        let mut stack = self.lock().await;
        let target_id = stack.resolve(session_id)?.session_id.as_str().to_string();
        let mut removed = stack
            .remove_by_id(&target_id)
            .expect("id was just resolved from this stack");
        removed.status = SessionStatus::Completed;
        removed.completed_at = Some(now);
        let new_top = stack.top().cloned();
        drop(stack);
        self.persist(&removed).await?;
        Ok(StackTransition { removed, new_top })
    }

    pub async fn abort_workflow(
        &self,
        reason: impl Into<String>,
        session_id: Option<&str>,
    ) -> Result<StackTransition, StateError> {
        let now = self.clock.now_iso();
        let mut stack = self.lock().await;
        let target_id = stack.resolve(session_id)?.session_id.as_str().to_string();
        let mut removed = stack
            .remove_by_id(&target_id)
            .expect("id was just resolved from this stack");
        removed.status = SessionStatus::Aborted;
        removed.abort_reason = Some(reason.into());
        removed.completed_at = Some(now);
        let new_top = stack.top().cloned();
        drop(stack);
        self.persist(&removed).await?;
        Ok(StackTransition { removed, new_top })
    }

    pub async fn get_all_outputs(
        &self,
        session_id: Option<&str>,
    ) -> Result<std::collections::HashMap<String, OutputValue>, StateError> {
        let stack = self.lock().await;
        Ok(stack.resolve(session_id)?.all_outputs())
    }

    /// Resolve `session_id` (or the top of the stack) and return a clone of
    /// the session, without mutating anything.
    pub async fn get_session(
        &self,
        session_id: Option<&str>,
    ) -> Result<WorkflowSession, StateError> {
        let stack = self.lock().await;
        Ok(stack.resolve(session_id)?.clone())
    }

    /// Scan every `session_*.json` under the sessions directory, skipping
    /// (and logging) corrupt files, returning sessions descending by
    /// `started_at`.
    pub async fn list_sessions(&self) -> Result<Vec<WorkflowSession>, StateError> {
        let dir = self.sessions_dir();
        let mut sessions = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(sessions),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_session_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("session_") && n.ends_with(".json"));
            if !is_session_file {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<WorkflowSession>(&bytes) {
                    Ok(session) => sessions.push(session),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping corrupt session file");
                    }
                },
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable session file");
                }
            }
        }
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    pub async fn find_active_sessions_for_workflow(
        &self,
        job_name: &str,
        workflow_name: &str,
    ) -> Result<Vec<WorkflowSession>, StateError> {
        Ok(self
            .list_sessions()
            .await?
            .into_iter()
            .filter(|s| {
                s.job_name == job_name
                    && s.workflow_name == workflow_name
                    && s.status == SessionStatus::Active
            })
            .collect())
    }

    /// Remove the session file if present, and remove it from the in-memory
    /// stack if present. Neither half failing affects the other.
    pub async fn delete_session(&self, id: &str) -> Result<(), StateError> {
        let path = self.session_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        let mut stack = self.lock().await;
        stack.remove_by_id(id);
        Ok(())
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
