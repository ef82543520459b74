// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembles review payloads, dispatches per-review concurrent evaluations
//! against an external reviewer, and falls back to self-review instruction
//! files when no reviewer is configured.

use deepwork_adapters::{ReviewRequest, ReviewResult, ReviewerAdapter, ReviewerError};
use deepwork_core::{OutputValue, Review, Step};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const BASE_TIMEOUT_SECS: u64 = 240;
const PER_EXTRA_FILE_SECS: u64 = 30;
const INLINE_THRESHOLD: usize = 5;

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Reviewer(#[from] ReviewerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one failing evaluation task, ready to be combined into the
/// tool-layer's `feedback` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailingEvaluation {
    pub run_each: String,
    pub label: String,
    pub feedback: String,
}

/// Outcome of a quality gate pass over one step's submitted outputs.
#[derive(Debug)]
pub enum GateOutcome {
    Passed,
    Failed(Vec<FailingEvaluation>),
    SelfReviewRequired(PathBuf),
}

/// How the gate sources its verdicts.
enum Mode {
    External(Arc<dyn ReviewerAdapter>),
    SelfReview,
}

pub struct QualityGate {
    mode: Mode,
    max_inline_files: usize,
}

impl QualityGate {
    pub fn external(adapter: Arc<dyn ReviewerAdapter>) -> Self {
        Self {
            mode: Mode::External(adapter),
            max_inline_files: INLINE_THRESHOLD,
        }
    }

    pub fn self_review() -> Self {
        Self {
            mode: Mode::SelfReview,
            max_inline_files: 0,
        }
    }

    pub fn with_max_inline_files(mut self, max_inline_files: usize) -> Self {
        self.max_inline_files = max_inline_files;
        self
    }

    pub async fn evaluate_reviews(
        &self,
        step: &Step,
        outputs: &HashMap<String, OutputValue>,
        project_root: &Path,
        notes: Option<&str>,
        session_id: &str,
    ) -> Result<GateOutcome, GateError> {
        let tasks = derive_tasks(step, outputs);
        if tasks.iter().all(|t| t.criteria.is_empty()) {
            return Ok(GateOutcome::Passed);
        }

        match &self.mode {
            Mode::External(adapter) => {
                self.run_external(adapter.as_ref(), &tasks, project_root, notes)
                    .await
            }
            Mode::SelfReview => {
                let active: Vec<&EvaluationTask> =
                    tasks.iter().filter(|t| !t.criteria.is_empty()).collect();
                if active.is_empty() {
                    return Ok(GateOutcome::Passed);
                }
                let path = write_self_review_file(
                    project_root,
                    session_id,
                    &step.id,
                    &active,
                    notes,
                    self.max_inline_files,
                )?;
                Ok(GateOutcome::SelfReviewRequired(path))
            }
        }
    }

    async fn run_external(
        &self,
        adapter: &dyn ReviewerAdapter,
        tasks: &[EvaluationTask],
        project_root: &Path,
        notes: Option<&str>,
    ) -> Result<GateOutcome, GateError> {
        let futures = tasks
            .iter()
            .filter(|t| !t.criteria.is_empty())
            .map(|task| async move {
                let payload = build_payload(&task.files, project_root, notes, self.max_inline_files);
                let system_prompt = build_system_prompt(task);
                let timeout = Duration::from_secs(timeout_for(task.files.len()));
                let request = ReviewRequest {
                    system_prompt,
                    user_payload: payload,
                    timeout,
                };
                let result = adapter.review(request).await?;
                Ok::<(EvaluationTask, ReviewResult), ReviewerError>((task.clone(), result))
            });

        let results = futures::future::join_all(futures).await;

        let mut failing = Vec::new();
        for outcome in results {
            let (task, result) = outcome?;
            if !result.passed {
                failing.push(FailingEvaluation {
                    run_each: task.run_each.clone(),
                    label: task.label.clone(),
                    feedback: result.feedback,
                });
            }
        }

        if failing.is_empty() {
            Ok(GateOutcome::Passed)
        } else {
            Ok(GateOutcome::Failed(failing))
        }
    }
}

fn timeout_for(file_count: usize) -> u64 {
    let extra = file_count.saturating_sub(INLINE_THRESHOLD) as u64;
    BASE_TIMEOUT_SECS + PER_EXTRA_FILE_SECS * extra
}

#[derive(Debug, Clone)]
struct EvaluationTask {
    run_each: String,
    label: String,
    criteria: indexmap::IndexMap<String, String>,
    guidance: Option<String>,
    files: Vec<(String, String)>,
}

fn derive_tasks(step: &Step, outputs: &HashMap<String, OutputValue>) -> Vec<EvaluationTask> {
    let mut all_files: Vec<(String, String)> = outputs
        .iter()
        .flat_map(|(key, value)| value.paths().into_iter().map(|p| (key.clone(), p.to_string())))
        .collect();
    all_files.sort();

    let mut tasks = Vec::new();
    for review in &step.reviews {
        if review.runs_over_whole_step() {
            tasks.push(task_for(review, "step".to_string(), all_files.clone()));
            continue;
        }

        let Some(value) = outputs.get(&review.run_each) else {
            continue;
        };
        match value {
            OutputValue::File(path) => {
                tasks.push(task_for(
                    review,
                    review.run_each.clone(),
                    vec![(review.run_each.clone(), path.clone())],
                ));
            }
            OutputValue::Files(paths) => {
                for path in paths {
                    tasks.push(task_for(
                        review,
                        review.run_each.clone(),
                        vec![(review.run_each.clone(), path.clone())],
                    ));
                }
            }
        }
    }
    tasks
}

fn task_for(review: &Review, run_each: String, files: Vec<(String, String)>) -> EvaluationTask {
    let label = match files.len() {
        1 => files[0].1.clone(),
        _ => run_each.clone(),
    };
    EvaluationTask {
        run_each,
        label,
        criteria: review.quality_criteria.clone(),
        guidance: review.additional_review_guidance.clone(),
        files,
    }
}

fn build_system_prompt(task: &EvaluationTask) -> String {
    let mut prompt = String::from("Evaluate the submitted work against the following criteria.\n\n");
    for (name, question) in &task.criteria {
        prompt.push_str(&format!("- {name}: {question}\n"));
    }
    if let Some(guidance) = &task.guidance {
        prompt.push_str("\nAdditional guidance:\n");
        prompt.push_str(guidance);
        prompt.push('\n');
    }
    prompt
}

fn build_payload(
    files: &[(String, String)],
    project_root: &Path,
    notes: Option<&str>,
    max_inline_files: usize,
) -> String {
    let mut sections = Vec::new();

    if !files.is_empty() {
        if files.len() <= max_inline_files {
            let mut body = String::from("==================== BEGIN OUTPUTS ====================\n");
            for (_, path) in files {
                body.push_str(&format!(
                    "-------------------- {path} --------------------\n"
                ));
                body.push_str(&read_for_inline(project_root, path));
                body.push('\n');
            }
            body.push_str("==================== END OUTPUTS ====================");
            sections.push(body);
        } else {
            let mut body = format!(
                "{} files submitted; read each as needed:\n",
                files.len()
            );
            for (key, path) in files {
                body.push_str(&format!("{path} (output: {key})\n"));
            }
            sections.push(body.trim_end().to_string());
        }
    }

    if let Some(notes) = notes {
        if !notes.is_empty() {
            sections.push(format!("AUTHOR NOTES\n{notes}"));
        }
    }

    if sections.is_empty() {
        "[No files provided]".to_string()
    } else {
        sections.join("\n\n")
    }
}

fn read_for_inline(project_root: &Path, relative_path: &str) -> String {
    let full = project_root.join(relative_path);
    match std::fs::read(&full) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => format!(
                "[Binary file - not included in review. Read from: {}]",
                full.display()
            ),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "[File not found]".to_string(),
        Err(e) => format!("[Error reading file: {e}]"),
    }
}

fn write_self_review_file(
    project_root: &Path,
    session_id: &str,
    step_id: &str,
    tasks: &[&EvaluationTask],
    notes: Option<&str>,
    max_inline_files: usize,
) -> Result<PathBuf, std::io::Error> {
    let mut doc = format!("# Self-review: {step_id}\n\n");
    for task in tasks {
        doc.push_str(&format!("## {}\n\n", task.label));
        doc.push_str("Criteria:\n");
        for (name, question) in &task.criteria {
            doc.push_str(&format!("- **{name}**: {question}\n"));
        }
        if let Some(guidance) = &task.guidance {
            doc.push_str(&format!("\nGuidance: {guidance}\n"));
        }
        doc.push_str("\nFiles:\n\n");
        doc.push_str(&build_payload(&task.files, project_root, None, max_inline_files));
        doc.push_str("\n\n");
    }
    if let Some(notes) = notes {
        if !notes.is_empty() {
            doc.push_str(&format!("AUTHOR NOTES\n{notes}\n\n"));
        }
    }
    doc.push_str(
        "## Checklist\n\n\
         1. Read every file listed above.\n\
         2. Evaluate each criterion independently.\n\
         3. Report PASS or FAIL for each criterion.\n\
         4. State the overall result.\n\
         5. If any criterion fails, give actionable feedback describing what to change.\n",
    );

    let dir = project_root.join(".deepwork").join("tmp");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("quality_review_{session_id}_{step_id}.md"));
    std::fs::write(&path, doc)?;
    Ok(path)
}

#[cfg(test)]
#[path = "quality_gate_tests.rs"]
mod tests;
