// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties folder discovery, schema validation, and semantic checks together
//! into `load_all_jobs`: every job that fails any stage is recorded and
//! skipped, never aborting the scan of the rest.

use crate::discover::{discover_job_candidates, job_folders, JobCandidate};
use crate::error::JobLoadError;
use crate::raw::RawJobDefinition;
use crate::schema::validate_against_schema;
use crate::semantic::{orphaned_steps, validate_semantics};
use deepwork_core::JobDefinition;
use std::path::Path;

/// A successfully loaded job, paired with its source directory and any
/// orphaned-step warnings (which do not block loading).
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub definition: JobDefinition,
    pub job_dir: std::path::PathBuf,
    pub orphaned_steps: Vec<String>,
}

/// Load every job directory visible across the configured folders. Returns
/// the jobs that loaded successfully and the per-job errors for those that
/// did not; a failure in one job never affects the others.
pub fn load_all_jobs(project_root: &Path) -> (Vec<LoadedJob>, Vec<JobLoadError>) {
    let folders = job_folders(project_root);
    let candidates = discover_job_candidates(&folders);
    let mut loaded = Vec::new();
    let mut errors = Vec::new();

    for candidate in candidates {
        match load_one(&candidate) {
            Ok(job) => loaded.push(job),
            Err(error) => errors.push(JobLoadError {
                job_name: candidate.dir_name.clone(),
                job_dir: candidate.path,
                error,
            }),
        }
    }

    (loaded, errors)
}

fn load_one(candidate: &JobCandidate) -> Result<LoadedJob, String> {
    let job_yml = candidate.path.join("job.yml");
    let content = std::fs::read_to_string(&job_yml)
        .map_err(|e| format!("failed to read job.yml: {e}"))?;
    if content.trim().is_empty() {
        return Err("job.yml is empty".to_string());
    }

    let document: serde_json::Value =
        serde_yaml::from_str(&content).map_err(|e| format!("invalid YAML: {e}"))?;
    validate_against_schema(&document)
        .map_err(|errors| format!("schema validation failed: {}", errors.join("; ")))?;

    let raw: RawJobDefinition =
        serde_yaml::from_str(&content).map_err(|e| format!("invalid YAML: {e}"))?;
    let definition = raw
        .into_job_definition()
        .map_err(|e| format!("invalid hook action: {e}"))?;

    let semantic_errors = validate_semantics(&definition);
    if !semantic_errors.is_empty() {
        let joined = semantic_errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(joined);
    }

    let orphaned = orphaned_steps(&definition);
    for id in &orphaned {
        tracing::warn!(job = %candidate.dir_name, step = %id, "step is not referenced by any workflow");
    }

    Ok(LoadedJob {
        definition,
        job_dir: candidate.path.clone(),
        orphaned_steps: orphaned,
    })
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
