// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job directory discovery across the ordered list of configured folders.

use std::path::{Path, PathBuf};

/// Name of the environment variable listing additional, colon-delimited job
/// folders, checked after the project and bundled folders.
pub const ADDITIONAL_JOBS_FOLDERS_ENV: &str = "DEEPWORK_ADDITIONAL_JOBS_FOLDERS";

/// The folder directly bundled with this package, shipped at compile time.
pub fn bundled_standard_jobs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("standard-jobs")
}

/// Build the ordered, priority-first list of folders to scan for job
/// directories: the project's own `.deepwork/jobs/`, the bundled
/// standard-jobs folder, then any folders named in
/// `DEEPWORK_ADDITIONAL_JOBS_FOLDERS`.
pub fn job_folders(project_root: &Path) -> Vec<PathBuf> {
    let mut folders = vec![project_root.join(".deepwork").join("jobs"), bundled_standard_jobs_dir()];
    if let Ok(raw) = std::env::var(ADDITIONAL_JOBS_FOLDERS_ENV) {
        for entry in raw.split(':') {
            let trimmed = entry.trim();
            if !trimmed.is_empty() {
                folders.push(PathBuf::from(trimmed));
            }
        }
    }
    folders
}

/// One candidate job directory: its path and the directory name used as its
/// override-precedence identity.
#[derive(Debug, Clone)]
pub struct JobCandidate {
    pub dir_name: String,
    pub path: PathBuf,
}

/// Scan `folders` in priority order and return the set of candidate job
/// directories, applying the override rule: the earliest-priority folder
/// wins when the same directory name recurs, keyed by directory name (not
/// the `name` field inside `job.yml`).
pub fn discover_job_candidates(folders: &[PathBuf]) -> Vec<JobCandidate> {
    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();
    for folder in folders {
        if !folder.is_dir() {
            continue;
        }
        let mut subdirs: Vec<PathBuf> = match std::fs::read_dir(folder) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect(),
            Err(_) => continue,
        };
        subdirs.sort();
        for dir in subdirs {
            if !dir.join("job.yml").is_file() {
                continue;
            }
            let dir_name = match dir.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if !seen.insert(dir_name.clone()) {
                continue;
            }
            candidates.push(JobCandidate { dir_name, path: dir });
        }
    }
    candidates
}

/// Return the first matching job directory for `dir_name` in priority
/// order, or `None` if it is not present in any configured folder.
pub fn find_job_dir(project_root: &Path, dir_name: &str) -> Option<PathBuf> {
    for folder in job_folders(project_root) {
        let candidate = folder.join(dir_name);
        if candidate.join("job.yml").is_file() {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
