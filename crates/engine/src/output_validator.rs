// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-checks a submitted outputs map against a step's declared output
//! schema: unknown keys, missing required entries, type mismatches, and
//! existence on disk.

use deepwork_core::{OutputKind, OutputValue, Step};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown outputs {0:?}; valid: {1:?}")]
    UnknownOutputs(Vec<String>, Vec<String>),
    #[error("missing required outputs {0:?}")]
    MissingRequired(Vec<String>),
    #[error("output '{key}' expects a single filepath, not a list")]
    ExpectedFile { key: String },
    #[error("output '{key}' expects a list of filepaths, not a single string")]
    ExpectedFiles { key: String },
    #[error("output '{key}' references a file that does not exist: {path}")]
    FileNotFound { key: String, path: String },
}

/// Validate `outputs` against `step`'s declared output schema. Paths inside
/// `outputs` are resolved relative to `project_root`.
pub fn validate_outputs(
    step: &Step,
    outputs: &std::collections::HashMap<String, OutputValue>,
    project_root: &Path,
) -> Result<(), ValidationError> {
    let declared_keys: Vec<String> = step.outputs.keys().cloned().collect();

    let mut unknown: Vec<String> = outputs
        .keys()
        .filter(|k| !step.outputs.contains_key(*k))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(ValidationError::UnknownOutputs(unknown, declared_keys));
    }

    let mut missing: Vec<String> = step
        .outputs
        .iter()
        .filter(|(_, spec)| spec.required)
        .filter(|(key, _)| !outputs.contains_key(*key))
        .map(|(key, _)| key.clone())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ValidationError::MissingRequired(missing));
    }

    for (key, value) in outputs {
        let spec = step
            .outputs
            .get(key)
            .expect("unknown-key check above guarantees this key is declared");
        match (spec.kind, value) {
            (OutputKind::File, OutputValue::File(path)) => {
                check_exists(key, path, project_root)?;
            }
            (OutputKind::File, OutputValue::Files(_)) => {
                return Err(ValidationError::ExpectedFile { key: key.clone() });
            }
            (OutputKind::Files, OutputValue::Files(paths)) => {
                for path in paths {
                    check_exists(key, path, project_root)?;
                }
            }
            (OutputKind::Files, OutputValue::File(_)) => {
                return Err(ValidationError::ExpectedFiles { key: key.clone() });
            }
        }
    }

    Ok(())
}

fn check_exists(key: &str, relative_path: &str, project_root: &Path) -> Result<(), ValidationError> {
    let full: PathBuf = project_root.join(relative_path);
    if !full.exists() {
        return Err(ValidationError::FileNotFound {
            key: key.to_string(),
            path: relative_path.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_validator_tests.rs"]
mod tests;
