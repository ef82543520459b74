// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The embedded JSON Schema (Draft 7) used to validate decoded `job.yml`
//! documents before they are converted into typed definitions.

use once_cell::sync::Lazy;

const JOB_SCHEMA_SOURCE: &str = include_str!("../schema/job.schema.json");

static JOB_SCHEMA: Lazy<serde_json::Value> = Lazy::new(|| {
    serde_json::from_str(JOB_SCHEMA_SOURCE).expect("bundled job schema is valid JSON")
});

static JOB_VALIDATOR: Lazy<jsonschema::Validator> = Lazy::new(|| {
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft7)
        .build(&JOB_SCHEMA)
        .expect("bundled job schema compiles")
});

/// Validate a decoded `job.yml` document against the bundled schema,
/// returning every violation (not just the first) in document order.
pub fn validate_against_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let errors: Vec<String> = JOB_VALIDATOR
        .iter_errors(document)
        .map(|e| format!("{} (at {})", e, e.instance_path))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
