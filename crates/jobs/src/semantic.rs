// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-reference checks run after schema validation and YAML decode:
//! dependency existence and acyclicity, file-input consistency, review
//! target existence, workflow uniqueness, and orphaned-step detection.

use deepwork_core::{JobDefinition, StepInput};
use std::collections::{HashMap, HashSet};

/// A single semantic-check failure, collected rather than raised
/// immediately so a job reports every problem at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError(pub String);

impl std::fmt::Display for SemanticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Steps that exist but are not referenced by any workflow. Reported as a
/// warning, never a load failure.
pub fn orphaned_steps(job: &JobDefinition) -> Vec<String> {
    let referenced: HashSet<&str> = job
        .workflows
        .iter()
        .flat_map(|w| w.all_step_ids())
        .collect();
    job.steps
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !referenced.contains(id))
        .map(str::to_string)
        .collect()
}

/// Run every semantic check, collecting all failures rather than stopping
/// at the first.
pub fn validate_semantics(job: &JobDefinition) -> Vec<SemanticError> {
    let mut errors = Vec::new();
    let step_ids: HashSet<&str> = job.steps.iter().map(|s| s.id.as_str()).collect();

    check_dependencies_exist(job, &step_ids, &mut errors);
    check_acyclic(job, &mut errors);
    check_file_inputs(job, &mut errors);
    check_review_targets(job, &mut errors);
    check_workflows(job, &step_ids, &mut errors);

    errors
}

fn check_dependencies_exist(
    job: &JobDefinition,
    step_ids: &HashSet<&str>,
    errors: &mut Vec<SemanticError>,
) {
    for step in &job.steps {
        for dep in &step.dependencies {
            if !step_ids.contains(dep.as_str()) {
                errors.push(SemanticError(format!(
                    "step '{}' depends on unknown step '{}'",
                    step.id, dep
                )));
            }
        }
    }
}

/// Kahn's algorithm topological sort over the dependency graph; any step
/// left un-visited at the end sits on a cycle.
fn check_acyclic(job: &JobDefinition, errors: &mut Vec<SemanticError>) {
    let mut indegree: HashMap<&str, usize> = job.steps.iter().map(|s| (s.id.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in &job.steps {
        for dep in &step.dependencies {
            if indegree.contains_key(dep.as_str()) {
                *indegree.get_mut(step.id.as_str()).expect("step id present") += 1;
                dependents.entry(dep.as_str()).or_default().push(step.id.as_str());
            }
        }
    }

    let mut queue: Vec<&str> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();
    queue.sort();
    let mut visited = 0usize;
    let mut i = 0;
    while i < queue.len() {
        let current = queue[i];
        i += 1;
        visited += 1;
        if let Some(next) = dependents.get(current) {
            let mut freed: Vec<&str> = Vec::new();
            for &dep_id in next {
                let deg = indegree.get_mut(dep_id).expect("dependent id present");
                *deg -= 1;
                if *deg == 0 {
                    freed.push(dep_id);
                }
            }
            freed.sort();
            queue.extend(freed);
        }
    }

    if visited < job.steps.len() {
        let mut cyclic: Vec<&str> = indegree
            .iter()
            .filter(|(_, &deg)| deg > 0)
            .map(|(&id, _)| id)
            .collect();
        cyclic.sort();
        errors.push(SemanticError(format!(
            "dependency cycle detected among steps: {}",
            cyclic.join(", ")
        )));
    }
}

fn check_file_inputs(job: &JobDefinition, errors: &mut Vec<SemanticError>) {
    for step in &job.steps {
        for input in &step.inputs {
            if let StepInput::File(file_input) = input {
                if !step.dependencies.iter().any(|d| d == &file_input.from_step) {
                    errors.push(SemanticError(format!(
                        "step '{}' input references output '{}' from step '{}', but '{}' is not in its dependencies",
                        step.id, file_input.file, file_input.from_step, file_input.from_step
                    )));
                }
            }
        }
    }
}

fn check_review_targets(job: &JobDefinition, errors: &mut Vec<SemanticError>) {
    for step in &job.steps {
        for review in &step.reviews {
            if !review.runs_over_whole_step() && !step.outputs.contains_key(&review.run_each) {
                errors.push(SemanticError(format!(
                    "step '{}' review run_each '{}' does not name a declared output",
                    step.id, review.run_each
                )));
            }
        }
    }
}

fn check_workflows(job: &JobDefinition, step_ids: &HashSet<&str>, errors: &mut Vec<SemanticError>) {
    let mut seen_names = HashSet::new();
    for workflow in &job.workflows {
        if !seen_names.insert(workflow.name.as_str()) {
            errors.push(SemanticError(format!(
                "duplicate workflow name '{}'",
                workflow.name
            )));
        }
        let mut seen_ids = HashSet::new();
        for id in workflow.all_step_ids() {
            if !step_ids.contains(id) {
                errors.push(SemanticError(format!(
                    "workflow '{}' references unknown step '{}'",
                    workflow.name, id
                )));
            }
            if !seen_ids.insert(id) {
                errors.push(SemanticError(format!(
                    "workflow '{}' references step '{}' more than once",
                    workflow.name, id
                )));
            }
        }
    }
}

#[cfg(test)]
#[path = "semantic_tests.rs"]
mod tests;
