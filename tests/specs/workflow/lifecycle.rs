use crate::prelude::*;

#[tokio::test]
async fn full_lifecycle_runs_every_step_then_completes() {
    let project = Project::empty();
    project.write_two_step_job("demo");
    let server = project.server();

    let begin = server.start_workflow(start_req("demo", "main")).await.unwrap();
    let body = text_of(begin);
    assert_eq!(body["begin_step"]["step_id"], "draft");
    assert_eq!(body["stack"].as_array().unwrap().len(), 1);

    project.file("notes.md", "draft body");
    let advance = server.finished_step(finish_req(&[("notes", "notes.md")])).await.unwrap();
    let body = text_of(advance);
    assert_eq!(body["status"], "next_step");
    assert_eq!(body["begin_step"]["step_id"], "finalize");

    project.file("final.md", "final body");
    let complete = server.finished_step(finish_req(&[("final", "final.md")])).await.unwrap();
    let body = text_of(complete);
    assert_eq!(body["status"], "workflow_complete");
    assert!(body["stack"].as_array().unwrap().is_empty());
    assert_eq!(body["all_outputs"]["notes"], "notes.md");
    assert_eq!(body["all_outputs"]["final"], "final.md");
}

#[tokio::test]
async fn get_workflows_surfaces_broken_jobs_without_dropping_the_good_ones() {
    let project = Project::empty();
    project.write_two_step_job("demo");
    project.write_job_with_empty_workflow("broken");
    let server = project.server();

    let body = text_of(server.get_workflows().await.unwrap());
    let jobs = body["jobs"].as_array().unwrap();
    assert!(jobs.iter().any(|j| j["name"] == "demo"));
    assert!(jobs.iter().all(|j| j["name"] != "broken"));

    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["job_name"] == "broken"));
}

#[tokio::test]
async fn starting_a_workflow_in_a_job_that_failed_to_load_is_unknown() {
    let project = Project::empty();
    project.write_job_with_empty_workflow("broken");
    let server = project.server();

    let err = server.start_workflow(start_req("broken", "main")).await.unwrap_err();
    assert!(err.message.contains("unknown job"));
}

#[tokio::test]
async fn single_workflow_jobs_ignore_a_mismatched_workflow_name() {
    let project = Project::empty();
    project.write_single_step_job("demo");
    let server = project.server();

    // `demo` has exactly one workflow ("main"); a caller passing the wrong
    // name still gets routed to it rather than rejected.
    let result = server.start_workflow(start_req("demo", "does-not-exist")).await.unwrap();
    let body = text_of(result);
    assert_eq!(body["begin_step"]["step_id"], "write");
}
