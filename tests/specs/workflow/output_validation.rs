use crate::prelude::*;

#[tokio::test]
async fn unknown_output_key_is_rejected() {
    let project = Project::empty();
    project.write_single_step_job("demo");
    let server = project.server();
    server.start_workflow(start_req("demo", "main")).await.unwrap();

    project.file("result.md", "body");
    let err = server
        .finished_step(finish_req(&[("result", "result.md"), ("typo", "result.md")]))
        .await
        .unwrap_err();
    assert!(err.message.contains("unknown outputs"));
}

#[tokio::test]
async fn missing_required_output_is_rejected() {
    let project = Project::empty();
    project.write_single_step_job("demo");
    let server = project.server();
    server.start_workflow(start_req("demo", "main")).await.unwrap();

    let err = server.finished_step(finish_req(&[])).await.unwrap_err();
    assert!(err.message.contains("missing required outputs"));
}

#[tokio::test]
async fn output_pointing_at_a_nonexistent_file_is_rejected() {
    let project = Project::empty();
    project.write_single_step_job("demo");
    let server = project.server();
    server.start_workflow(start_req("demo", "main")).await.unwrap();

    let err = server
        .finished_step(finish_req(&[("result", "never-written.md")]))
        .await
        .unwrap_err();
    assert!(err.message.contains("does not exist"));
}
