use crate::prelude::*;

#[tokio::test]
async fn start_workflow_reports_companions_for_a_leading_concurrent_group() {
    let project = Project::empty();
    project.write_concurrent_job("fanout");
    let server = project.server();

    let result = text_of(server.start_workflow(start_req("fanout", "main")).await.unwrap());
    assert_eq!(result["begin_step"]["step_id"], "a");
    assert_eq!(result["begin_step"]["concurrent_with"], serde_json::json!(["b"]));
}

#[tokio::test]
async fn finished_step_reports_companions_when_advancing_into_a_concurrent_group() {
    let project = Project::empty();
    project.write_job_with_trailing_concurrent_group("fanout");
    let server = project.server();

    let start = text_of(server.start_workflow(start_req("fanout", "main")).await.unwrap());
    assert_eq!(start["begin_step"]["step_id"], "x");
    assert!(start["begin_step"]["concurrent_with"].is_null());

    project.file("x.md", "x output");
    let advanced = text_of(
        server
            .finished_step(finish_req(&[("x_result", "x.md")]))
            .await
            .unwrap(),
    );
    assert_eq!(advanced["status"], "next_step");
    assert_eq!(advanced["begin_step"]["step_id"], "a");
    assert_eq!(advanced["begin_step"]["concurrent_with"], serde_json::json!(["b"]));
}
