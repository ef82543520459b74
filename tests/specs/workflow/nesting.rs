use crate::prelude::*;

#[tokio::test]
async fn starting_a_second_workflow_pushes_a_nested_session() {
    let project = Project::empty();
    project.write_single_step_job("outer");
    project.write_single_step_job("inner");
    let server = project.server();

    let outer = text_of(server.start_workflow(start_req("outer", "main")).await.unwrap());
    assert_eq!(outer["stack"].as_array().unwrap().len(), 1);

    let inner = text_of(server.start_workflow(start_req("inner", "main")).await.unwrap());
    assert_eq!(inner["stack"].as_array().unwrap().len(), 2);
    // The most recently started session is on top.
    assert_eq!(inner["begin_step"]["step_id"], "write");
}

#[tokio::test]
async fn finished_step_without_a_session_id_targets_the_top_of_the_stack() {
    let project = Project::empty();
    project.write_single_step_job("outer");
    project.write_single_step_job("inner");
    let server = project.server();

    server.start_workflow(start_req("outer", "main")).await.unwrap();
    server.start_workflow(start_req("inner", "main")).await.unwrap();

    project.file("result.md", "inner output");
    let result = text_of(
        server
            .finished_step(finish_req(&[("result", "result.md")]))
            .await
            .unwrap(),
    );
    assert_eq!(result["status"], "workflow_complete");
    // Only the inner (nested, single-step) workflow completed; outer is
    // still on the stack.
    assert_eq!(result["stack"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn abort_from_the_middle_clears_only_the_top_session_and_resumes_below() {
    let project = Project::empty();
    project.write_single_step_job("outer");
    project.write_single_step_job("inner");
    let server = project.server();

    server.start_workflow(start_req("outer", "main")).await.unwrap();
    server.start_workflow(start_req("inner", "main")).await.unwrap();

    let result = text_of(
        server
            .abort_workflow(Parameters(AbortWorkflowRequest {
                explanation: "wrong approach".to_string(),
                session_id: None,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(result["aborted_workflow"], "inner/main");
    assert_eq!(result["resumed_workflow"], "outer/main");
    assert_eq!(result["stack"].as_array().unwrap().len(), 1);

    // The outer workflow resumes normally after the nested one is aborted.
    project.file("result.md", "outer output");
    let completed = text_of(
        server
            .finished_step(finish_req(&[("result", "result.md")]))
            .await
            .unwrap(),
    );
    assert_eq!(completed["status"], "workflow_complete");
    assert!(completed["stack"].as_array().unwrap().is_empty());
}
