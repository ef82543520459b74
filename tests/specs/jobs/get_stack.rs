use crate::prelude::*;

#[test]
fn empty_project_yields_empty_active_sessions() {
    let project = Project::empty();
    let body = cli()
        .args(&["jobs", "get-stack", "--path"])
        .args(&[project.path().to_str().unwrap()])
        .passes()
        .stdout_json();
    assert!(body["active_sessions"].as_array().unwrap().is_empty());
}

#[test]
fn active_session_is_enriched_with_job_context() {
    let project = Project::empty();
    project.write_single_step_job("demo");

    // Create a session the same way `start_workflow` would, then inspect it
    // through the CLI - both read and write the same
    // `.deepwork/tmp/session_*.json` files, so this exercises the on-disk
    // contract between them.
    let store = project.store();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        store
            .create_session("demo", "main", "ship it", None, "write")
            .await
            .unwrap();
        store.start_step("write", None).await.unwrap();
    });

    let body = cli()
        .args(&["jobs", "get-stack", "--path"])
        .args(&[project.path().to_str().unwrap()])
        .passes()
        .stdout_json();
    let sessions = body["active_sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["job_name"], "demo");
    assert_eq!(sessions[0]["total_steps"], 1);
    assert_eq!(sessions[0]["step_number"], 1);
    assert!(sessions[0]["current_step_instructions"]
        .as_str()
        .unwrap()
        .contains("Write the thing"));
}
