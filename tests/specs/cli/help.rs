use crate::prelude::*;

#[test]
fn top_level_help_lists_the_three_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("serve")
        .stdout_has("hook")
        .stdout_has("jobs");
}

#[test]
fn serve_help_documents_quality_gate_and_transport_flags() {
    cli()
        .args(&["serve", "--help"])
        .passes()
        .stdout_has("--no-quality-gate")
        .stdout_has("--transport")
        .stdout_has("--external-runner");
}

#[test]
fn jobs_get_stack_help_documents_path_flag() {
    cli()
        .args(&["jobs", "get-stack", "--help"])
        .passes()
        .stdout_has("--path");
}
