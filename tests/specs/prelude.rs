//! Test helpers for behavioral specifications.
//!
//! Two layers: black-box CLI invocation (`cli()`, mirrors how the CLI's own
//! users would drive it) and in-process MCP tool calls against a
//! [`DeepworkServer`] (`Project::server()`), for the session-stack and
//! quality-gate behavior that would be awkward to exercise through a
//! subprocess's stdio transport.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use deepwork_core::{FakeClock, IdGen, SessionId, UuidIdGen};
use deepwork_mcp::DeepworkServer;
use deepwork_storage::StateStore;
use rmcp::model::CallToolResult;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub use deepwork_mcp::dto::{
    AbortWorkflowRequest, FinishedStepRequest, OutputValueDto, StartWorkflowRequest,
};
pub use rmcp::handler::server::tool::Parameters;

/// Build a `start_workflow` request for the common case: a fresh goal, no
/// explicit instance id.
pub fn start_req(job_name: &str, workflow_name: &str) -> Parameters<StartWorkflowRequest> {
    Parameters(StartWorkflowRequest {
        goal: "ship it".to_string(),
        job_name: job_name.to_string(),
        workflow_name: workflow_name.to_string(),
        instance_id: None,
    })
}

/// Build a `finished_step` request from a plain list of `(output, path)`
/// pairs, with no notes and no override.
pub fn finish_req(outputs: &[(&str, &str)]) -> Parameters<FinishedStepRequest> {
    finish_req_with_override(outputs, None)
}

/// Same as [`finish_req`], but with an explicit
/// `quality_review_override_reason`.
pub fn finish_req_with_override(
    outputs: &[(&str, &str)],
    override_reason: Option<&str>,
) -> Parameters<FinishedStepRequest> {
    let outputs = outputs
        .iter()
        .map(|(k, v)| (k.to_string(), OutputValueDto::File(v.to_string())))
        .collect();
    Parameters(FinishedStepRequest {
        outputs,
        notes: None,
        quality_review_override_reason: override_reason.map(|s| s.to_string()),
        session_id: None,
    })
}

/// Returns the path to the `deepwork` binary, checking llvm-cov's target
/// directory first. Falls back to resolving relative to the test binary
/// itself when `CARGO_MANIFEST_DIR` is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn deepwork_binary() -> PathBuf {
    binary_path("deepwork")
}

/// Create a CLI builder for `deepwork` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    stdin: Option<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            stdin: None,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(deepwork_binary());
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn run(self) -> Output {
        use std::io::Write;
        let mut cmd = self.command();
        if let Some(stdin) = &self.stdin {
            cmd.stdin(std::process::Stdio::piped());
            cmd.stdout(std::process::Stdio::piped());
            cmd.stderr(std::process::Stdio::piped());
            let mut child = cmd.spawn().expect("command should spawn");
            child
                .stdin
                .as_mut()
                .expect("stdin piped")
                .write_all(stdin.as_bytes())
                .expect("stdin should write");
            child.wait_with_output().expect("command should run")
        } else {
            cmd.output().expect("command should run")
        }
    }

    pub fn passes(self) -> RunAssert {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        assert!(
            self.stdout().contains(expected),
            "stdout does not contain '{expected}'\nstdout: {}",
            self.stdout()
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        assert!(
            self.stderr().contains(expected),
            "stderr does not contain '{expected}'\nstderr: {}",
            self.stderr()
        );
        self
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout())
            .unwrap_or_else(|e| panic!("stdout was not JSON: {e}\nstdout: {}", self.stdout()))
    }
}

/// Deterministic session ids (`s0`, `s1`, ...) for assertions that pin exact
/// ids rather than matching patterns.
pub struct SequentialIdGen {
    next: AtomicU32,
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(0),
        }
    }
}

impl IdGen for SequentialIdGen {
    fn next_session_id(&self) -> SessionId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        SessionId::new(format!("s{n}"))
    }
}

/// A temporary project directory plus helpers for writing job fixtures and
/// driving the MCP tool surface directly, without a subprocess.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(full_path, content).expect("write fixture file");
    }

    /// Write a minimal job with a single no-review step, one required file
    /// output.
    pub fn write_single_step_job(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a single-step job
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: write
    name: Write
    description: Write the thing
    instructions_file: steps/write.md
    outputs:
      result:
        type: file
        description: the result
        required: true
workflows:
  - name: main
    summary: single step
    steps: [write]
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/write.md"), "Write the thing.");
    }

    /// Write a two-step job (`draft` depends on nothing, `finalize` depends
    /// on `draft`'s output) with no review gates.
    pub fn write_two_step_job(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a two-step job
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: draft
    name: Draft
    description: Write a draft
    instructions_file: steps/draft.md
    outputs:
      notes:
        type: file
        description: the draft
        required: true
  - id: finalize
    name: Finalize
    description: Finalize the draft
    instructions_file: steps/finalize.md
    dependencies: [draft]
    inputs:
      - file: notes
        from_step: draft
    outputs:
      final:
        type: file
        description: the final document
        required: true
workflows:
  - name: main
    summary: draft then finalize
    steps: [draft, finalize]
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/draft.md"), "Write a first draft.");
        self.file(format!(".deepwork/jobs/{job_name}/steps/finalize.md"), "Polish the draft.");
    }

    /// Write a single-step job with one review gate over the whole step.
    pub fn write_reviewed_job(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a job with a review gate
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: write
    name: Write
    description: Write the report
    instructions_file: steps/write.md
    outputs:
      report:
        type: file
        description: the report
        required: true
    reviews:
      - run_each: step
        quality_criteria:
          clear: Is it clear?
workflows:
  - name: main
    summary: single step
    steps: [write]
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/write.md"), "Write the report.");
    }

    /// Write a job whose workflow starts with a concurrent group `[a, b]`
    /// followed by a single trailing step `c`.
    pub fn write_concurrent_job(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a job with a concurrent fan-out
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: a
    name: A
    description: Do the first concurrent thing
    instructions_file: steps/a.md
    outputs:
      a_result:
        type: file
        description: a's result
        required: true
  - id: b
    name: B
    description: Do the second concurrent thing
    instructions_file: steps/b.md
    outputs:
      b_result:
        type: file
        description: b's result
        required: true
  - id: c
    name: C
    description: Merge the concurrent results
    instructions_file: steps/c.md
    outputs:
      c_result:
        type: file
        description: c's result
        required: true
workflows:
  - name: main
    summary: a and b concurrently, then c
    steps: [[a, b], c]
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/a.md"), "Do the first concurrent thing.");
        self.file(format!(".deepwork/jobs/{job_name}/steps/b.md"), "Do the second concurrent thing.");
        self.file(format!(".deepwork/jobs/{job_name}/steps/c.md"), "Merge the concurrent results.");
    }

    /// Write a job whose workflow starts with a single step `x` and then
    /// advances into a concurrent group `[a, b]`.
    pub fn write_job_with_trailing_concurrent_group(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a job that advances into a concurrent fan-out
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: x
    name: X
    description: Prepare for the fan-out
    instructions_file: steps/x.md
    outputs:
      x_result:
        type: file
        description: x's result
        required: true
  - id: a
    name: A
    description: Do the first concurrent thing
    instructions_file: steps/a.md
    outputs:
      a_result:
        type: file
        description: a's result
        required: true
  - id: b
    name: B
    description: Do the second concurrent thing
    instructions_file: steps/b.md
    outputs:
      b_result:
        type: file
        description: b's result
        required: true
workflows:
  - name: main
    summary: x, then a and b concurrently
    steps: [x, [a, b]]
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/x.md"), "Prepare for the fan-out.");
        self.file(format!(".deepwork/jobs/{job_name}/steps/a.md"), "Do the first concurrent thing.");
        self.file(format!(".deepwork/jobs/{job_name}/steps/b.md"), "Do the second concurrent thing.");
    }

    /// Write a job whose only workflow declares zero steps - rejected by
    /// schema validation at load time (`workflows[].steps` has `minItems: 1`).
    pub fn write_job_with_empty_workflow(&self, job_name: &str) {
        self.file(
            format!(".deepwork/jobs/{job_name}/job.yml"),
            &format!(
                r#"
name: {job_name}
version: "1.0.0"
summary: a job whose workflow has no steps
common_job_info_provided_to_all_steps_at_runtime: "context"
steps:
  - id: write
    name: Write
    description: Write the thing
    instructions_file: steps/write.md
workflows:
  - name: main
    summary: empty
    steps: []
"#
            ),
        );
        self.file(format!(".deepwork/jobs/{job_name}/steps/write.md"), "Write the thing.");
    }

    /// Build a `DeepworkServer` with no quality gate and deterministic
    /// clock/ids, backed by this project's directory.
    pub fn server(&self) -> DeepworkServer {
        let store = self.store();
        DeepworkServer::new(self.path().to_path_buf(), store)
    }

    /// Build a server backed by a given external reviewer (e.g. a
    /// `FakeReviewerAdapter`), with up to `max_attempts` quality-gate
    /// retries before a step is rejected outright.
    pub fn server_with_external_reviewer(
        &self,
        adapter: Arc<dyn deepwork_adapters::ReviewerAdapter>,
        max_attempts: u32,
    ) -> DeepworkServer {
        let store = self.store();
        DeepworkServer::with_external_reviewer(self.path().to_path_buf(), store, adapter, max_attempts)
    }

    /// Build a server in self-review mode: instead of invoking a reviewer,
    /// `finished_step` emits an instruction file and expects a follow-up call
    /// with `quality_review_override_reason` set.
    pub fn server_with_self_review(&self) -> DeepworkServer {
        let store = self.store();
        DeepworkServer::with_self_review(self.path().to_path_buf(), store)
    }

    pub fn store(&self) -> StateStore {
        StateStore::new(
            self.path().to_path_buf(),
            Arc::new(FakeClock::default()),
            Arc::new(UuidIdGen),
        )
    }
}

pub fn text_of(result: CallToolResult) -> serde_json::Value {
    let content = result.content.expect("content present");
    let text = content
        .first()
        .and_then(|c| c.as_text())
        .expect("text content")
        .text
        .clone();
    serde_json::from_str(&text).expect("content is JSON")
}
