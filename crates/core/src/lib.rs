// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! deepwork-core: shared data model for the deepwork workflow orchestration server.
//!
//! This crate has no I/O of its own. It defines the typed job definition
//! (`JobDefinition`, `Step`, `Workflow`, ...), the runtime session state
//! (`WorkflowSession`, `StepProgress`, ...), and the id/clock plumbing shared
//! by every other crate in the workspace.

pub mod clock;
pub mod definition;
pub mod id;
pub mod session;

pub use clock::{Clock, FakeClock, SystemClock};
pub use definition::{
    FileInput, HookAction, Hooks, JobDefinition, OutputKind, OutputSpec, RawHookAction, Review,
    Step, StepInput, UserInput, Workflow, WorkflowEntry,
};
pub use id::{IdGen, ShortId, SessionId, UuidIdGen};
pub use session::{OutputValue, SessionStatus, StackEntry, StepProgress, WorkflowSession};
