// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! deepwork-adapters: the external reviewer boundary, a one-shot
//! subprocess invoked per quality-gate evaluation task.

pub mod reviewer;
pub mod subprocess;

pub use reviewer::{
    CriterionResult, ReviewRequest, ReviewResult, ReviewerAdapter, ReviewerError,
};
#[cfg(any(test, feature = "test-support"))]
pub use reviewer::FakeReviewerAdapter;
pub use reviewer::ClaudeReviewerAdapter;
pub use subprocess::run_with_timeout;
