// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for [`super::ReviewerAdapter`]: returns a pre-programmed
//! verdict and records every request it received.

use super::{ReviewRequest, ReviewResult, ReviewerAdapter, ReviewerError};
use async_trait::async_trait;
use parking_lot::Mutex;

pub struct FakeReviewerAdapter {
    response: Mutex<Result<ReviewResult, String>>,
    calls: Mutex<Vec<ReviewRequest>>,
}

impl FakeReviewerAdapter {
    /// Always returns `response`.
    pub fn new(response: ReviewResult) -> Self {
        Self {
            response: Mutex::new(Ok(response)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Err(message.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_response(&self, response: ReviewResult) {
        *self.response.lock() = Ok(response);
    }

    pub fn calls(&self) -> Vec<ReviewRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ReviewerAdapter for FakeReviewerAdapter {
    async fn review(&self, request: ReviewRequest) -> Result<ReviewResult, ReviewerError> {
        self.calls.lock().push(request);
        match &*self.response.lock() {
            Ok(result) => Ok(result.clone()),
            Err(message) => Err(ReviewerError::Process(message.clone())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
