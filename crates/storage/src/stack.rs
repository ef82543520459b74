// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory session stack and the session id router.
//!
//! A stack that allows removing any element by id is not a pure stack; we
//! model it as an ordered `Vec` with O(n) removal, favoring simplicity over
//! asymptotics (stack depth rarely exceeds a handful of nested workflows).

use deepwork_core::{StackEntry, WorkflowSession};
use thiserror::Error;

/// Errors raised while resolving a session id against the stack.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    /// `session_id` was supplied but no session on the stack has that id.
    #[error("no active session with id '{0}'")]
    UnknownSessionId(String),
    /// No `session_id` was supplied and the stack is empty.
    #[error(
        "no active workflow session. Start one with start_workflow, or pass a session_id \
         if one is running elsewhere."
    )]
    NoActiveSession,
}

/// Ordered collection of active sessions. Bottom (index 0) is the oldest;
/// top (last index) is the newest and, absent an explicit `session_id`, the
/// default target of every tool call.
#[derive(Debug, Default)]
pub struct SessionStack {
    sessions: Vec<WorkflowSession>,
}

impl SessionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, session: WorkflowSession) {
        self.sessions.push(session);
    }

    pub fn depth(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Bottom-to-top view of the stack, for the `stack` field returned on
    /// every tool response.
    pub fn entries(&self) -> Vec<StackEntry> {
        self.sessions.iter().map(StackEntry::from).collect()
    }

    /// Resolve `session_id` (or the top of the stack, if `None`) to an
    /// immutable reference.
    pub fn resolve(&self, session_id: Option<&str>) -> Result<&WorkflowSession, RouterError> {
        match session_id {
            Some(id) => self
                .sessions
                .iter()
                .find(|s| s.session_id.as_str() == id)
                .ok_or_else(|| RouterError::UnknownSessionId(id.to_string())),
            None => self.sessions.last().ok_or(RouterError::NoActiveSession),
        }
    }

    /// Resolve `session_id` (or the top of the stack, if `None`) to a mutable
    /// reference.
    pub fn resolve_mut(
        &mut self,
        session_id: Option<&str>,
    ) -> Result<&mut WorkflowSession, RouterError> {
        match session_id {
            Some(id) => self
                .sessions
                .iter_mut()
                .find(|s| s.session_id.as_str() == id)
                .ok_or_else(|| RouterError::UnknownSessionId(id.to_string())),
            None => self.sessions.last_mut().ok_or(RouterError::NoActiveSession),
        }
    }

    /// Replace the top-of-stack session with `session` if the stack is
    /// non-empty, otherwise push it. Used by `load_session`.
    pub fn replace_top_or_push(&mut self, session: WorkflowSession) {
        if let Some(top) = self.sessions.last_mut() {
            *top = session;
        } else {
            self.sessions.push(session);
        }
    }

    /// Remove the session with `id` from wherever it sits in the stack,
    /// returning it if present, along with the new top (if any) for
    /// `complete_workflow` / `abort_workflow` response shaping.
    pub fn remove_by_id(&mut self, id: &str) -> Option<WorkflowSession> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.session_id.as_str() == id)?;
        Some(self.sessions.remove(index))
    }

    pub fn top(&self) -> Option<&WorkflowSession> {
        self.sessions.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowSession> {
        self.sessions.iter()
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
