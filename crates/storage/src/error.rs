// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::stack::RouterError;
use thiserror::Error;

/// Errors surfaced by the state store. All variants map to the "State error"
/// row of the error-handling table: they surface to the MCP tool layer as a
/// tool-call failure with an instructive message.
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error("session file not found for id '{0}'")]
    SessionFileNotFound(String),
    #[error("corrupt session file '{path}': {source}")]
    CorruptSessionFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
