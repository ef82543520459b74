// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction, so timestamps are deterministic in tests.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current time, as a UTC ISO 8601 string with microsecond
/// resolution (matching the `WorkflowSession.started_at` / `completed_at`
/// format required by the spec).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Render [`Clock::now`] as a UTC ISO 8601 string with microsecond
    /// resolution, e.g. `2026-07-26T10:00:00.123456Z`.
    fn now_iso(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Wall-clock time source for production use.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at a fixed instant and advances by
/// one second on every call, so successive timestamps are strictly ordered
/// without depending on wall-clock time or sleeps.
#[derive(Clone)]
pub struct FakeClock {
    epoch_seconds: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            epoch_seconds: Arc::new(AtomicI64::new(start.timestamp())),
        }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(
            "2026-01-01T00:00:00Z"
                .parse()
                .expect("valid fixed timestamp"),
        )
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.epoch_seconds.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).expect("in-range timestamp")
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
