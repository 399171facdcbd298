//! Retry policy and cancellation
//!
//! The baseline policy retries transient failures indefinitely with no
//! delay between passes. Callers needing bounded retry or backoff inject a
//! different policy; the drain loop itself stays the same.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Controls how the drain loop retries transient failures
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    /// Maximum number of passes over the unfetched set; `None` retries
    /// until every URL has succeeded or been permanently removed
    pub max_passes: Option<u32>,

    /// Delay between passes; `None` starts the next pass immediately
    pub pass_delay: Option<Duration>,
}

impl RetryPolicy {
    /// The baseline policy: unbounded retry, no delay
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Limits the number of passes
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    /// Waits between passes
    pub fn with_pass_delay(mut self, delay: Duration) -> Self {
        self.pass_delay = Some(delay);
        self
    }
}

/// Cooperative interrupt signal polled by the drain loop
///
/// Tripping the token stops the loop at the next row boundary; at most the
/// in-flight request's outcome is lost, and that URL stays pending for the
/// next run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the drain loop stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
