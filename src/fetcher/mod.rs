//! The fetch engine
//!
//! This module drives repeated passes over a stage's unfetched URLs until
//! none remain, classifying each response as a success, a permanent
//! failure (removed from the queue), or a transient failure (retried on
//! the next pass).

mod client;
mod drain;
mod policy;

pub use client::{build_http_client, USER_AGENT};
pub use drain::{drain, fetch_once, DrainOutcome, FetchOutcome};
pub use policy::{CancelToken, RetryPolicy};
