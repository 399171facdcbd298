//! The drain loop
//!
//! `drain` repeatedly fetches every unfetched URL in a stage's queue until
//! none remain. Per-URL state transitions are exactly: pending → fetched
//! (success), pending → pending (transient failure), pending → removed
//! (permanent failure). A storage error while recording an outcome is
//! logged and skipped, leaving the row retryable on the next pass.

use crate::fetcher::policy::{CancelToken, RetryPolicy};
use crate::storage::{FetchQueue, LogEntry, RequestLog};
use crate::Result;
use chrono::Utc;
use reqwest::Client;
use std::time::Instant;

/// Classified result of a single fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// Got a response and its body
    Success { body: Vec<u8> },

    /// Got an HTTP error response; 4xx is permanent, anything else transient
    HttpFailure { status: u16 },

    /// The URL cannot form a request at all; permanent, like a 4xx
    InvalidUrl { reason: String },

    /// The request never completed (timeout, DNS failure, connection reset)
    TransportFailure { reason: String },
}

/// How a drain call ended
#[derive(Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every URL succeeded or was permanently removed
    Complete,

    /// The cancel token was tripped between rows or passes
    Cancelled,

    /// The pass limit was reached with URLs still unfetched
    PassLimit { remaining: usize },
}

/// Issues one GET and classifies the result
pub async fn fetch_once(client: &Client, url: &str) -> FetchOutcome {
    // A URL that does not parse can never be requested; retrying it
    // forever would wedge the queue.
    let target = match url::Url::parse(url) {
        Ok(target) => target,
        Err(e) => {
            return FetchOutcome::InvalidUrl {
                reason: e.to_string(),
            }
        }
    };

    match client.get(target).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                return FetchOutcome::HttpFailure {
                    status: status.as_u16(),
                };
            }

            match response.bytes().await {
                Ok(body) => FetchOutcome::Success {
                    body: body.to_vec(),
                },
                Err(e) => FetchOutcome::TransportFailure {
                    reason: format!("Failed to read body: {e}"),
                },
            }
        }
        Err(e) => {
            let reason = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {e}")
            } else {
                e.to_string()
            };
            FetchOutcome::TransportFailure { reason }
        }
    }
}

/// Drains a stage's queue: fetches until no unfetched URL remains
///
/// Each pass snapshots the unfetched set and processes it in store order;
/// the loop terminates when a snapshot comes back empty, the injected
/// policy's pass limit is hit, or the cancel token trips.
pub async fn drain(
    queue: &FetchQueue<'_>,
    log: &RequestLog<'_>,
    client: &Client,
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<DrainOutcome> {
    let total = queue.row_count()?;
    let mut pass = 0u32;

    loop {
        let pending = queue.unfetched_urls()?;
        if pending.is_empty() {
            tracing::info!("Queue `{}` drained", queue.stage());
            return Ok(DrainOutcome::Complete);
        }

        if let Some(max) = policy.max_passes {
            if pass >= max {
                tracing::warn!(
                    "Pass limit {} reached for `{}` with {} URLs unfetched",
                    max,
                    queue.stage(),
                    pending.len()
                );
                return Ok(DrainOutcome::PassLimit {
                    remaining: pending.len(),
                });
            }
        }

        if cancel.is_cancelled() {
            tracing::info!("Drain of `{}` cancelled between passes", queue.stage());
            return Ok(DrainOutcome::Cancelled);
        }

        pass += 1;
        tracing::info!(
            "Pass {} over `{}`: {} of {} URLs remaining",
            pass,
            queue.stage(),
            pending.len(),
            total
        );

        for url in &pending {
            if cancel.is_cancelled() {
                tracing::info!("Drain of `{}` cancelled mid-pass", queue.stage());
                return Ok(DrainOutcome::Cancelled);
            }

            tracing::debug!("Requesting {}", url);
            let started_at = Utc::now();
            let timer = Instant::now();
            let outcome = fetch_once(client, url).await;
            let elapsed = timer.elapsed();
            let finished_at = Utc::now();

            // Timing is logged for every attempt that got an HTTP response,
            // not for requests that never completed.
            if matches!(
                outcome,
                FetchOutcome::Success { .. } | FetchOutcome::HttpFailure { .. }
            ) {
                let entry = LogEntry {
                    url: url.clone(),
                    started_at,
                    finished_at,
                    elapsed,
                };
                if let Err(e) = log.append(&entry) {
                    tracing::error!("Failed to append request log for {}: {}", url, e);
                }
            }

            match outcome {
                FetchOutcome::Success { body } => {
                    if let Err(e) = queue.record_success(url, &body) {
                        tracing::error!("Failed to persist payload for {}: {}", url, e);
                    }
                }

                // 4xx means the request is structurally invalid and will
                // never succeed; retrying would loop forever.
                FetchOutcome::HttpFailure { status } if (400..=499).contains(&status) => {
                    tracing::info!(
                        "HTTP {} for {} -- removed, will not be retried",
                        status,
                        url
                    );
                    if let Err(e) = queue.record_permanent_failure(url) {
                        tracing::error!("Failed to remove row for {}: {}", url, e);
                    }
                }

                FetchOutcome::HttpFailure { status } => {
                    tracing::warn!("HTTP {} for {}, will retry next pass", status, url);
                    if let Err(e) = queue.record_transient_failure(url) {
                        tracing::error!("Failed to record failure for {}: {}", url, e);
                    }
                }

                FetchOutcome::InvalidUrl { reason } => {
                    tracing::info!(
                        "Unparseable URL {} ({}) -- removed, will not be retried",
                        url,
                        reason
                    );
                    if let Err(e) = queue.record_permanent_failure(url) {
                        tracing::error!("Failed to remove row for {}: {}", url, e);
                    }
                }

                FetchOutcome::TransportFailure { reason } => {
                    tracing::warn!("Error requesting {}: {}, will retry next pass", url, reason);
                    if let Err(e) = queue.record_transient_failure(url) {
                        tracing::error!("Failed to record failure for {}: {}", url, e);
                    }
                }
            }
        }

        if let Some(delay) = policy.pass_delay {
            tokio::time::sleep(delay).await;
        }
    }
}
