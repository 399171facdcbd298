//! HTTP client construction

use reqwest::Client;
use std::time::Duration;

/// Identifying header sent with every request, as the LC endpoints expect
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_3) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/35.0.1916.47 Safari/537.36";

/// Builds the HTTP client used for all fetches in a run
///
/// Request and connect timeouts are explicit so a hung request cannot
/// block the whole pipeline; a timed-out URL is recorded as a transient
/// failure and retried on the next pass.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client().is_ok());
    }
}
