//! loc-harvester: a resumable Library of Congress metadata harvester
//!
//! This crate fetches LC web resources through a three-stage pipeline
//! (collection sitemaps, collection listing pages, item metadata pages),
//! persisting fetch state in SQLite so a long, failure-prone crawl can be
//! interrupted and resumed without re-fetching completed work.

pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod seedlist;
pub mod stage;
pub mod storage;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Seed list error: {0}")]
    SeedList(#[from] seedlist::SeedListError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Invalid collection name: {0:?}")]
    InvalidCollection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use fetcher::{build_http_client, CancelToken, DrainOutcome, RetryPolicy};
pub use stage::Stage;
pub use storage::{FetchQueue, HarvestStore, RequestLog};
