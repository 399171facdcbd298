//! Storage module for durable fetch state
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Per-stage fetch queue tables (work queue + result cache in one)
//! - The append-only request timing log
//! - Resumption support: row state survives process termination

mod log;
mod queue;
mod schema;
mod store;

pub use log::{LogEntry, RequestLog};
pub use queue::FetchQueue;
pub use store::HarvestStore;

use crate::HarvestError;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Opens (or creates) the harvest database at the given path
///
/// The store is opened once per pipeline run and shared sequentially across
/// stages; it is not safe for concurrent writers from multiple processes.
pub fn open_store(path: &Path) -> Result<HarvestStore, HarvestError> {
    Ok(HarvestStore::new(path)?)
}
