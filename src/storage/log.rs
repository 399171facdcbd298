//! Append-only request timing log
//!
//! Purely observational: entries are never updated, deleted, or read back
//! by the pipeline. One entry per fetch attempt that received an HTTP
//! response.

use crate::storage::store::HarvestStore;
use crate::storage::StorageResult;
use chrono::{DateTime, Utc};
use rusqlite::params;
use std::time::Duration;

/// Timing metadata for one completed request
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Writer for the shared `request_log` table
pub struct RequestLog<'a> {
    store: &'a HarvestStore,
}

impl<'a> RequestLog<'a> {
    pub fn new(store: &'a HarvestStore) -> Self {
        Self { store }
    }

    /// Appends one entry
    pub fn append(&self, entry: &LogEntry) -> StorageResult<()> {
        self.store.conn.execute(
            "INSERT INTO request_log (url, start_time, end_time, total_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.url,
                entry.started_at.to_rfc3339(),
                entry.finished_at.to_rfc3339(),
                entry.elapsed.as_millis() as i64,
            ],
        )?;
        Ok(())
    }

    /// Total number of logged requests
    pub fn entry_count(&self) -> StorageResult<u64> {
        let count: i64 =
            self.store
                .conn
                .query_row("SELECT COUNT(*) FROM request_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_count() {
        let store = HarvestStore::new_in_memory().unwrap();
        let log = RequestLog::new(&store);
        assert_eq!(log.entry_count().unwrap(), 0);

        let started = Utc::now();
        log.append(&LogEntry {
            url: "https://example.org/item".to_string(),
            started_at: started,
            finished_at: started + chrono::Duration::milliseconds(120),
            elapsed: Duration::from_millis(120),
        })
        .unwrap();

        assert_eq!(log.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_entries_survive_for_every_append() {
        let store = HarvestStore::new_in_memory().unwrap();
        let log = RequestLog::new(&store);

        for i in 0..5 {
            let now = Utc::now();
            log.append(&LogEntry {
                url: format!("https://example.org/{i}"),
                started_at: now,
                finished_at: now,
                elapsed: Duration::from_millis(i),
            })
            .unwrap();
        }

        assert_eq!(log.entry_count().unwrap(), 5);
    }
}
