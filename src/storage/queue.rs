//! Per-stage fetch queue
//!
//! The queue table doubles as the work queue and the result cache: a row
//! with a NULL payload is pending work, a row with a payload (possibly
//! empty) is a completed fetch, and a deleted row is a URL that will never
//! succeed. Because each single-row mutation is durable, killing the
//! process at any point leaves the queue resumable.

use crate::stage::Stage;
use crate::storage::schema::{queue_table_exists, recreate_queue_table};
use crate::storage::store::HarvestStore;
use crate::storage::StorageResult;
use rusqlite::params;

/// Fetch queue for one pipeline stage
pub struct FetchQueue<'a> {
    store: &'a HarvestStore,
    stage: Stage,
}

impl<'a> FetchQueue<'a> {
    /// Binds a queue to its stage's table in the shared store
    pub fn new(store: &'a HarvestStore, stage: Stage) -> Self {
        Self { store, stage }
    }

    /// The stage this queue belongs to
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Seeds the queue with URLs
    ///
    /// With `resume = true` and an existing queue table, seeding is skipped
    /// entirely: every row, fetched or not, is preserved so an interrupted
    /// run continues exactly where it left off. Otherwise the table is
    /// dropped, recreated, and bulk-populated with unfetched rows.
    pub fn seed<I, S>(&self, urls: I, resume: bool) -> StorageResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let conn = &self.store.conn;

        if resume && queue_table_exists(conn, self.stage)? {
            tracing::info!(
                "Table `{}` already exists, resuming previous run",
                self.stage.table_name()
            );
            return Ok(());
        }

        recreate_queue_table(conn, self.stage)?;

        let mut inserted = 0usize;
        {
            let mut stmt = conn.prepare(&format!(
                "INSERT OR IGNORE INTO {} (url, payload) VALUES (?1, NULL)",
                self.stage.table_name()
            ))?;
            for url in urls {
                inserted += stmt.execute(params![url.as_ref()])?;
            }
        }

        tracing::info!(
            "Populated table `{}` with {} URLs",
            self.stage.table_name(),
            inserted
        );
        Ok(())
    }

    /// All URLs whose payload has not yet been fetched, in insertion order
    pub fn unfetched_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.store.conn.prepare(&format!(
            "SELECT url FROM {} WHERE payload IS NULL ORDER BY rowid",
            self.stage.table_name()
        ))?;

        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    /// Payloads of every fetched row, in insertion order
    pub fn fetched_payloads(&self) -> StorageResult<Vec<Vec<u8>>> {
        let mut stmt = self.store.conn.prepare(&format!(
            "SELECT payload FROM {} WHERE payload IS NOT NULL ORDER BY rowid",
            self.stage.table_name()
        ))?;

        let payloads = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<Vec<u8>>, _>>()?;

        Ok(payloads)
    }

    /// Total row count regardless of fetch state
    pub fn row_count(&self) -> StorageResult<u64> {
        let count: i64 = self.store.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.stage.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Records a successful fetch by setting the row's payload
    pub fn record_success(&self, url: &str, payload: &[u8]) -> StorageResult<()> {
        self.store.conn.execute(
            &format!(
                "UPDATE {} SET payload = ?1 WHERE url = ?2",
                self.stage.table_name()
            ),
            params![payload, url],
        )?;
        Ok(())
    }

    /// Records a transient failure
    ///
    /// The row's payload stays NULL, so the URL remains eligible for retry
    /// on the next pass. Stated as an explicit write so that a row whose
    /// success previously failed to persist ends up in a known state.
    pub fn record_transient_failure(&self, url: &str) -> StorageResult<()> {
        self.store.conn.execute(
            &format!(
                "UPDATE {} SET payload = NULL WHERE url = ?1",
                self.stage.table_name()
            ),
            params![url],
        )?;
        Ok(())
    }

    /// Removes a permanently unfetchable URL from the queue
    pub fn record_permanent_failure(&self, url: &str) -> StorageResult<()> {
        self.store.conn.execute(
            &format!("DELETE FROM {} WHERE url = ?1", self.stage.table_name()),
            params![url],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_queue<'a>(store: &'a HarvestStore, urls: &[&str]) -> FetchQueue<'a> {
        let queue = FetchQueue::new(store, Stage::Item);
        queue.seed(urls.iter().copied(), false).unwrap();
        queue
    }

    #[test]
    fn test_seed_fresh() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/", "https://b.example/"]);

        assert_eq!(queue.row_count().unwrap(), 2);
        assert_eq!(
            queue.unfetched_urls().unwrap(),
            vec!["https://a.example/", "https://b.example/"]
        );
        assert!(queue.fetched_payloads().unwrap().is_empty());
    }

    #[test]
    fn test_seed_deduplicates() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/", "https://a.example/"]);
        assert_eq!(queue.row_count().unwrap(), 1);
    }

    #[test]
    fn test_resume_seed_is_noop() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/", "https://b.example/"]);
        queue.record_success("https://a.example/", b"body-a").unwrap();

        let before_count = queue.row_count().unwrap();
        let before_payloads = queue.fetched_payloads().unwrap();

        // Resume seed with a different URL list must leave everything alone
        queue
            .seed(["https://c.example/", "https://d.example/"], true)
            .unwrap();

        assert_eq!(queue.row_count().unwrap(), before_count);
        assert_eq!(queue.fetched_payloads().unwrap(), before_payloads);
        assert_eq!(queue.unfetched_urls().unwrap(), vec!["https://b.example/"]);
    }

    #[test]
    fn test_fresh_seed_discards_previous_state() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/"]);
        queue.record_success("https://a.example/", b"body-a").unwrap();

        queue.seed(["https://z.example/"], false).unwrap();

        assert_eq!(queue.row_count().unwrap(), 1);
        assert_eq!(queue.unfetched_urls().unwrap(), vec!["https://z.example/"]);
        assert!(queue.fetched_payloads().unwrap().is_empty());
    }

    #[test]
    fn test_record_success_marks_fetched() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/", "https://b.example/"]);

        queue.record_success("https://b.example/", b"payload").unwrap();

        assert_eq!(queue.unfetched_urls().unwrap(), vec!["https://a.example/"]);
        assert_eq!(queue.fetched_payloads().unwrap(), vec![b"payload".to_vec()]);
        assert_eq!(queue.row_count().unwrap(), 2);
    }

    #[test]
    fn test_empty_payload_still_counts_as_fetched() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/"]);

        queue.record_success("https://a.example/", b"").unwrap();

        assert!(queue.unfetched_urls().unwrap().is_empty());
        assert_eq!(queue.fetched_payloads().unwrap(), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_transient_failure_keeps_row_retryable() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/"]);

        queue.record_transient_failure("https://a.example/").unwrap();

        assert_eq!(queue.row_count().unwrap(), 1);
        assert_eq!(queue.unfetched_urls().unwrap(), vec!["https://a.example/"]);
    }

    #[test]
    fn test_permanent_failure_deletes_row() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(&store, &["https://a.example/", "https://b.example/"]);

        queue.record_permanent_failure("https://a.example/").unwrap();

        assert_eq!(queue.row_count().unwrap(), 1);
        assert_eq!(queue.unfetched_urls().unwrap(), vec!["https://b.example/"]);
    }

    #[test]
    fn test_fetched_payloads_insertion_order() {
        let store = HarvestStore::new_in_memory().unwrap();
        let queue = seeded_queue(
            &store,
            &["https://a.example/", "https://b.example/", "https://c.example/"],
        );

        // Record out of seed order; read-back follows insertion order
        queue.record_success("https://c.example/", b"c").unwrap();
        queue.record_success("https://a.example/", b"a").unwrap();

        assert_eq!(
            queue.fetched_payloads().unwrap(),
            vec![b"a".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn test_stages_do_not_share_queues() {
        let store = HarvestStore::new_in_memory().unwrap();
        let items = FetchQueue::new(&store, Stage::Item);
        let pages = FetchQueue::new(&store, Stage::CollectionPage);

        items.seed(["https://a.example/"], false).unwrap();
        pages.seed(["https://b.example/", "https://c.example/"], false).unwrap();

        assert_eq!(items.row_count().unwrap(), 1);
        assert_eq!(pages.row_count().unwrap(), 2);
    }
}
