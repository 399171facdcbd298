//! Database schema definitions
//!
//! Queue tables are created per stage from the fixed identifiers in
//! [`Stage`]; the request log is shared by all stages.

use crate::stage::Stage;
use rusqlite::Connection;

/// SQL for the shared request timing log
pub const REQUEST_LOG_SQL: &str = "
CREATE TABLE IF NOT EXISTS request_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    total_time INTEGER NOT NULL
);
";

/// Initializes the shared tables (currently just the request log)
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(REQUEST_LOG_SQL)?;
    Ok(())
}

/// Checks whether the queue table for a stage already exists
///
/// Existence of the table is what makes a `resume` seed a no-op.
pub fn queue_table_exists(conn: &Connection, stage: Stage) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [stage.table_name()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Drops and recreates the queue table for a stage
///
/// A NULL payload means "not yet successfully fetched". The URL is the
/// unique key within a stage's queue.
pub fn recreate_queue_table(conn: &Connection, stage: Stage) -> Result<(), rusqlite::Error> {
    let table = stage.table_name();
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             url TEXT PRIMARY KEY,
             payload BLOB
         );"
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_queue_table_lifecycle() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!queue_table_exists(&conn, Stage::Sitemap).unwrap());

        recreate_queue_table(&conn, Stage::Sitemap).unwrap();
        assert!(queue_table_exists(&conn, Stage::Sitemap).unwrap());

        // Other stages remain independent
        assert!(!queue_table_exists(&conn, Stage::Item).unwrap());
    }

    #[test]
    fn test_recreate_discards_rows() {
        let conn = Connection::open_in_memory().unwrap();
        recreate_queue_table(&conn, Stage::Item).unwrap();
        conn.execute(
            "INSERT INTO item_queue (url, payload) VALUES ('https://example.org/a', NULL)",
            [],
        )
        .unwrap();

        recreate_queue_table(&conn, Stage::Item).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM item_queue", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
