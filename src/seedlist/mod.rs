//! Seed list I/O
//!
//! Stage seed lists and extractor outputs share one on-disk shape: a
//! headerless CSV with a single URL per row.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur reading or writing a seed list
#[derive(Debug, Error)]
pub enum SeedListError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes one URL per row to `path`, replacing any existing file
pub fn write_url_list<S: AsRef<str>>(path: &Path, urls: &[S]) -> Result<(), SeedListError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    for url in urls {
        writer.write_record([url.as_ref()])?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a seed list, preserving row order
pub fn read_url_list(path: &Path) -> Result<Vec<String>, SeedListError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.get(0) {
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        let urls = vec![
            "https://www.loc.gov/collections/maps/?sp=3".to_string(),
            "http://www.loc.gov/item/2021667925/?fo=json&at=item".to_string(),
            "https://www.loc.gov/collections/maps/?sp=1".to_string(),
        ];

        write_url_list(&path, &urls).unwrap();
        let read_back = read_url_list(&path).unwrap();

        assert_eq!(read_back, urls);
    }

    #[test]
    fn test_empty_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_url_list::<String>(&path, &[]).unwrap();
        assert!(read_url_list(&path).unwrap().is_empty());
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");

        write_url_list(&path, &["https://a.example/", "https://b.example/"]).unwrap();
        write_url_list(&path, &["https://c.example/"]).unwrap();

        assert_eq!(read_url_list(&path).unwrap(), vec!["https://c.example/"]);
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_url_list(&dir.path().join("missing.csv"));
        assert!(result.is_err());
    }
}
