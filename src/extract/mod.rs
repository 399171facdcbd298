//! URL extraction from fetched sitemap documents
//!
//! Stage-specific pure transforms: sitemap payloads yield collection page
//! URLs, collection page payloads yield item URLs. Each document is parsed
//! independently so one malformed payload never blocks extraction from the
//! rest.

mod sitemap;

pub use sitemap::{extract_item_urls, extract_page_urls, sitemap_locs};

use thiserror::Error;

/// URL prefix identifying item pages in collection sitemaps
pub const ITEM_URL_PREFIX: &str = "http://www.loc.gov/item/";

/// Query string selecting the JSON item representation
pub const ITEM_JSON_SUFFIX: &str = "?fo=json&at=item";

/// Errors that can occur while extracting URLs from a document
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Runs an extractor over every payload, isolating per-document failures
///
/// Returns the URLs from every document that parsed, together with the
/// errors from the ones that did not. Callers log the errors; a bad
/// document is skipped, not fatal.
pub fn extract_all<F>(payloads: &[Vec<u8>], extractor: F) -> (Vec<String>, Vec<ExtractError>)
where
    F: Fn(&[u8]) -> Result<Vec<String>, ExtractError>,
{
    let mut urls = Vec::new();
    let mut errors = Vec::new();

    for payload in payloads {
        match extractor(payload) {
            Ok(found) => urls.extend(found),
            Err(e) => errors.push(e),
        }
    }

    (urls, errors)
}
