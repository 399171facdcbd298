//! Streaming `<loc>` extraction from sitemap-shaped XML

use crate::extract::{ExtractError, ITEM_JSON_SUFFIX, ITEM_URL_PREFIX};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Collects the text of every URL-location element in a sitemap document
///
/// Namespace prefixes are tolerated by matching on the local element name,
/// which is how these documents vary in the wild.
pub fn sitemap_locs(doc: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_reader(doc);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref().ends_with(b"loc") => in_loc = true,
            Event::End(e) if e.name().as_ref().ends_with(b"loc") => in_loc = false,
            Event::Text(t) if in_loc => {
                locs.push(t.unescape()?.into_owned());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(locs)
}

/// Sitemap-stage extractor: every `<loc>` URL, unfiltered
pub fn extract_page_urls(doc: &[u8]) -> Result<Vec<String>, ExtractError> {
    sitemap_locs(doc)
}

/// Collection-page-stage extractor: item URLs with the JSON query appended
///
/// Only `<loc>` entries starting with the exact item prefix are kept;
/// listing pages routinely contain non-item entries and an empty result is
/// not an error.
pub fn extract_item_urls(doc: &[u8]) -> Result<Vec<String>, ExtractError> {
    let items = sitemap_locs(doc)?
        .into_iter()
        .filter(|loc| loc.starts_with(ITEM_URL_PREFIX))
        .map(|loc| format!("{loc}{ITEM_JSON_SUFFIX}"))
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://www.loc.gov/item/2021667925/</loc></url>
  <url><loc>https://www.loc.gov/collections/maps/?sp=2</loc></url>
  <url><loc>http://www.loc.gov/item/2021667926/</loc></url>
</urlset>"#;

    #[test]
    fn test_sitemap_locs_collects_all() {
        let locs = sitemap_locs(COLLECTION_PAGE.as_bytes()).unwrap();
        assert_eq!(locs.len(), 3);
        assert_eq!(locs[1], "https://www.loc.gov/collections/maps/?sp=2");
    }

    #[test]
    fn test_sitemap_locs_handles_namespace_prefix() {
        let doc = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:url><sm:loc>https://www.loc.gov/collections/maps/?sp=9</sm:loc></sm:url>
</sm:urlset>"#;
        let locs = sitemap_locs(doc.as_bytes()).unwrap();
        assert_eq!(locs, vec!["https://www.loc.gov/collections/maps/?sp=9"]);
    }

    #[test]
    fn test_sitemap_locs_unescapes_entities() {
        let doc = r#"<urlset><url><loc>https://example.org/?a=1&amp;b=2</loc></url></urlset>"#;
        let locs = sitemap_locs(doc.as_bytes()).unwrap();
        assert_eq!(locs, vec!["https://example.org/?a=1&b=2"]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let doc = b"<urlset><url><loc>x</wrong></url></urlset>";
        assert!(sitemap_locs(doc).is_err());
    }

    #[test]
    fn test_item_extractor_filters_and_parameterizes() {
        let items = extract_item_urls(COLLECTION_PAGE.as_bytes()).unwrap();
        assert_eq!(
            items,
            vec![
                "http://www.loc.gov/item/2021667925/?fo=json&at=item",
                "http://www.loc.gov/item/2021667926/?fo=json&at=item",
            ]
        );
    }

    #[test]
    fn test_item_extractor_prefix_is_case_sensitive() {
        let doc = r#"<urlset><url><loc>http://www.loc.gov/ITEM/123/</loc></url></urlset>"#;
        let items = extract_item_urls(doc.as_bytes()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_no_items_found_is_not_an_error() {
        let doc = r#"<urlset><url><loc>https://www.loc.gov/collections/maps/?sp=4</loc></url></urlset>"#;
        let items = extract_item_urls(doc.as_bytes()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_page_extractor_is_unfiltered() {
        let pages = extract_page_urls(COLLECTION_PAGE.as_bytes()).unwrap();
        assert_eq!(pages.len(), 3);
    }
}
