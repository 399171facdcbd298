//! Pipeline stage definitions
//!
//! Each stage owns an independent fetch queue table in the shared database.
//! Table names are fixed here rather than supplied by callers, so SQL is
//! only ever assembled from statically known identifiers.

use std::fmt;

/// One phase of the harvest pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Collection sitemap documents (`.../collections/<name>/sitemap.xml`)
    Sitemap,

    /// Collection listing pages extracted from the sitemaps
    CollectionPage,

    /// Item metadata pages extracted from the listing pages
    Item,
}

impl Stage {
    /// All stages, in pipeline order
    pub const ALL: [Stage; 3] = [Stage::Sitemap, Stage::CollectionPage, Stage::Item];

    /// The fixed queue table name for this stage
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap_queue",
            Self::CollectionPage => "collection_queue",
            Self::Item => "item_queue",
        }
    }

    /// Default seed/output CSV file name used in pipeline mode
    pub fn csv_file_name(&self) -> &'static str {
        match self {
            Self::Sitemap => "lc-sitemaps.csv",
            Self::CollectionPage => "lc-pages.csv",
            Self::Item => "lc-items.csv",
        }
    }

    /// The stage whose seed list this stage's extraction produces
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Sitemap => Some(Self::CollectionPage),
            Self::CollectionPage => Some(Self::Item),
            Self::Item => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sitemap => "sitemap",
            Self::CollectionPage => "collection-page",
            Self::Item => "item",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_distinct() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.table_name()).collect();
        for (i, name) in names.iter().enumerate() {
            for other in &names[i + 1..] {
                assert_ne!(name, other);
            }
        }
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Sitemap.next(), Some(Stage::CollectionPage));
        assert_eq!(Stage::CollectionPage.next(), Some(Stage::Item));
        assert_eq!(Stage::Item.next(), None);
    }
}
