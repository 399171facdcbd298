//! Stage pipeline orchestration
//!
//! Sequences the three harvest stages: collection sitemaps, collection
//! listing pages, item metadata pages. Each stage drains its own queue,
//! extracts the next stage's URL list from the fetched payloads, and
//! persists that list as a CSV seed file before the next stage starts.

mod runner;

pub use runner::{
    collection_sitemap_url, extract_stage_urls, run_pipeline, run_stage, sitemap_urls_for,
    PipelineOptions, PipelineReport, StageOutcome,
};
