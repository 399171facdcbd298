//! Pipeline and stage runners

use crate::extract::{extract_all, extract_item_urls, extract_page_urls, ExtractError};
use crate::fetcher::{build_http_client, drain, CancelToken, DrainOutcome, RetryPolicy};
use crate::seedlist::write_url_list;
use crate::stage::Stage;
use crate::storage::{open_store, FetchQueue, HarvestStore, RequestLog};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::path::PathBuf;
use url::Url;

/// Builds the sitemap URL for a named collection
///
/// Collection names are restricted to the slug characters LC uses, so the
/// substituted URL is always well formed.
pub fn collection_sitemap_url(collection: &str) -> Result<String> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(HarvestError::InvalidCollection(collection.to_string()));
    }

    let url = format!("https://www.loc.gov/collections/{collection}/sitemap.xml");
    Url::parse(&url).map_err(|source| HarvestError::InvalidUrl {
        url: url.clone(),
        source,
    })?;
    Ok(url)
}

/// Generates the synthetic sitemap-stage seed list, one URL per collection
pub fn sitemap_urls_for(collections: &[String]) -> Result<Vec<String>> {
    collections
        .iter()
        .map(|name| collection_sitemap_url(name))
        .collect()
}

/// Result of running one stage
#[derive(Debug)]
pub struct StageOutcome {
    /// How the drain loop ended
    pub drain: DrainOutcome,

    /// Every fetched payload in the stage's queue, in insertion order
    pub payloads: Vec<Vec<u8>>,
}

/// Seeds and drains one stage's queue, returning its fetched payloads
///
/// With `resume = true` an existing queue table is left untouched, so a
/// previously interrupted run picks up exactly where it stopped.
pub async fn run_stage(
    store: &HarvestStore,
    stage: Stage,
    seed_urls: &[String],
    resume: bool,
    client: &Client,
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<StageOutcome> {
    let queue = FetchQueue::new(store, stage);
    queue.seed(seed_urls, resume)?;

    let total = queue.row_count()?;
    let pending = queue.unfetched_urls()?.len();
    tracing::info!(
        "Stage `{}`: {} total URLs, {} remaining to be fetched",
        stage,
        total,
        pending
    );

    let log = RequestLog::new(store);
    let drain_outcome = drain(&queue, &log, client, policy, cancel).await?;
    let payloads = queue.fetched_payloads()?;

    tracing::info!("Stage `{}`: {} payloads fetched", stage, payloads.len());

    Ok(StageOutcome {
        drain: drain_outcome,
        payloads,
    })
}

/// Runs a stage's extractor over its payloads, isolating bad documents
///
/// Parse failures are logged per document and skipped; the URLs from every
/// document that parsed are still returned. The item stage produces no
/// onward URLs.
pub fn extract_stage_urls(stage: Stage, payloads: &[Vec<u8>]) -> Vec<String> {
    let extractor: fn(&[u8]) -> std::result::Result<Vec<String>, ExtractError> = match stage {
        Stage::Sitemap => extract_page_urls,
        Stage::CollectionPage => extract_item_urls,
        Stage::Item => return Vec::new(),
    };

    let (urls, errors) = extract_all(payloads, extractor);
    for error in &errors {
        tracing::warn!("Skipping document from `{}` stage: {}", stage, error);
    }
    if !errors.is_empty() {
        tracing::warn!(
            "{} of {} `{}` documents could not be parsed",
            errors.len(),
            payloads.len(),
            stage
        );
    }

    urls
}

/// Options for a full pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Root directory for stage CSV files (written under `<root>/csv/`)
    pub csv_root: PathBuf,

    /// SQLite database path shared by all stage queues
    pub db_path: PathBuf,

    /// Collection names to harvest
    pub collections: Vec<String>,

    /// Resume from previous state (false drops and reseeds every queue)
    pub resume: bool,

    /// Retry policy applied to every stage's drain loop
    pub policy: RetryPolicy,
}

/// Summary of a pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// Whether all three stages drained to completion
    pub completed: bool,

    /// Number of item metadata records held in the item queue at exit
    pub items_harvested: usize,
}

/// Runs the full three-stage pipeline
///
/// The sitemap stage is seeded synthetically from the collection names;
/// each later stage is seeded from the URLs extracted out of the previous
/// stage's payloads. If a stage is cancelled or hits its pass limit the
/// pipeline stops there, leaving every queue in a resumable state.
pub async fn run_pipeline(options: &PipelineOptions, cancel: &CancelToken) -> Result<PipelineReport> {
    let csv_dir = options.csv_root.join("csv");
    std::fs::create_dir_all(&csv_dir)?;

    let store = open_store(&options.db_path)?;
    let client = build_http_client()?;

    // Sitemap stage: seeded from the collection names, no input file
    let sitemap_urls = sitemap_urls_for(&options.collections)?;
    let sitemap_csv = csv_dir.join(Stage::Sitemap.csv_file_name());
    write_url_list(&sitemap_csv, &sitemap_urls)?;
    tracing::info!(
        "{} collection sitemap URLs written to {}",
        sitemap_urls.len(),
        sitemap_csv.display()
    );

    let sitemap_outcome = run_stage(
        &store,
        Stage::Sitemap,
        &sitemap_urls,
        options.resume,
        &client,
        &options.policy,
        cancel,
    )
    .await?;
    if sitemap_outcome.drain != DrainOutcome::Complete {
        return interrupted_report(&store, Stage::Sitemap, &sitemap_outcome.drain);
    }

    // Collection-page stage: seeded from the sitemap payloads
    let page_urls = extract_stage_urls(Stage::Sitemap, &sitemap_outcome.payloads);
    let pages_csv = csv_dir.join(Stage::CollectionPage.csv_file_name());
    write_url_list(&pages_csv, &page_urls)?;
    tracing::info!(
        "{} collection page URLs written to {}",
        page_urls.len(),
        pages_csv.display()
    );

    let page_outcome = run_stage(
        &store,
        Stage::CollectionPage,
        &page_urls,
        options.resume,
        &client,
        &options.policy,
        cancel,
    )
    .await?;
    if page_outcome.drain != DrainOutcome::Complete {
        return interrupted_report(&store, Stage::CollectionPage, &page_outcome.drain);
    }

    // Item stage: seeded from the item URLs on the collection pages
    let item_urls = extract_stage_urls(Stage::CollectionPage, &page_outcome.payloads);
    let items_csv = csv_dir.join(Stage::Item.csv_file_name());
    write_url_list(&items_csv, &item_urls)?;
    tracing::info!(
        "{} item URLs written to {}",
        item_urls.len(),
        items_csv.display()
    );

    let item_outcome = run_stage(
        &store,
        Stage::Item,
        &item_urls,
        options.resume,
        &client,
        &options.policy,
        cancel,
    )
    .await?;
    if item_outcome.drain != DrainOutcome::Complete {
        return interrupted_report(&store, Stage::Item, &item_outcome.drain);
    }

    let items_harvested = item_outcome.payloads.len();
    tracing::info!("Harvested {} item records", items_harvested);

    Ok(PipelineReport {
        completed: true,
        items_harvested,
    })
}

/// Builds the report for a run that stopped before the final stage drained
fn interrupted_report(
    store: &HarvestStore,
    stage: Stage,
    drain: &DrainOutcome,
) -> Result<PipelineReport> {
    tracing::warn!(
        "Pipeline stopped at `{}` stage ({:?}); rerun with resume to continue",
        stage,
        drain
    );
    let items_harvested = FetchQueue::new(store, Stage::Item)
        .fetched_payloads()
        .map(|p| p.len())
        .unwrap_or(0);
    Ok(PipelineReport {
        completed: false,
        items_harvested,
    })
}
