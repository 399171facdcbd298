//! loc-harvester command-line interface
//!
//! Runs the full three-stage pipeline or an individual stage. Fetch state
//! lives in SQLite, so rerunning a command after an interruption resumes
//! where the previous run stopped (pass `--fresh` to start over).

use anyhow::Context;
use clap::{Parser, Subcommand};
use loc_harvester::fetcher::{build_http_client, CancelToken, RetryPolicy};
use loc_harvester::pipeline::{
    extract_stage_urls, run_pipeline, run_stage, sitemap_urls_for, PipelineOptions,
};
use loc_harvester::seedlist::{read_url_list, write_url_list};
use loc_harvester::stage::Stage;
use loc_harvester::storage::open_store;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Library of Congress metadata harvester
///
/// Fetches collection sitemaps, collection listing pages, and item
/// metadata through a resumable, SQLite-backed fetch queue.
#[derive(Parser, Debug)]
#[command(name = "loc-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A resumable Library of Congress metadata harvester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all three stages: sitemaps, collection pages, items
    Pipeline {
        /// Root directory for stage CSV files (written under <CSV_ROOT>/csv/)
        csv_root: PathBuf,

        /// Path to the SQLite database
        db: PathBuf,

        /// Comma-separated collection names to harvest
        collections: String,

        /// Discard previous fetch state instead of resuming
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch collection sitemaps and extract collection page URLs
    Sitemap {
        /// CSV file the generated sitemap URLs are written to
        sitemap_csv: PathBuf,

        /// CSV file the extracted collection page URLs are written to
        output_csv: PathBuf,

        /// Path to the SQLite database
        db: PathBuf,

        /// Comma-separated collection names to harvest
        collections: String,

        /// Discard previous fetch state instead of resuming
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch collection pages and extract item URLs
    Collection {
        /// CSV file of collection page URLs to fetch
        input_csv: PathBuf,

        /// CSV file the extracted item URLs are written to
        output_csv: PathBuf,

        /// Path to the SQLite database
        db: PathBuf,

        /// Discard previous fetch state instead of resuming
        #[arg(long)]
        fresh: bool,
    },

    /// Fetch item metadata from a CSV of item URLs
    Item {
        /// CSV file of item URLs to fetch
        input_csv: PathBuf,

        /// Path to the SQLite database
        db: PathBuf,

        /// Discard previous fetch state instead of resuming
        #[arg(long)]
        fresh: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Ctrl-C trips the cancel token; the drain loop stops at the next row
    // boundary and the queues stay resumable.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing current request...");
                cancel.cancel();
            }
        });
    }

    match cli.command {
        Command::Pipeline {
            csv_root,
            db,
            collections,
            fresh,
        } => handle_pipeline(csv_root, db, &collections, fresh, &cancel).await,

        Command::Sitemap {
            sitemap_csv,
            output_csv,
            db,
            collections,
            fresh,
        } => handle_sitemap(sitemap_csv, output_csv, db, &collections, fresh, &cancel).await,

        Command::Collection {
            input_csv,
            output_csv,
            db,
            fresh,
        } => handle_collection(input_csv, output_csv, db, fresh, &cancel).await,

        Command::Item { input_csv, db, fresh } => {
            handle_item(input_csv, db, fresh, &cancel).await
        }
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("loc_harvester=info,warn"),
            1 => EnvFilter::new("loc_harvester=debug,info"),
            2 => EnvFilter::new("loc_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn split_collections(collections: &str) -> Vec<String> {
    collections
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Handles the full three-stage pipeline
async fn handle_pipeline(
    csv_root: PathBuf,
    db: PathBuf,
    collections: &str,
    fresh: bool,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let collections = split_collections(collections);
    tracing::info!("Collections to harvest: {:?}", collections);
    tracing::info!("Database: {}", db.display());

    let options = PipelineOptions {
        csv_root,
        db_path: db,
        collections,
        resume: !fresh,
        policy: RetryPolicy::unbounded(),
    };

    let report = run_pipeline(&options, cancel)
        .await
        .context("Pipeline run failed")?;

    if report.completed {
        println!("Harvested {} item records", report.items_harvested);
    } else {
        println!(
            "Harvest interrupted ({} item records so far); rerun to resume",
            report.items_harvested
        );
    }

    Ok(())
}

/// Handles the sitemap stage on its own
async fn handle_sitemap(
    sitemap_csv: PathBuf,
    output_csv: PathBuf,
    db: PathBuf,
    collections: &str,
    fresh: bool,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let collections = split_collections(collections);
    let urls = sitemap_urls_for(&collections).context("Invalid collection name")?;
    write_url_list(&sitemap_csv, &urls)
        .with_context(|| format!("Failed to write {}", sitemap_csv.display()))?;
    tracing::info!("{} sitemap URLs written to {}", urls.len(), sitemap_csv.display());

    let store = open_store(&db)?;
    let client = build_http_client()?;
    let outcome = run_stage(
        &store,
        Stage::Sitemap,
        &urls,
        !fresh,
        &client,
        &RetryPolicy::unbounded(),
        cancel,
    )
    .await?;

    let page_urls = extract_stage_urls(Stage::Sitemap, &outcome.payloads);
    write_url_list(&output_csv, &page_urls)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    println!(
        "{} collection page URLs written to {}",
        page_urls.len(),
        output_csv.display()
    );

    Ok(())
}

/// Handles the collection-page stage on its own
async fn handle_collection(
    input_csv: PathBuf,
    output_csv: PathBuf,
    db: PathBuf,
    fresh: bool,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let seeds = read_url_list(&input_csv)
        .with_context(|| format!("Failed to read {}", input_csv.display()))?;
    tracing::info!("{} collection page URLs read from {}", seeds.len(), input_csv.display());

    let store = open_store(&db)?;
    let client = build_http_client()?;
    let outcome = run_stage(
        &store,
        Stage::CollectionPage,
        &seeds,
        !fresh,
        &client,
        &RetryPolicy::unbounded(),
        cancel,
    )
    .await?;

    let item_urls = extract_stage_urls(Stage::CollectionPage, &outcome.payloads);
    write_url_list(&output_csv, &item_urls)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    println!("{} item URLs written to {}", item_urls.len(), output_csv.display());

    Ok(())
}

/// Handles the item stage on its own
async fn handle_item(
    input_csv: PathBuf,
    db: PathBuf,
    fresh: bool,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let seeds = read_url_list(&input_csv)
        .with_context(|| format!("Failed to read {}", input_csv.display()))?;
    tracing::info!("{} item URLs read from {}", seeds.len(), input_csv.display());

    let store = open_store(&db)?;
    let client = build_http_client()?;
    let outcome = run_stage(
        &store,
        Stage::Item,
        &seeds,
        !fresh,
        &client,
        &RetryPolicy::unbounded(),
        cancel,
    )
    .await?;

    println!("{} item records harvested", outcome.payloads.len());

    Ok(())
}
