//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest listing crawler.

use anyhow::{bail, Context};
use catalog_harvest::catalog::CatalogQuery;
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::run_crawl;
use catalog_harvest::output::{
    compute_statistics, generate_markdown_summary, load_checkpoint, print_statistics,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a resumable listing catalog crawler
///
/// Catalog-Harvest walks the paginated listing of a content site, enriches
/// every item from its detail page, and checkpoints the catalog after each
/// listing page so an interrupted crawl can resume where it stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable listing catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Resume from the checkpoint (default behavior)
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Start a fresh crawl at page 1, ignoring the checkpoint
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary"])]
    dry_run: bool,

    /// Show statistics of the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary"])]
    stats: bool,

    /// Generate markdown summary of the checkpoint and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_summary: bool,

    /// Restrict --stats and --export-summary to titles containing this term
    #[arg(long, value_name = "TERM")]
    search: Option<String>,

    /// Restrict --stats and --export-summary to this category (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,
}

impl Cli {
    fn query(&self) -> CatalogQuery {
        CatalogQuery::new(self.search.as_deref().unwrap_or(""), self.categories.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config, &cli.query())?;
    } else if cli.export_summary {
        handle_export_summary(&config, &cli.query())?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing root: {}", config.site.listing_root());
    println!("  Listing pages: {}", config.site.listing_page_pattern());
    println!("  Downloads: {}", config.site.download_pattern());
    println!("  Detail segment: /{}/", config.site.detail_segment);

    println!("\nCrawler Configuration:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Batch delay: {}ms", config.crawler.batch_delay_ms);
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout_ms
    );
    println!(
        "  Content wait timeout: {}ms",
        config.crawler.content_wait_timeout_ms
    );
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    println!(
        "  Max consecutive failures: {}",
        config.crawler.max_consecutive_failures
    );
    println!("  Pagination strategy: {:?}", config.pagination.strategy);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Catalog: {}", config.output.catalog_path);
    println!("  Progress: {}", config.output.progress_path);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nFirst listing pages:");
    let preview = config.crawler.max_pages.unwrap_or(3).min(3);
    for page in 1..=preview {
        println!("  - {}", config.site.listing_page_url(page));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the checkpoint
fn handle_stats(config: &Config, query: &CatalogQuery) -> anyhow::Result<()> {
    println!("Checkpoint: {}", config.output.catalog_path);
    if !query.is_empty() {
        println!("Filter: {}", query);
    }
    println!();

    let catalog = load_checkpoint(&config.output)?;
    let stats = compute_statistics(&catalog, query);
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config, query: &CatalogQuery) -> anyhow::Result<()> {
    println!("=== Exporting Catalog Summary ===\n");
    println!("Checkpoint: {}", config.output.catalog_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    tracing::info!("Loading catalog checkpoint...");
    let catalog = load_checkpoint(&config.output)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&catalog, query, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh crawl (ignoring checkpoint)");
    } else {
        tracing::info!("Starting crawl (will resume from checkpoint if one exists)");
    }
    tracing::info!("Listing root: {}", config.site.listing_root());

    let catalog_path = config.output.catalog_path.clone();
    let report = run_crawl(config, fresh).await?;

    tracing::info!(
        "Catalog at {}: {} pages, {} items",
        catalog_path,
        report.catalog.len(),
        report.catalog.item_count()
    );

    match report.error {
        None => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Some(e) if report.completed => bail!("Crawl completed but the final checkpoint failed: {}", e),
        Some(e) => bail!("Crawl aborted: {}", e),
    }
}
