//! qa-harvest main entry point
//!
//! This is the command-line interface for the qa-harvest crawler.

use anyhow::Context;
use clap::Parser;
use qa_harvest::config::{load_config_with_hash, Config, CrawlMode};
use qa_harvest::crawler::{load_crawled_ids, plan_sources, run_crawl, ShutdownHandle};
use qa_harvest::output::{load_statistics, print_statistics, print_summary};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// qa-harvest: an incremental Q&A API crawler
///
/// qa-harvest collects questions, answers and owner information from the
/// Stack Exchange API, package metadata from the ROS index and wiki, and
/// topics from a Discourse forum. It skips everything already present in a
/// previously collected dataset and records the identifiers the provider did
/// not return.
#[derive(Parser, Debug)]
#[command(name = "qa-harvest")]
#[command(version)]
#[command(about = "An incremental, batched Q&A API crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show counts from the dataset and output files and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("qa_harvest=info,warn"),
            1 => EnvFilter::new("qa_harvest=debug,info"),
            2 => EnvFilter::new("qa_harvest=trace,debug"),
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
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== qa-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Mode: {:?}", config.crawler.mode);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Delay: {}ms floor, {}ms ceiling, {}ms step",
        config.crawler.minimum_delay, config.crawler.maximum_delay, config.crawler.throttle_step
    );
    println!(
        "  Retries: {} (base delay {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!("  Batch size: {}", config.crawler.batch_size);
    if let Some(max_pages) = config.crawler.max_pages {
        println!("  Max pages: {}", max_pages);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    match config.crawler.mode {
        CrawlMode::Harvest | CrawlMode::Revisit => {
            println!("\nProvider:");
            println!("  API: {}", config.provider.api_base);
            println!("  Site: {}", config.provider.site);
            if let Some(tag) = &config.provider.tagged {
                println!("  Tagged: {}", tag);
            }
            println!("  Fetch answers: {}", config.provider.fetch_answers);
        }
        CrawlMode::Index => {
            println!("\nPackage index:");
            println!("  Site: {}", config.index.base);
            println!("  Distribution: {}", config.index.distro);
        }
        CrawlMode::Wiki => {
            println!("\nWiki:");
            println!("  Site: {}", config.wiki.base);
            println!("  Versions: {}", config.wiki.versions.join(", "));
            if config.input.source_path.is_none() {
                println!(
                    "  Packages from: {} ({})",
                    config.index.base, config.index.distro
                );
            }
        }
        CrawlMode::Forum => {
            println!("\nForum:");
            println!("  Site: {}", config.forum.base);
            if config.forum.category.is_empty() {
                println!("  Category: (latest topics)");
            } else {
                println!("  Category: {}", config.forum.category);
            }
        }
    }

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    println!("  Missing identifiers: {}", config.output.missing_path);

    let crawled = load_crawled_ids(config).context("failed to load dataset")?;
    println!("\n✓ Configuration is valid");
    println!("✓ {} identifiers already collected", crawled.len());

    let reads_sources = match config.crawler.mode {
        CrawlMode::Revisit => true,
        CrawlMode::Wiki => config.input.source_path.is_some(),
        CrawlMode::Harvest | CrawlMode::Index | CrawlMode::Forum => false,
    };
    if reads_sources {
        let plan = plan_sources(config, &crawled).context("failed to read sources")?;
        println!(
            "✓ Would dispatch {} identifiers in {} batches ({} already collected, {} malformed)",
            plan.identifiers,
            plan.batches.len(),
            plan.duplicates,
            plan.malformed
        );
    }

    Ok(())
}

/// Handles the --stats mode: shows counts from the dataset and output files
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    if let Some(path) = &config.input.dataset_path {
        println!("Dataset: {}\n", path);
    }

    let stats = load_statistics(config).context("failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let shutdown = ShutdownHandle::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight requests");
            handle.request();
        }
    });

    let summary = run_crawl(config, shutdown).await.context("crawl failed")?;
    print_summary(&summary);

    Ok(())
}
