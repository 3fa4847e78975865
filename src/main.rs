//! Sumi-Glean main entry point
//!
//! This is the command-line interface for the Sumi-Glean site harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_glean::config::{compute_config_hash, hash_content, parse_config, validate, Config};
use sumi_glean::crawler::run_crawl;
use sumi_glean::output::print_statistics;
use tracing_subscriber::EnvFilter;

/// Sumi-Glean: a polite single-site content harvester
///
/// Sumi-Glean crawls one website under a page budget, extracting page text,
/// tables and linked documents, and maps the site's internal link graph.
#[derive(Parser, Debug)]
#[command(name = "sumi-glean")]
#[command(version)]
#[command(about = "A polite single-site content harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL, overriding the configuration
    #[arg(long)]
    seed: Option<String>,

    /// Page budget, overriding the configuration
    #[arg(long)]
    max_pages: Option<u32>,

    /// Number of concurrent workers, overriding the configuration
    #[arg(long)]
    concurrency: Option<u32>,

    /// Output directory, overriding the configuration
    #[arg(short, long)]
    output: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = parse_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (config, compute_config_hash(path)?)
        }
        None => (Config::default(), hash_content("")),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;
    tracing::info!("Configuration valid (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = match run_crawl(config, &config_hash).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_statistics(&summary);
    }

    Ok(())
}

/// Command-line values take precedence over the file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.crawler.seed_url = seed.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_glean=info,warn"),
            1 => EnvFilter::new("sumi_glean=debug,info"),
            2 => EnvFilter::new("sumi_glean=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Glean Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed_url);
    println!("  Page budget: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.concurrency);
    println!(
        "  Polite delay: {}ms + up to {}ms jitter",
        config.crawler.polite_delay_ms, config.crawler.polite_jitter_ms
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Retries: {}", config.http.max_retries);

    println!("\nFilters:");
    println!("  Denied segments: {}", config.filter.denied_segments.join(", "));
    println!(
        "  Forbidden extensions: {}",
        config.filter.forbidden_extensions.join(", ")
    );
    println!(
        "  Document extensions: {}",
        config.filter.document_extensions.join(", ")
    );

    println!("\nExtraction:");
    println!("  Tables: {}", config.extract.tables);
    println!("  Documents: {}", config.extract.documents);
    match &config.extract.secondary_language {
        Some(language) => println!(
            "  Secondary language: {} (via ?{}=)",
            language, config.extract.locale_param
        ),
        None => println!("  Secondary language: disabled"),
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Results: {}", config.output.results_file);
    println!("  Site graph: {}", config.output.graph_file);
    println!("  Chunk ceiling: {} bytes", config.output.chunk_bytes);

    println!("\n✓ Configuration is valid");
}
