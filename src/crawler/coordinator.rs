//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives the crawl:
//! - Seeding the frontier
//! - Running `concurrency` workers that claim, fetch and extract pages
//! - Feeding discovered links back into the frontier
//! - Recording the site graph, page records and documents
//! - Writing the final outputs

use crate::config::Config;
use crate::crawler::documents::DocumentPipeline;
use crate::crawler::fetcher::{FetchResult, FetchedPage, Fetcher, PoliteDelay};
use crate::crawler::frontier::{ClaimedUrl, Frontier};
use crate::crawler::parser::PageExtractor;
use crate::output::{
    generate_markdown_summary, Aggregator, CrawlReport, CrawlSummary, OutputLayout, PageRecord,
};
use crate::state::SiteGraph;
use crate::url::{CanonicalUrl, SiteScope};
use crate::{ConfigError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// State shared by every worker
struct CrawlContext {
    config: Config,
    scope: SiteScope,
    frontier: Frontier,
    fetcher: Fetcher,
    extractor: PageExtractor,
    graph: SiteGraph,
    aggregator: Arc<Aggregator>,
    documents: Option<DocumentPipeline>,
    report: Arc<CrawlReport>,
    delay: PoliteDelay,
    completed: AtomicU64,
    started: Instant,
}

/// Marks a claimed URL done when dropped, so a panicking worker cannot
/// leave the frontier waiting on it forever
struct CompletionGuard<'a> {
    frontier: &'a Frontier,
    url: &'a CanonicalUrl,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.frontier.complete(self.url);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    seed: CanonicalUrl,
    scope: SiteScope,
    layout: OutputLayout,
}

impl Coordinator {
    /// Creates a new coordinator from a validated configuration
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let seed_url = Url::parse(&config.crawler.seed_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.crawler.seed_url, e)))?;
        let scope = SiteScope::new(&seed_url, &config.filter);
        let seed = scope.seed(&seed_url);
        let layout = OutputLayout::from_config(&config.output);

        Ok(Self {
            config,
            config_hash: config_hash.into(),
            seed,
            scope,
            layout,
        })
    }

    pub fn seed(&self) -> &CanonicalUrl {
        &self.seed
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Runs the crawl to completion and writes every output
    ///
    /// The crawl ends at quiescence (nothing queued, nothing in flight) or
    /// when the page budget is spent.
    pub async fn run(self) -> Result<CrawlSummary> {
        self.layout.create_dirs()?;

        let fetcher = Fetcher::new(&self.config.http)?;
        let extractor = PageExtractor::from_config(&self.config.extract)?;
        let report = Arc::new(CrawlReport::new(self.seed.to_string(), self.config_hash));
        let chunk_bytes = usize::try_from(self.config.output.chunk_bytes).unwrap_or(usize::MAX);
        let aggregator = Arc::new(Aggregator::new(&self.layout, chunk_bytes));
        let delay = PoliteDelay::from_config(&self.config.crawler);

        let documents = self.config.extract.documents.then(|| {
            DocumentPipeline::start(
                fetcher.clone(),
                Arc::clone(&aggregator),
                Arc::clone(&report),
                self.layout.documents_dir.clone(),
                self.config.extract.document_concurrency as usize,
                delay,
            )
        });

        let frontier = Frontier::new(u64::from(self.config.crawler.max_pages));
        frontier.enqueue(std::iter::once(self.seed.clone()));

        let context = Arc::new(CrawlContext {
            frontier,
            fetcher,
            extractor,
            graph: SiteGraph::new(),
            aggregator: Arc::clone(&aggregator),
            documents,
            report: Arc::clone(&report),
            delay,
            completed: AtomicU64::new(0),
            started: Instant::now(),
            scope: self.scope,
            config: self.config,
        });

        tracing::info!(
            "Starting crawl of {} with {} workers, budget {} pages",
            self.seed,
            context.config.crawler.concurrency,
            context.config.crawler.max_pages
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..context.config.crawler.concurrency {
            workers.spawn(run_worker(Arc::clone(&context), worker_id));
        }
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        if let Some(documents) = &context.documents {
            tracing::info!("Waiting for {} documents", documents.submitted());
            documents.shutdown().await;
        }

        let totals = aggregator.finish()?;
        context.graph.write_csv(&self.layout.graph_file)?;
        report.mark_finished();

        let summary = report.summary(
            context.graph.edge_count() as u64,
            totals.text_chunks.len() as u64,
            totals.table_chunks.len() as u64,
        );

        if let Some(path) = &self.layout.summary_file {
            generate_markdown_summary(&summary, path)?;
            tracing::info!("Summary written to {}", path.display());
        }

        tracing::info!(
            "Crawl completed: {} pages claimed, {} recorded in {:?}",
            summary.pages_claimed,
            summary.pages_recorded,
            context.started.elapsed()
        );

        Ok(summary)
    }
}

async fn run_worker(context: Arc<CrawlContext>, worker_id: u32) {
    tracing::debug!("Worker {} started", worker_id);

    while let Some(claim) = context.frontier.next().await {
        {
            let _guard = CompletionGuard {
                frontier: &context.frontier,
                url: &claim.url,
            };
            CrawlReport::bump(&context.report.pages_claimed);
            context.process(&claim).await;
        }

        let completed = context.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if completed % 10 == 0 {
            let rate = completed as f64 / context.started.elapsed().as_secs_f64();
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                completed,
                context.frontier.queue_len(),
                rate
            );
        }
    }

    tracing::debug!("Worker {} finished", worker_id);
}

impl CrawlContext {
    /// Processes a single claimed URL
    ///
    /// This method:
    /// 1. Waits the polite delay
    /// 2. Fetches the page
    /// 3. Parses HTML and extracts content and links
    /// 4. Records graph edges and enqueues discovered links
    /// 5. Submits linked documents
    /// 6. Records the page if it has content
    async fn process(&self, claim: &ClaimedUrl) {
        self.delay.wait().await;

        let page = match self.fetcher.fetch_page(claim.url.as_url()).await {
            FetchResult::Html(page) => page,
            FetchResult::Unsupported { content_type } => {
                tracing::debug!("Skipping {}: unsupported content type '{}'", claim.url, content_type);
                CrawlReport::bump(&self.report.pages_skipped);
                return;
            }
            FetchResult::Unreachable { error } => {
                tracing::debug!("Skipping {}: {}", claim.url, error);
                CrawlReport::bump(&self.report.pages_skipped);
                return;
            }
        };

        if !self.scope.is_same_origin(&page.final_url) {
            tracing::debug!("Skipping {}: redirected off-site to {}", claim.url, page.final_url);
            CrawlReport::bump(&self.report.pages_skipped);
            return;
        }

        let parsed = match self
            .extractor
            .parse_at(&page.body, &claim.url, &page.final_url, &self.scope)
        {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse HTML for {}: {}", claim.url, e);
                CrawlReport::bump(&self.report.pages_skipped);
                return;
            }
        };

        self.graph.record_all(&claim.url, &parsed.links);
        let queued = self.frontier.enqueue(parsed.links.iter().cloned());

        if let Some(documents) = &self.documents {
            for document in &parsed.documents {
                documents.submit(claim.page_id, document.clone());
            }
        }

        if parsed.content.is_empty() {
            tracing::debug!("No content on {}, not recorded", claim.url);
            CrawlReport::bump(&self.report.pages_without_content);
            return;
        }

        let secondary = self.secondary_content(&claim.url).await;
        let table_count = parsed.tables.len() as u64;

        let record = PageRecord {
            url: claim.url.clone(),
            title: parsed.title,
            content: parsed.content,
            content_secondary_language: secondary,
            links: parsed.links,
            tables: parsed.tables,
            documents: parsed.documents,
        };

        if let Err(e) = self.aggregator.record(claim.page_id, record) {
            tracing::error!("Failed to write output for {}: {}", claim.url, e);
            return;
        }

        CrawlReport::bump(&self.report.pages_recorded);
        self.report
            .tables_extracted
            .fetch_add(table_count, Ordering::Relaxed);

        tracing::info!(
            "Crawled {} [{}] ({} new links queued)",
            claim.url,
            page.status_code,
            queued
        );
    }

    /// Best-effort content of the secondary-language variant
    async fn secondary_content(&self, url: &CanonicalUrl) -> String {
        let Some(language) = &self.config.extract.secondary_language else {
            return String::new();
        };

        let variant = url.with_query_pair(&self.config.extract.locale_param, language);
        self.delay.wait().await;
        match self.fetcher.fetch_page(&variant).await {
            FetchResult::Html(FetchedPage { body, .. }) => self.extractor.content_only(&body),
            other => {
                tracing::debug!("No {} variant of {}: {:?}", language, url, other);
                String::new()
            }
        }
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use sumi_glean::config::load_config;
/// use sumi_glean::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("glean.toml"))?;
/// let summary = run_crawl(config, "").await?;
/// println!("{} pages recorded", summary.pages_recorded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlSummary> {
    Coordinator::new(config, config_hash)?.run().await
}
