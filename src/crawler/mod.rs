//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier of claimed, queued and completed URLs
//! - HTTP fetching with retry logic
//! - HTML parsing, content extraction and link harvesting
//! - The linked document pipeline
//! - Overall crawl coordination

mod coordinator;
mod documents;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use documents::DocumentPipeline;
pub use fetcher::{build_http_client, FetchError, FetchResult, FetchedPage, Fetcher};
pub use frontier::{ClaimedUrl, Frontier};
pub use parser::{PageExtractor, ParsedPage};

use crate::config::Config;
use crate::output::CrawlSummary;
use crate::GleanError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Resolve the site scope from the seed
/// 2. Build the HTTP client and extractor
/// 3. Run the worker pool until quiescence or budget exhaustion
/// 4. Write the result set, consolidated files and site graph
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed successfully
/// * `Err(GleanError)` - Setup or final output failed
pub async fn crawl(config: Config) -> Result<CrawlSummary, GleanError> {
    run_crawl(config, "").await
}
